use std::borrow::Cow;
use std::path::Path;

use crate::config::ParseConfig;
use crate::ir::Diagnostic;
use crate::patterns;
use crate::rerun::{self, Confirm, StaleAuxAdvisory};
use crate::resolver::{FileOracle, Resolver};
use crate::state::ParseState;

/// Everything a parse hands back to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub diagnostics: Vec<Diagnostic>,
    /// Raised when the transcript shows a truncated auxiliary file.
    pub stale_aux: Option<StaleAuxAdvisory>,
    /// Whether the host's [`Confirm`] accepted the advisory.
    pub cleanup_confirmed: bool,
}

/// Extracts diagnostics from a TeX transcript.
///
/// The parser alternates between two activities until the transcript is
/// consumed:
///
/// - trying the pattern table at the head of the unread text, restarting from
///   the first pattern after every match, and
/// - stepping the file stack over text no pattern recognises.
///
/// Restarting the table after each match and re-scanning the line for every
/// `(` makes the worst case super-linear in the transcript length. Real logs
/// are short enough that this is not a concern.
#[derive(Debug, Clone, Default)]
pub struct LogParser {
    config: ParseConfig,
    root: Option<String>,
    base_dir: String,
}

impl LogParser {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            config,
            root: None,
            base_dir: String::new(),
        }
    }

    /// Sets the document's root file.
    ///
    /// The root is the file diagnostics are attributed to before any `(` is
    /// seen, and its directory is the base for `./`-relative names.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.base_dir = match root.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR)
            }
            _ => String::new(),
        };
        self.root = Some(root.to_string_lossy().into_owned());
        self
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Fresh state over `text`, positioned at its start with the root file open.
    ///
    /// `text` must use `\n` line endings; pass raw transcripts through
    /// [`normalize_line_endings`] first, or a `\r` shifts every wrap check.
    pub fn state<'t>(&self, text: &'t str) -> ParseState<'t> {
        ParseState::new(text, self.root.clone())
    }

    /// Parses a complete transcript.
    ///
    /// Diagnostics below the configured minimum severity are dropped and the
    /// rest are ordered by the configured [`SortBy`](crate::ir::SortBy).
    pub fn parse(&self, transcript: &str, oracle: &dyn FileOracle) -> Vec<Diagnostic> {
        let text = normalize_line_endings(transcript);
        let mut state = self.state(&text);
        let mut diagnostics = self.run(&mut state, oracle);
        self.config.sort_by.apply(&mut diagnostics);
        diagnostics
    }

    /// Like [`parse`](Self::parse), then checks for a truncated auxiliary file
    /// and asks `confirm`, if given, whether to clean up.
    pub fn parse_with_advisory(
        &self,
        transcript: &str,
        oracle: &dyn FileOracle,
        confirm: Option<&dyn Confirm>,
    ) -> ParseOutcome {
        let text = normalize_line_endings(transcript);
        let mut state = self.state(&text);
        let mut diagnostics = self.run(&mut state, oracle);
        self.config.sort_by.apply(&mut diagnostics);

        let stale_aux = rerun::find_stale_aux(&diagnostics);
        let cleanup_confirmed = match (&stale_aux, confirm) {
            (Some(advisory), Some(confirm)) => {
                log::info!("Stale auxiliary file suspected: {:?}", advisory.file);
                confirm.confirm(&advisory.message)
            }
            _ => false,
        };

        ParseOutcome {
            diagnostics,
            stale_aux,
            cleanup_confirmed,
        }
    }

    /// Drives `state` to the end of its text.
    ///
    /// Returns the diagnostics at or above the minimum severity in the order
    /// they were found. A rerun marker discards everything found before it.
    /// Like [`state`](Self::state), this expects `\n`-only text.
    pub fn run(&self, state: &mut ParseState<'_>, oracle: &dyn FileOracle) -> Vec<Diagnostic> {
        let wrap_width = self.config.wrap_width.max(1);
        let resolver = Resolver::new(oracle, &self.base_dir, wrap_width);
        let mut diagnostics = Vec::new();

        while !state.is_done() {
            self.scan_patterns(state, wrap_width, &mut diagnostics);
            if state.is_done() {
                break;
            }
            state.step(&resolver);
        }
        diagnostics
    }

    fn scan_patterns(
        &self,
        state: &mut ParseState<'_>,
        wrap_width: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        loop {
            state.skip_whitespace();
            if rerun::starts_new_pass(state.remaining()) && !diagnostics.is_empty() {
                log::debug!(
                    "New compiler pass, dropping {} earlier diagnostics",
                    diagnostics.len()
                );
                diagnostics.clear();
            }

            let Some((kind, found)) =
                patterns::first_match(state.remaining(), state.current_file(), wrap_width)
            else {
                return;
            };
            log::trace!("{:?} matched {} bytes", kind, found.len);
            if found.diagnostic.severity >= self.config.min_severity {
                diagnostics.push(found.diagnostic);
            }
            state.advance(found.len);
        }
    }
}

/// Rewrites `\r\n` as `\n`, borrowing when there is nothing to rewrite.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Severity, SortBy};
    use crate::resolver::FileStatus;

    fn indeterminate(_: &str) -> FileStatus {
        FileStatus::Indeterminate
    }

    #[test]
    fn test_with_root_base_dir() {
        let parser = LogParser::default().with_root("thesis/main.tex");
        assert_eq!(parser.root(), Some("thesis/main.tex"));
        assert_eq!(
            parser.base_dir,
            format!("thesis{}", std::path::MAIN_SEPARATOR)
        );

        let parser = LogParser::default().with_root("main.tex");
        assert_eq!(parser.base_dir, "");
    }

    #[test]
    fn test_crlf_transcript() {
        let log = "Package foo Warning: a\r\n(foo) b\r\n";
        let diagnostics = LogParser::default().parse(log, &indeterminate);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].description, "Package foo Warning: a b");
    }

    #[test]
    fn test_balanced_files_return_to_root() {
        let parser = LogParser::default().with_root("main.tex");
        let text = "(./main.tex (./a.tex) (/usr/share/b.sty\nPackage b Warning: x\n) (see) )";
        let mut state = parser.state(text);
        let diagnostics = parser.run(&mut state, &indeterminate);

        assert_eq!(state.current_file(), Some("main.tex"));
        assert!(state.file_stack().is_empty());
        assert_eq!(state.stray_paren_depth(), 0);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].file.as_deref(), Some("/usr/share/b.sty"));
    }

    #[test]
    fn test_sort_applies_after_filter() {
        let log = "Overfull \\hbox (1.0pt too wide) in paragraph at lines 1--1\n[]x\n\nWarning: w.\n! boom\n";
        let config = ParseConfig {
            min_severity: Severity::Warning,
            sort_by: SortBy::Severity,
            ..ParseConfig::default()
        };
        let diagnostics = LogParser::new(config).parse(log, &indeterminate);
        let severities: Vec<_> = diagnostics.iter().map(|d| d.severity).collect();
        assert_eq!(severities, vec![Severity::Error, Severity::Warning]);
    }

    #[test]
    fn test_advisory_asks_host() {
        let log = "(./main.aux\n! File ended while scanning use of \\@writefile.\n<inserted text> \n\\par \nl.12 \\begin{document}\n)";
        let asked = std::cell::Cell::new(false);
        let confirm = |_: &str| {
            asked.set(true);
            true
        };
        let outcome = LogParser::default().parse_with_advisory(log, &indeterminate, Some(&confirm));
        assert!(asked.get());
        assert!(outcome.cleanup_confirmed);
        let advisory = outcome.stale_aux.unwrap();
        assert_eq!(advisory.file.as_deref(), Some("./main.aux"));
        assert_eq!(outcome.diagnostics[advisory.index].row, 12);
    }

    #[test]
    fn test_advisory_without_confirm() {
        let log = "! File ended while scanning use of \\@newl@bel.\n";
        let outcome = LogParser::default().parse_with_advisory(log, &indeterminate, None);
        assert!(outcome.stale_aux.is_some());
        assert!(!outcome.cleanup_confirmed);

        let outcome = LogParser::default().parse_with_advisory("! Other.\n", &indeterminate, None);
        assert!(outcome.stale_aux.is_none());
    }
}

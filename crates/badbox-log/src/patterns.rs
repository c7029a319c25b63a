//! The ordered table of diagnostic recognisers.
//!
//! Every recogniser looks only at the head of the unread transcript. The
//! first [`PatternKind`] in [`PatternKind::TABLE`] that both matches and
//! yields a [`Diagnostic`] wins; a recogniser that matches textually but
//! cannot build a diagnostic declines and lets the next one try.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{Diagnostic, Severity};

/// `! <message>` block closed by an `l.<N>` line, capturing the line after it.
static CONTEXT_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^! ?([^\n]*\n(?:(?:[^!\n][^\n]*)?\n)*?)(l\.(\d+)[^\n]*)\n([^\n]*)(?:\n|\z)")
        .unwrap()
});

static LINE_REF_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^! ?([^\n]*\n(?:(?:[^!\n][^\n]*)?\n)*?)(l\.(\d+)[^\n]*)").unwrap()
});

static CRITICAL_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^! ?([^\n]*)").unwrap());

static PACKAGE_WARNING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Class|Package|Module|LaTeX) (\S+) Warning: [^\n]*").unwrap()
});

static PARAGRAPH_WARNING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^((?:LaTeX |pdfTeX |LuaTeX |XeTeX )?Warning: .*?\.)(?:\n|\z)").unwrap()
});

static BAD_BOX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:Over|Under)full \\[hv]box \([^)\n]*\) (?:in (?:paragraph|alignment) at lines (\d+)--\d+|detected at line (\d+)|(has occurred while \\output is active))[^\n]*",
    )
    .unwrap()
});

static INPUT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"on input line (\d+)\.").unwrap());

/// A successful extraction: the diagnostic and how many bytes of the head it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub diagnostic: Diagnostic,
    pub len: usize,
}

/// One category of transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// `! ...` / `l.<N> ...` followed by an indented continuation of the source line.
    ContextError,
    /// `! ...` closed by an `l.<N>` reference.
    LineRefError,
    /// `! ...` without a line reference, e.g. `! Emergency stop.`
    CriticalError,
    /// `Package <name> Warning:` with `(<name>)` continuation lines.
    PackageWarning,
    /// `Warning: ...` running until a sentence ends at a line break.
    ParagraphWarning,
    /// Over- or underfull `\hbox`/`\vbox` notice and its wrapped box listing.
    BadBox,
}

impl PatternKind {
    /// Priority order. Earlier entries are tried first.
    pub const TABLE: [PatternKind; 6] = [
        PatternKind::ContextError,
        PatternKind::LineRefError,
        PatternKind::CriticalError,
        PatternKind::PackageWarning,
        PatternKind::ParagraphWarning,
        PatternKind::BadBox,
    ];

    /// Tries this recogniser against `head`, attributing any result to `file`.
    pub fn extract(
        self,
        head: &str,
        file: Option<&str>,
        wrap_width: usize,
    ) -> Option<PatternMatch> {
        let file = file.map(str::to_owned);
        match self {
            PatternKind::ContextError => context_error(head, file),
            PatternKind::LineRefError => line_ref_error(head, file),
            PatternKind::CriticalError => critical_error(head, file),
            PatternKind::PackageWarning => package_warning(head, file),
            PatternKind::ParagraphWarning => paragraph_warning(head, file),
            PatternKind::BadBox => bad_box(head, file, wrap_width),
        }
    }
}

/// Runs the whole table against `head` and returns the first diagnostic produced.
pub fn first_match(
    head: &str,
    file: Option<&str>,
    wrap_width: usize,
) -> Option<(PatternKind, PatternMatch)> {
    PatternKind::TABLE
        .iter()
        .find_map(|kind| kind.extract(head, file, wrap_width).map(|m| (*kind, m)))
}

fn context_error(head: &str, file: Option<String>) -> Option<PatternMatch> {
    let caps = CONTEXT_ERROR.captures(head)?;
    let l_line = caps.get(2)?.as_str();
    let trailing = caps.get(4)?.as_str();

    // The continuation is printed indented by exactly the width of the
    // `l.<N>` line; anything else is unrelated output.
    let indent = trailing.len() - trailing.trim_start().len();
    if indent != l_line.len() {
        return None;
    }

    let row = caps.get(3)?.as_str().parse().ok()?;
    let description = format!(
        "{}\n{}\n{}",
        caps.get(1)?.as_str().trim(),
        l_line.trim_end(),
        trailing.trim_end()
    );
    Some(PatternMatch {
        diagnostic: Diagnostic::new(Severity::Error, file, row, description.trim_end()),
        len: caps.get(0)?.end(),
    })
}

fn line_ref_error(head: &str, file: Option<String>) -> Option<PatternMatch> {
    let caps = LINE_REF_ERROR.captures(head)?;
    let row = caps.get(3)?.as_str().parse().ok()?;
    let description = format!(
        "{}\n{}",
        caps.get(1)?.as_str().trim(),
        caps.get(2)?.as_str().trim_end()
    );
    Some(PatternMatch {
        diagnostic: Diagnostic::new(Severity::Error, file, row, description),
        len: caps.get(0)?.end(),
    })
}

fn critical_error(head: &str, file: Option<String>) -> Option<PatternMatch> {
    let caps = CRITICAL_ERROR.captures(head)?;
    let message = caps.get(1)?.as_str().trim();
    if message.is_empty() {
        return None;
    }
    Some(PatternMatch {
        diagnostic: Diagnostic::new(Severity::Error, file, 0, message),
        len: caps.get(0)?.end(),
    })
}

fn package_warning(head: &str, file: Option<String>) -> Option<PatternMatch> {
    let caps = PACKAGE_WARNING.captures(head)?;
    let header = caps.get(0)?;
    let prefix = format!("({})", caps.get(1)?.as_str());

    let mut parts = vec![header.as_str()];
    let mut end = header.end();
    while let Some(next) = head[end..].strip_prefix('\n') {
        let line = next.split('\n').next().unwrap_or_default();
        match line.strip_prefix(prefix.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                parts.push(rest);
                end += 1 + line.len();
            }
            _ => break,
        }
    }

    let description = collapse_whitespace(&parts.join(" "));
    Some(PatternMatch {
        diagnostic: Diagnostic::new(Severity::Warning, file, input_line(&description), description),
        len: end,
    })
}

fn paragraph_warning(head: &str, file: Option<String>) -> Option<PatternMatch> {
    let caps = PARAGRAPH_WARNING.captures(head)?;
    let description = caps.get(1)?.as_str().replace('\n', "");
    Some(PatternMatch {
        diagnostic: Diagnostic::new(Severity::Warning, file, input_line(&description), description),
        len: caps.get(0)?.end(),
    })
}

fn bad_box(head: &str, file: Option<String>, wrap_width: usize) -> Option<PatternMatch> {
    let caps = BAD_BOX.captures(head)?;
    let header = caps.get(0)?;

    // `\output is active` notices carry neither a line number nor a box listing.
    if caps.get(3).is_some() {
        return Some(PatternMatch {
            diagnostic: Diagnostic::new(Severity::BoxOverflow, file, 0, header.as_str().trim_end()),
            len: header.end(),
        });
    }

    let row = caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()?;
    let mut description = header.as_str().to_string();
    let mut end = header.end();

    if let Some(body) = head[end..].strip_prefix('\n') {
        description.push('\n');
        end += 1;
        // Lines of exactly the wrap width were broken by the engine, not by the author.
        for line in body.split('\n') {
            if line.len() == wrap_width {
                description.push_str(line);
                end += line.len() + 1;
            } else {
                description.push_str(line.trim_end());
                end += line.len();
                break;
            }
        }
        end = end.min(head.len());
    }

    Some(PatternMatch {
        diagnostic: Diagnostic::new(Severity::BoxOverflow, file, row, description.trim_end()),
        len: end,
    })
}

fn input_line(description: &str) -> u32 {
    INPUT_LINE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

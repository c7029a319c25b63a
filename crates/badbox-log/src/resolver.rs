//! Recognition of file-inclusion markers.
//!
//! TeX announces every file it opens with `(` followed by the file name, but
//! the name is not delimited and is hard-wrapped like any other output. The
//! [`Resolver`] walks forward from the `(` one path component at a time and
//! asks a [`FileOracle`] whether what it has so far can be a real file.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;

/// Shapes a file name printed by the engine can start with: relative to the
/// working directory, absolute, drive-rooted or a network share.
static PATH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:\.{1,2}[/\\]|/|[A-Za-z]:[/\\]|\\\\)"#).unwrap());

static RELATIVE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.{1,2}[/\\]").unwrap());

/// A name ending in a short extension, e.g. `article.cls` or `main.tex`.
static FILENAME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^/\\\s]\.[A-Za-z0-9]{1,5}$").unwrap());

/// Answer of a [`FileOracle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Exists,
    DoesNotExist,
    /// The oracle cannot tell, e.g. the file lives in a TeX tree it cannot see.
    Indeterminate,
}

/// Host capability answering whether a path names an existing file.
///
/// Implementations must not fail; anything they cannot answer is
/// [`FileStatus::Indeterminate`].
pub trait FileOracle {
    fn status(&self, path: &str) -> FileStatus;
}

impl<F> FileOracle for F
where
    F: Fn(&str) -> FileStatus,
{
    fn status(&self, path: &str) -> FileStatus {
        self(path)
    }
}

/// Oracle backed by the local filesystem.
///
/// Directories answer `Indeterminate`: they are valid path prefixes but never
/// a finished file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOracle;

impl FileOracle for FsOracle {
    fn status(&self, path: &str) -> FileStatus {
        if path.is_empty() {
            return FileStatus::Indeterminate;
        }
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => FileStatus::Exists,
            Ok(_) => FileStatus::Indeterminate,
            Err(e) if e.kind() == ErrorKind::NotFound => FileStatus::DoesNotExist,
            Err(e) => {
                log::trace!("Cannot stat {:?}: {}", path, e);
                FileStatus::Indeterminate
            }
        }
    }
}

/// A file name read after a `(`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: String,
    /// Bytes consumed, counting the opening `(`.
    pub len: usize,
}

/// Best indeterminate candidate seen so far while extending a path.
#[derive(Debug, Clone)]
struct Candidate {
    path: String,
    end: usize,
}

pub struct Resolver<'a> {
    oracle: &'a dyn FileOracle,
    base_dir: &'a str,
    wrap_width: usize,
}

impl<'a> Resolver<'a> {
    /// `base_dir` is prepended to relative names before querying the oracle;
    /// it is empty or ends with a separator.
    pub fn new(oracle: &'a dyn FileOracle, base_dir: &'a str, wrap_width: usize) -> Self {
        Self {
            oracle,
            base_dir,
            wrap_width: wrap_width.max(1),
        }
    }

    /// Reads the file name following the `(` at the start of `text`.
    ///
    /// `column` is the byte offset of that `(` within its physical line; it is
    /// needed to tell an engine line wrap from a genuine line end.
    pub fn resolve(&self, text: &str, column: usize) -> Option<FileRef> {
        let rest = text.strip_prefix('(')?;

        if let Some(quoted) = rest.strip_prefix('"') {
            let close = quoted.find('"')?;
            let path = quoted[..close].replace('\n', "");
            return Some(FileRef {
                path: path.trim_end().to_string(),
                len: close + 3,
            });
        }

        if !PATH_PREFIX.is_match(rest) {
            return None;
        }
        let base = if RELATIVE_PREFIX.is_match(rest) {
            self.base_dir
        } else {
            ""
        };

        let mut path = String::new();
        let mut pos = 1;
        let mut line_len = column + 1;
        let mut checkpoint: Option<Candidate> = None;

        loop {
            let tail = &text[pos..];
            let run = tail.find(is_path_break).unwrap_or(tail.len());
            path.push_str(&tail[..run]);
            pos += run;
            line_len += run;

            match text[pos..].chars().next() {
                Some(sep @ ('/' | '\\')) => {
                    if !path.is_empty() && self.query(base, &path) == FileStatus::DoesNotExist {
                        log::trace!("Rejecting {:?}: no such directory", path);
                        return None;
                    }
                    path.push(sep);
                    pos += 1;
                    line_len += 1;
                }
                Some(' ') => {
                    match self.query(base, &path) {
                        FileStatus::Exists => return Some(finished(&path, pos)),
                        FileStatus::Indeterminate if is_filename_shaped(&path) => {
                            checkpoint = Some(Candidate {
                                path: path.clone(),
                                end: pos,
                            });
                        }
                        _ => {}
                    }
                    path.push(' ');
                    pos += 1;
                    line_len += 1;
                }
                Some('\n') if line_len > 0 && line_len % self.wrap_width == 0 => {
                    // Engine wrap: the name goes on after the line break.
                    let trimmed = path.trim_end();
                    let plausible = match self.query(base, trimmed) {
                        FileStatus::Exists => true,
                        FileStatus::Indeterminate => is_filename_shaped(trimmed),
                        FileStatus::DoesNotExist => false,
                    };
                    if plausible {
                        checkpoint = Some(Candidate {
                            path: path.clone(),
                            end: pos,
                        });
                    }
                    pos += 1;
                    line_len = 0;
                }
                next => {
                    let line_end = matches!(next, Some('\n') | None);
                    return self.settle(base, &path, pos, line_end, checkpoint);
                }
            }
        }
    }

    /// Decides the outcome once the name cannot be extended any further.
    ///
    /// A line that ends short of the wrap width closes the name for good, so a
    /// name the oracle rejects there is not a file at all. At a parenthesis
    /// the scan falls back to the last checkpoint instead.
    fn settle(
        &self,
        base: &str,
        path: &str,
        end: usize,
        line_end: bool,
        checkpoint: Option<Candidate>,
    ) -> Option<FileRef> {
        let trimmed = path.trim_end();
        match self.query(base, trimmed) {
            FileStatus::Exists => Some(finished(trimmed, end)),
            FileStatus::Indeterminate if is_filename_shaped(trimmed) => {
                Some(finished(trimmed, end))
            }
            FileStatus::DoesNotExist if line_end => {
                log::trace!("Rejecting {:?}: no such file at line end", trimmed);
                None
            }
            _ => {
                let Some(candidate) = checkpoint else {
                    log::trace!("Rejecting {:?}: not a file name", trimmed);
                    return None;
                };
                log::trace!("Rolling back {:?} to {:?}", trimmed, candidate.path);
                Some(finished(&candidate.path, candidate.end))
            }
        }
    }

    fn query(&self, base: &str, path: &str) -> FileStatus {
        if path.is_empty() {
            return FileStatus::Indeterminate;
        }
        self.oracle.status(&format!("{base}{path}"))
    }
}

fn finished(path: &str, end: usize) -> FileRef {
    FileRef {
        path: path.trim_end().to_string(),
        len: end,
    }
}

fn is_path_break(c: char) -> bool {
    matches!(c, '/' | '\\' | ' ' | '(' | ')' | '\n')
}

fn is_filename_shaped(path: &str) -> bool {
    FILENAME_SHAPE.is_match(path.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indeterminate(_: &str) -> FileStatus {
        FileStatus::Indeterminate
    }

    fn resolve(oracle: &dyn FileOracle, text: &str) -> Option<FileRef> {
        Resolver::new(oracle, "", 79).resolve(text, 0)
    }

    #[test]
    fn test_stops_at_existing_file() {
        let oracle = |p: &str| {
            if p == "./chapter1.tex" {
                FileStatus::Exists
            } else {
                FileStatus::Indeterminate
            }
        };
        let text = "(./chapter1.tex text)";
        let found = resolve(&oracle, text).unwrap();
        assert_eq!(found.path, "./chapter1.tex");
        assert_eq!(&text[found.len..], " text)");
    }

    #[test]
    fn test_rolls_back_to_checkpoint() {
        let text = "(./main.tex is here)";
        let found = resolve(&indeterminate, text).unwrap();
        assert_eq!(found.path, "./main.tex");
        assert_eq!(&text[found.len..], " is here)");
    }

    #[test]
    fn test_trailing_space_before_paren() {
        let text = "(./main.tex (./b.tex)";
        let found = resolve(&indeterminate, text).unwrap();
        assert_eq!(found.path, "./main.tex");
        assert_eq!(&text[found.len..], "(./b.tex)");
    }

    #[test]
    fn test_rejects_unknown_prefix() {
        assert!(resolve(&indeterminate, "(Info) text").is_none());
        assert!(resolve(&indeterminate, "(preloaded format=pdflatex)").is_none());
        assert!(resolve(&indeterminate, "(10.0pt too wide)").is_none());
    }

    #[test]
    fn test_rejects_missing_directory() {
        let oracle = |p: &str| {
            if p.starts_with("/nope") {
                FileStatus::DoesNotExist
            } else {
                FileStatus::Indeterminate
            }
        };
        assert!(resolve(&oracle, "(/nope/file.tex)").is_none());
    }

    #[test]
    fn test_missing_name_at_line_end_is_not_a_file() {
        let oracle = |p: &str| {
            if p == "./a.tex b" {
                FileStatus::DoesNotExist
            } else {
                FileStatus::Indeterminate
            }
        };
        assert!(resolve(&oracle, "(./a.tex b\nrest").is_none());
        assert!(resolve(&oracle, "(./a.tex b").is_none());
        // Before a parenthesis the checkpoint at the space still stands.
        let found = resolve(&oracle, "(./a.tex b)").unwrap();
        assert_eq!(found.path, "./a.tex");
    }

    #[test]
    fn test_rejects_shapeless_name_without_checkpoint() {
        assert!(resolve(&indeterminate, "(./see below)").is_none());
    }

    #[test]
    fn test_quoted_path() {
        let text = "(\"./my\nfile.tex\" rest";
        let found = resolve(&indeterminate, text).unwrap();
        assert_eq!(found.path, "./myfile.tex");
        assert_eq!(&text[found.len..], " rest");
    }

    #[test]
    fn test_wrapped_path_is_joined() {
        let first = format!("(./{}", "d".repeat(76));
        assert_eq!(first.len(), 79);
        let text = format!("{first}\n/file.tex)\n");
        let found = resolve(&indeterminate, &text).unwrap();
        assert_eq!(found.path, format!("./{}/file.tex", "d".repeat(76)));
        assert_eq!(&text[found.len..], ")\n");
    }

    #[test]
    fn test_wrap_uses_column_and_bytes() {
        // Two-byte characters: 38 of them plus "(./" is 79 bytes but 41 chars.
        let name = "é".repeat(38);
        let prefix = "(./";
        let text = format!("{prefix}{name}\n.tex)");
        let found = Resolver::new(&indeterminate, "", 79)
            .resolve(&text, 0)
            .unwrap();
        assert_eq!(found.path, format!("./{name}.tex"));

        // The same name starting later in the line does not reach the wrap width.
        let found = Resolver::new(&indeterminate, "", 79).resolve(&text, 5);
        assert!(found.is_none());
    }

    #[test]
    fn test_short_line_ends_path() {
        let text = "(./main.tex\nmore text";
        let found = resolve(&indeterminate, text).unwrap();
        assert_eq!(found.path, "./main.tex");
        assert_eq!(&text[found.len..], "\nmore text");
    }

    #[test]
    fn test_missing_file_at_line_end() {
        let oracle = |p: &str| {
            if p.ends_with(".tex") {
                FileStatus::DoesNotExist
            } else {
                FileStatus::Indeterminate
            }
        };
        assert!(resolve(&oracle, "(./gone.tex\n").is_none());
    }

    #[test]
    fn test_base_dir_only_for_relative_names() {
        let seen = std::cell::RefCell::new(Vec::new());
        let oracle = |p: &str| {
            seen.borrow_mut().push(p.to_string());
            FileStatus::Exists
        };
        let resolver = Resolver::new(&oracle, "/home/u/thesis/", 79);
        resolver.resolve("(./a.tex)", 0).unwrap();
        resolver.resolve("(/usr/b.sty)", 0).unwrap();
        let seen = seen.into_inner();
        assert!(seen.contains(&"/home/u/thesis/./a.tex".to_string()));
        assert!(seen.contains(&"/usr/b.sty".to_string()));
        assert!(!seen.iter().any(|p| p.starts_with("/home/u/thesis//usr")));
    }

    #[test]
    fn test_windows_paths() {
        let found = resolve(&indeterminate, "(C:\\texlive\\base\\article.cls)").unwrap();
        assert_eq!(found.path, "C:\\texlive\\base\\article.cls");
    }
}

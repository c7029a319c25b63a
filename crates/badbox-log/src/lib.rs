//! # badbox log parser
//!
//! Extracts errors, warnings and bad-box notices from TeX engine transcripts
//! (`*.log`, or the terminal output of latexmk) and attributes each one to the
//! source file and line it came from.
//!
//! ## Overview
//!
//! A transcript is not a formal grammar. The parser copes with:
//!
//! - **Line wrapping**: engines hard-wrap output at 79 *bytes*, splitting file
//!   names and messages alike
//! - **File stack tracking**: `(file.tex` opens a file and `)` closes it, but
//!   parentheses also occur in ordinary message text
//! - **Multi-line messages**: `! ...` errors with `l.<N>` context, package
//!   warnings with `(<name>)` continuation lines, box listings
//! - **Reruns**: latexmk output containing several compiler passes
//!
//! ## Architecture
//!
//! ```text
//!  transcript ──► LogParser::run ──► Vec<Diagnostic> ──► filter / sort
//!                   │        │
//!          patterns │        │ ParseState::step
//!    (ordered table)│        │   └─ Resolver ◄── FileOracle (host)
//!                   ▼        ▼
//!              Diagnostic   file stack
//! ```
//!
//! - [`patterns`] - the ordered [`PatternKind`](patterns::PatternKind) table,
//!   tried at the head of the unread text
//! - [`state`] - [`ParseState`](state::ParseState): cursor, file stack and
//!   stray-parenthesis depth
//! - [`resolver`] - reads a file name after `(`, consulting a
//!   [`FileOracle`](resolver::FileOracle)
//! - [`rerun`] - rerun markers and the stale `.aux` advisory
//!
//! ## Examples
//!
//! ```
//! use badbox_log::{FileStatus, LogParser, Severity};
//!
//! let log = "(./main.tex\n! Undefined control sequence.\nl.5 \\foo\n    \n)";
//! let oracle = |_: &str| FileStatus::Indeterminate;
//! let diagnostics = LogParser::default().parse(log, &oracle);
//!
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].severity, Severity::Error);
//! assert_eq!(diagnostics[0].file.as_deref(), Some("./main.tex"));
//! assert_eq!(diagnostics[0].row, 5);
//! ```
//!
//! ### Exporting to JSON
//!
//! ```no_run
//! use badbox_log::{FsOracle, LogParser};
//! use std::fs;
//!
//! let log = fs::read_to_string("main.log")?;
//! let diagnostics = LogParser::default().with_root("main.tex").parse(&log, &FsOracle);
//! let json = serde_json::to_string_pretty(&diagnostics)?;
//! fs::write("diagnostics.json", json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Parser configuration and its on-disk form.
pub mod config;
/// Diagnostic model.
pub mod ir;
/// Streaming parser driving the pattern table and the file stack.
pub mod parser;
pub mod patterns;
pub mod rerun;
pub mod resolver;
pub mod state;


pub use config::{ConfigError, ParseConfig};
pub use ir::{Diagnostic, Severity, SortBy, Summary};
pub use parser::{normalize_line_endings, LogParser, ParseOutcome};
pub use rerun::{Confirm, StaleAuxAdvisory};
pub use resolver::{FileOracle, FileStatus, FsOracle};

/// Schema version of the JSON emitted for [`Diagnostic`] lists.
///
/// - MAJOR: Breaking changes to the diagnostic structure
/// - MINOR: New optional fields
/// - PATCH: Bug fixes to parsing behavior
pub const SCHEMA_VERSION: &str = "1.0.0";

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// How serious a [`Diagnostic`] is.
///
/// Variants are declared from least to most severe, so the derived ordering
/// can be used directly for minimum-severity filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Over- or underfull box notice.
    BoxOverflow,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::BoxOverflow => "badbox",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "errors" => Ok(Severity::Error),
            "warning" | "warnings" => Ok(Severity::Warning),
            "badbox" | "badboxes" | "box" | "boxoverflow" => Ok(Severity::BoxOverflow),
            other => Err(ConfigError::InvalidValue {
                field: "min_severity",
                value: other.to_string(),
            }),
        }
    }
}

/// Order in which diagnostics leave the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    /// Errors first, then warnings, then box notices; discovery order within a group.
    Severity,
    /// Discovery order.
    #[default]
    Occurrence,
}

impl SortBy {
    /// Reorders `diagnostics` in place. The sort is stable.
    pub fn apply(self, diagnostics: &mut [Diagnostic]) {
        if self == SortBy::Severity {
            diagnostics.sort_by_key(|d| Reverse(d.severity));
        }
    }
}

impl FromStr for SortBy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "severity" => Ok(SortBy::Severity),
            "occurrence" | "order" => Ok(SortBy::Occurrence),
            other => Err(ConfigError::InvalidValue {
                field: "sort_by",
                value: other.to_string(),
            }),
        }
    }
}

/// A single message extracted from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// File that was open when the message was printed, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Input line the message refers to; `0` when unknown.
    pub row: u32,
    pub description: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        file: Option<String>,
        row: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            file,
            row,
            description: description.into(),
        }
    }
}

/// Per-severity totals, as shown in a report header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub badboxes: usize,
}

impl Summary {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        diagnostics.iter().fold(Self::default(), |mut acc, d| {
            match d.severity {
                Severity::Error => acc.errors += 1,
                Severity::Warning => acc.warnings += 1,
                Severity::BoxOverflow => acc.badboxes += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(severity: Severity, row: u32) -> Diagnostic {
        Diagnostic::new(severity, None, row, "x")
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::BoxOverflow < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!("Warnings".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn sort_by_severity_is_stable() {
        let mut list = vec![
            diag(Severity::BoxOverflow, 1),
            diag(Severity::Error, 2),
            diag(Severity::Warning, 3),
            diag(Severity::Error, 4),
        ];
        SortBy::Severity.apply(&mut list);
        let rows: Vec<u32> = list.iter().map(|d| d.row).collect();
        assert_eq!(rows, vec![2, 4, 3, 1]);

        SortBy::Occurrence.apply(&mut list);
        let rows: Vec<u32> = list.iter().map(|d| d.row).collect();
        assert_eq!(rows, vec![2, 4, 3, 1]);
    }

    #[test]
    fn summary_counts() {
        let list = vec![
            diag(Severity::Error, 1),
            diag(Severity::Warning, 2),
            diag(Severity::Warning, 3),
        ];
        assert_eq!(
            Summary::of(&list),
            Summary {
                errors: 1,
                warnings: 2,
                badboxes: 0
            }
        );
    }
}

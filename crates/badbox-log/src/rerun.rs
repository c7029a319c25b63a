//! Build-tool reruns and the stale auxiliary file advisory.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ir::Diagnostic;

/// Lines latexmk prints right before it invokes the engine again.
static RERUN_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:Latexmk: applying rule|Run number \d+ of rule)").unwrap());

/// Printed when TeX hits the end of an `.aux` file left truncated by an
/// aborted earlier run.
pub const STALE_AUX_MARKER: &str = "File ended while scanning use of";

pub const STALE_AUX_PROMPT: &str = "The last run stopped while reading an auxiliary file that looks truncated. \
Remove the auxiliary files so the next run starts clean?";

/// Whether `head` starts a fresh compiler pass, making earlier diagnostics obsolete.
pub fn starts_new_pass(head: &str) -> bool {
    RERUN_MARKER.is_match(head)
}

/// Host capability asking the user a yes/no question.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Offer to remove auxiliary files, raised by the diagnostic at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleAuxAdvisory {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

/// Finds the last diagnostic pointing at a truncated auxiliary file.
pub fn find_stale_aux(diagnostics: &[Diagnostic]) -> Option<StaleAuxAdvisory> {
    let (index, diagnostic) = diagnostics
        .iter()
        .enumerate()
        .rev()
        .find(|(_, d)| d.description.contains(STALE_AUX_MARKER))?;
    Some(StaleAuxAdvisory {
        index,
        file: diagnostic.file.clone(),
        message: STALE_AUX_PROMPT.to_string(),
    })
}

use badbox_log::{Diagnostic, StaleAuxAdvisory, Summary, SCHEMA_VERSION};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub schema_version: &'static str,
    pub diagnostics: &'a [Diagnostic],
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_aux: Option<&'a StaleAuxAdvisory>,
}

impl<'a> JsonReport<'a> {
    pub fn new(diagnostics: &'a [Diagnostic], stale_aux: Option<&'a StaleAuxAdvisory>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            diagnostics,
            summary: Summary::of(diagnostics),
            stale_aux,
        }
    }
}

/// Writes one `file:row: severity: message` entry per diagnostic, compiler style,
/// followed by the totals.
pub fn write_text(out: &mut impl Write, diagnostics: &[Diagnostic]) -> io::Result<()> {
    for diagnostic in diagnostics {
        let file = diagnostic.file.as_deref().unwrap_or("<unknown>");
        let mut lines = diagnostic.description.lines();
        let first = lines.next().unwrap_or_default();
        if diagnostic.row > 0 {
            writeln!(out, "{}:{}: {}: {}", file, diagnostic.row, diagnostic.severity, first)?;
        } else {
            writeln!(out, "{}: {}: {}", file, diagnostic.severity, first)?;
        }
        for line in lines {
            writeln!(out, "    {}", line)?;
        }
    }

    let summary = Summary::of(diagnostics);
    writeln!(
        out,
        "{} error(s), {} warning(s), {} bad box(es)",
        summary.errors, summary.warnings, summary.badboxes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use badbox_log::Severity;

    #[test]
    fn test_text_report() {
        let diagnostics = vec![
            Diagnostic::new(
                Severity::Error,
                Some("./main.tex".into()),
                5,
                "Undefined control sequence.\nl.5 \\foo",
            ),
            Diagnostic::new(
                Severity::Warning,
                None,
                0,
                "LaTeX Warning: Label(s) may have changed.",
            ),
        ];
        let mut out = Vec::new();
        write_text(&mut out, &diagnostics).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "./main.tex:5: error: Undefined control sequence.\n    l.5 \\foo\n\
<unknown>: warning: LaTeX Warning: Label(s) may have changed.\n\
1 error(s), 1 warning(s), 0 bad box(es)\n"
        );
    }

    #[test]
    fn test_json_report_shape() {
        let diagnostics = vec![Diagnostic::new(Severity::BoxOverflow, None, 3, "Overfull")];
        let report = JsonReport::new(&diagnostics, None);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["summary"]["badboxes"], 1);
        assert_eq!(value["diagnostics"][0]["row"], 3);
        assert!(value.get("stale_aux").is_none());
    }
}

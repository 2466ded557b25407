use super::{CheckKind, EventDetail, EventKind, Report, ReportEvent, ReportOutcome};
use crate::config::ReportFormat;
use anyhow::Result;
use std::fmt::Write as _;

impl Report {
    /// Plain text in the layout of the classic `.out` file
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let header = &self.header;
        let _ = write!(out, "====={}=====\n\n", header.tool);
        let _ = write!(out, "{}\n\n", header.banner);
        let _ = write!(out, "File: {}\n\n", header.source_file);

        match &self.outcome {
            ReportOutcome::Aborted { reason } => {
                let _ = writeln!(out, "Cannot check this form: {reason}");
            }
            ReportOutcome::Completed {
                document_type,
                document_version,
                events,
                summary,
                notes,
            } => {
                let _ = write!(out, "Type: {document_type}\n\n");
                let _ = write!(out, "Version: {document_version}\n\n");
                for note in notes {
                    let _ = writeln!(out, "Note: {note}");
                }
                if !notes.is_empty() {
                    out.push('\n');
                }
                for event in events {
                    out.push_str(&render_event(event));
                    out.push('\n');
                }
                let _ = writeln!(out, "==={}===", summary.warning_line());
                let _ = writeln!(out, "***{}***", summary.fail_line());
                let _ = writeln!(out, "###{}###", summary.version_line());
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Json => self.to_json(),
        }
    }

    pub fn save_with_format(&self, path: &str, format: ReportFormat) -> Result<()> {
        let rendered = self.render(format)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }
}

fn status(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Ok => "[OK]",
        EventKind::Fail => "[FAIL]",
        EventKind::Warning => "[WARNING]",
    }
}

/// One labeled block per event
pub fn render_event(event: &ReportEvent) -> String {
    let field = event.field.as_deref().unwrap_or("");
    let line = event.line.unwrap_or(1);

    match (&event.check, &event.detail) {
        (CheckKind::Version, EventDetail::Version { expected, actual }) => match event.kind {
            EventKind::Ok => format!("{} => {}\n", event.label, status(event.kind)),
            _ => format!(
                "{} => {}\nCorrect PR Version: {expected}\nThis PR Version: {actual}\n",
                event.label,
                status(event.kind)
            ),
        },
        (_, EventDetail::Matched { text }) => format!(
            "{} => {}\nField: {field} Text: {text}\n",
            event.label,
            status(event.kind)
        ),
        (_, EventDetail::Value { escaped }) => format!(
            "{} => {}\nField: {field} Text: {escaped}\n",
            event.label,
            status(event.kind)
        ),
        (_, EventDetail::CatchPhrase { pattern, matched }) => match matched {
            Some(found) => format!(
                "{}, Line {line}:\n{} Likely error => {found}\n",
                event.label,
                status(event.kind)
            ),
            None => format!(
                "{}, Line {line}:\nCatch Common => {pattern} {}\n",
                event.label,
                status(event.kind)
            ),
        },
        (
            _,
            EventDetail::Spelling {
                token,
                suggestions,
                overlooked,
            },
        ) => {
            let body = match (event.kind, overlooked) {
                (EventKind::Ok, true) => format!("!{token}! -> matches overlook list."),
                (EventKind::Ok, false) => format!("!{token}! OK!"),
                _ => format!("{} ?{token}? -> {}", status(event.kind), suggestions.join(" ")),
            };
            format!("{} line {line}:\n{}\n", event.label, body.trim_end())
        }
        (_, EventDetail::Version { expected, actual }) => format!(
            "{} => {}\nExpected: {expected}\nFound: {actual}\n",
            event.label,
            status(event.kind)
        ),
    }
}

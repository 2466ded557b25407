use super::{CheckKind, EventKind, Report, ReportEvent, ReportHeader, ReportOutcome, Summary};
use crate::config::CheckOptions;

/// Append-only event log with running counters for one run.
///
/// OK events are dropped unless the run is verbose; failures and warnings
/// are always kept and counted.
#[derive(Debug, Clone)]
pub struct ReportAccumulator {
    options: CheckOptions,
    events: Vec<ReportEvent>,
    summary: Summary,
    notes: Vec<String>,
}

impl ReportAccumulator {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            events: Vec::new(),
            summary: Summary::default(),
            notes: Vec::new(),
        }
    }

    pub fn record(&mut self, event: ReportEvent) {
        match event.kind {
            EventKind::Ok => {
                if !self.options.verbose {
                    return;
                }
            }
            EventKind::Fail => match event.check {
                CheckKind::Version => self.summary.version_failures += 1,
                _ => self.summary.failed_fields += 1,
            },
            EventKind::Warning => self.summary.warnings += 1,
        }
        self.events.push(event);
    }

    /// Free-form line for the report, e.g. a degraded check
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn finish(self, header: ReportHeader, document_type: &str, document_version: &str) -> Report {
        Report {
            header,
            outcome: ReportOutcome::Completed {
                document_type: document_type.to_string(),
                document_version: document_version.to_string(),
                events: self.events,
                summary: self.summary,
                notes: self.notes,
            },
        }
    }
}

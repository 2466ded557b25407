//! Check report: events, counters and the finished artifact
//!
//! The accumulator collects events while checks run; `Report` is what a run
//! hands back, either completed with events and a summary or aborted with a
//! single reason.

pub mod accumulator;
pub mod render;

pub use accumulator::ReportAccumulator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tool name printed at the top of every report
pub const TOOL_NAME: &str = "PR Checker";

/// Version banner stamped on reports
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Ok,
    Fail,
    Warning,
}

/// Which check produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Version,
    Format,
    CommonError,
    Spelling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetail {
    /// Declared vs required form version
    Version { expected: String, actual: String },
    /// Text the format pattern matched
    Matched { text: String },
    /// Field value that failed its format pattern, escaped for display
    Value { escaped: String },
    /// Catch-list pattern and the substring it found (none when it found nothing)
    CatchPhrase {
        pattern: String,
        matched: Option<String>,
    },
    Spelling {
        token: String,
        suggestions: Vec<String>,
        overlooked: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEvent {
    pub kind: EventKind,
    pub check: CheckKind,
    /// Display label of the field (or "Version Check")
    pub label: String,
    /// Field identifier (`sid`) the event is about
    pub field: Option<String>,
    /// 1-based line within the field text
    pub line: Option<usize>,
    pub detail: EventDetail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub warnings: usize,
    pub failed_fields: usize,
    /// Version mismatches, counted apart from field failures
    pub version_failures: usize,
}

impl Summary {
    pub fn warning_line(&self) -> String {
        format!("{} warning(s)", self.warnings)
    }

    pub fn fail_line(&self) -> String {
        format!("{} failed field(s)", self.failed_fields)
    }

    /// Version mismatches are counted apart from failed fields
    pub fn version_line(&self) -> String {
        format!("{} version mismatch(es)", self.version_failures)
    }

    pub fn passed(&self) -> bool {
        self.failed_fields == 0 && self.version_failures == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub tool: String,
    pub banner: String,
    /// File name of the checked form
    pub source_file: String,
    /// SHA-256 of the form file as read
    pub source_sha256: Option<String>,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
}

impl ReportHeader {
    pub fn new(source_file: &str, source_sha256: Option<String>) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            banner: format!("prcheck v{TOOL_VERSION}"),
            source_file: source_file.to_string(),
            source_sha256,
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    Completed {
        document_type: String,
        document_version: String,
        events: Vec<ReportEvent>,
        summary: Summary,
        /// Degradations and verbose rule dumps
        notes: Vec<String>,
    },
    /// A fatal load error; no checks ran
    Aborted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub header: ReportHeader,
    pub outcome: ReportOutcome,
}

impl Report {
    pub fn aborted(header: ReportHeader, reason: impl Into<String>) -> Self {
        Self {
            header,
            outcome: ReportOutcome::Aborted {
                reason: reason.into(),
            },
        }
    }

    pub fn events(&self) -> &[ReportEvent] {
        match &self.outcome {
            ReportOutcome::Completed { events, .. } => events,
            ReportOutcome::Aborted { .. } => &[],
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match &self.outcome {
            ReportOutcome::Completed { summary, .. } => Some(summary),
            ReportOutcome::Aborted { .. } => None,
        }
    }

    pub fn notes(&self) -> &[String] {
        match &self.outcome {
            ReportOutcome::Completed { notes, .. } => notes,
            ReportOutcome::Aborted { .. } => &[],
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, ReportOutcome::Aborted { .. })
    }
}

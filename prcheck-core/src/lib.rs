// PR Checker Core Library
//
// Checks XFDL performance-report forms against rules kept in an ODS workbook.
// Main interface for turning a form + rules workbook into a check report.

pub mod types;
pub mod error;
pub mod preprocessors;
pub mod processor;
pub mod config;
pub mod rules;
pub mod report;
pub mod spelling;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{LoadError, SpellCheckError};
pub use preprocessors::{DocumentLoader, FormLoader, WorkbookLoader};
pub use processor::{aborted_report, report_path, CheckStep, FormProcessor, StepProfiler};
pub use config::{CheckConfig, CheckOptions, ReportFormat, SpellingBackend};
pub use report::{Report, ReportEvent, ReportOutcome, Summary};
pub use rules::{CheckEngine, RuleSet, RuleSetLoader};
pub use spelling::{DictionarySpellChecker, DisabledSpellChecker, SpellChecker};

#[cfg(feature = "command-spelling")]
pub use spelling::CommandSpellChecker;

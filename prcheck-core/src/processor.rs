use crate::config::{CheckConfig, OutputConfig, ReportFormat};
use crate::error::LoadError;
use crate::preprocessors::{DocumentLoader, FormLoader, WorkbookLoader};
use crate::report::{Report, ReportHeader};
use crate::rules::{CheckEngine, RuleSetLoader};
use crate::spelling::{spell_checker_from_config, SpellChecker};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timed steps of one form check, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStep {
    ReadForm,
    ReadRules,
    DecodeForm,
    LoadWorkbook,
    BuildRuleSet,
    RunChecks,
}

impl CheckStep {
    pub fn label(self) -> &'static str {
        match self {
            CheckStep::ReadForm => "read form",
            CheckStep::ReadRules => "read rules workbook",
            CheckStep::DecodeForm => "decode form",
            CheckStep::LoadWorkbook => "parse rules workbook",
            CheckStep::BuildRuleSet => "build rule tables",
            CheckStep::RunChecks => "run checks",
        }
    }
}

/// Wall-clock time per step, kept only when `--profile` is on
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(CheckStep, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<R>(&mut self, step: CheckStep, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        debug!(step = step.label(), ms = elapsed.as_millis() as u64, "step timed");
        self.timings.push((step, elapsed));
        result
    }

    pub fn timings(&self) -> &[(CheckStep, Duration)] {
        &self.timings
    }

    /// One line per step with its share of the total
    pub fn print_summary(&self) {
        if self.timings.is_empty() {
            return;
        }
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        println!("\n⏱️  Check timings ({}ms total):", total.as_millis());
        for (step, elapsed) in &self.timings {
            let share = if total.is_zero() {
                0.0
            } else {
                elapsed.as_secs_f64() * 100.0 / total.as_secs_f64()
            };
            println!("   {:<22} {:>6}ms {:>5.1}%", step.label(), elapsed.as_millis(), share);
        }
    }
}

/// Hex SHA-256 of the form file, stamped on the report header
pub fn calculate_form_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Name the report is filed under: the form's file name
pub fn source_name(form_path: &Path) -> String {
    form_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| form_path.display().to_string())
}

/// `<form file name>.out` (or `.json`) in the output directory
pub fn report_path(form_path: &Path, output: &OutputConfig) -> PathBuf {
    let extension = match output.format {
        ReportFormat::Text => "out",
        ReportFormat::Json => "json",
    };
    let file_name = format!("{}.{extension}", source_name(form_path));
    match &output.directory {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Report for a form that could not be checked at all, stamped with the
/// form's digest when the form is readable
pub fn aborted_report(form_path: &Path, reason: impl Into<String>) -> Report {
    let digest = std::fs::read(form_path).ok().map(|bytes| calculate_form_hash(&bytes));
    Report::aborted(ReportHeader::new(&source_name(form_path), digest), reason)
}

/// Checks one form against one rules workbook per call.
///
/// Fatal load problems never surface as `Err`; they become an aborted
/// report carrying the reason.
pub struct FormProcessor {
    config: CheckConfig,
    form_loader: FormLoader,
    workbook_loader: WorkbookLoader,
    engine: CheckEngine,
    profiling: bool,
}

impl FormProcessor {
    /// Spell checker chosen from the config
    pub fn new(config: CheckConfig) -> Self {
        let selection = spell_checker_from_config(&config.spelling);
        Self::new_with_spell_checker(config, selection.checker, selection.note)
    }

    /// Create FormProcessor with an injected spell checker
    pub fn new_with_spell_checker(
        config: CheckConfig,
        spell_checker: Box<dyn SpellChecker>,
        spelling_note: Option<String>,
    ) -> Self {
        let mut engine =
            CheckEngine::new(config.options(), spell_checker).with_rule_dump(config.dump_rules);
        if let Some(note) = spelling_note {
            engine.add_note(note);
        }
        Self {
            form_loader: FormLoader::new(config.document_types.clone()),
            workbook_loader: WorkbookLoader::new(),
            engine,
            config,
            profiling: false,
        }
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Whether the path has a form file extension (.xfdl, .xml)
    pub fn accepts_form(&self, path: &Path) -> bool {
        self.form_loader.supports_file_type(path)
    }

    /// Whether the path has a rules workbook extension (.ods)
    pub fn accepts_rules(&self, path: &Path) -> bool {
        self.workbook_loader.supports_file_type(path)
    }

    pub fn check_files(&mut self, rules_path: &Path, form_path: &Path) -> Report {
        let source_file = source_name(form_path);
        let mut profiler = StepProfiler::new(self.profiling);

        let form_bytes = match profiler.time_step(CheckStep::ReadForm, || read_input(form_path)) {
            Ok(bytes) => bytes,
            Err(e) => return abort(ReportHeader::new(&source_file, None), e),
        };
        let header = ReportHeader::new(&source_file, Some(calculate_form_hash(&form_bytes)));

        let rules_bytes = match profiler.time_step(CheckStep::ReadRules, || read_input(rules_path)) {
            Ok(bytes) => bytes,
            Err(e) => return abort(header, e),
        };

        let report = self.check_with_profiler(&rules_bytes, &form_bytes, header, &mut profiler);
        profiler.print_summary();
        report
    }

    /// Same as `check_files` for documents already in memory
    pub fn check_bytes(&mut self, rules_bytes: &[u8], form_bytes: &[u8], source_file: &str) -> Report {
        let header = ReportHeader::new(source_file, Some(calculate_form_hash(form_bytes)));
        let mut profiler = StepProfiler::new(self.profiling);
        let report = self.check_with_profiler(rules_bytes, form_bytes, header, &mut profiler);
        profiler.print_summary();
        report
    }

    fn check_with_profiler(
        &mut self,
        rules_bytes: &[u8],
        form_bytes: &[u8],
        header: ReportHeader,
        profiler: &mut StepProfiler,
    ) -> Report {
        debug!(loader = self.form_loader.name(), bytes = form_bytes.len(), "decoding form");
        let form = match profiler.time_step(CheckStep::DecodeForm, || self.form_loader.load(form_bytes)) {
            Ok(form) => form,
            Err(e) => return abort(header, e),
        };
        debug!(loader = self.workbook_loader.name(), bytes = rules_bytes.len(), "loading rules");
        let workbook =
            match profiler.time_step(CheckStep::LoadWorkbook, || self.workbook_loader.load(rules_bytes)) {
                Ok(workbook) => workbook,
                Err(e) => return abort(header, e),
            };

        let rules = profiler.time_step(CheckStep::BuildRuleSet, || {
            RuleSetLoader::new(&self.config.sheets).load(&workbook, &form.document_type)
        });
        profiler.time_step(CheckStep::RunChecks, || self.engine.run(&rules, &form, header))
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn abort(header: ReportHeader, error: LoadError) -> Report {
    warn!(source = %header.source_file, error = %error, "cannot check form");
    Report::aborted(header, error.to_string())
}

use super::catch_common::catch_common;
use super::extractor::extract_values;
use super::format_check::regex_check;
use super::ruleset::{RejectReason, RuleEntry, RuleSet};
use super::spell_check::spell_check;
use super::version_check::version_check;
use crate::config::CheckOptions;
use crate::report::{Report, ReportAccumulator, ReportHeader};
use crate::spelling::SpellChecker;
use crate::types::{CheckGroup, FormDocument, FormValues, Page};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Progress of one run. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStage {
    Init,
    LoadedRules,
    Extracted,
    CheckedVersion,
    CheckedFields,
    CheckedCheckboxes,
    CheckedPopups,
    Finalized,
}

impl RunStage {
    fn after_group(group: CheckGroup) -> RunStage {
        match group {
            CheckGroup::Fields => RunStage::CheckedFields,
            CheckGroup::Checks => RunStage::CheckedCheckboxes,
            CheckGroup::Popups => RunStage::CheckedPopups,
        }
    }
}

/// Values of one check group on one page
#[derive(Debug, Clone)]
pub struct SectionValues {
    pub group: CheckGroup,
    pub page: Page,
    pub values: FormValues,
}

/// Pull the values of every check group off both pages, groups in check order
pub fn extract_sections(form: &FormDocument) -> Vec<SectionValues> {
    let mut sections = Vec::with_capacity(CheckGroup::ALL.len() * Page::ALL.len());
    for group in CheckGroup::ALL {
        for page in Page::ALL {
            let values = extract_values(form.page(page), group.tag());
            debug!(group = group.tag(), page = page.number(), values = values.len(), "extracted");
            sections.push(SectionValues {
                group,
                page,
                values,
            });
        }
    }
    sections
}

/// Runs every check over a loaded form and rule set.
///
/// Order: version, then for fields, checks and popups, page 1 then page 2,
/// each page getting spelling, catch-list and format checks in that order.
pub struct CheckEngine {
    options: CheckOptions,
    dump_rules: bool,
    spell_checker: Box<dyn SpellChecker>,
    spelling_enabled: bool,
    notes: Vec<String>,
    stage: RunStage,
}

impl CheckEngine {
    pub fn new(options: CheckOptions, spell_checker: Box<dyn SpellChecker>) -> Self {
        Self {
            options,
            dump_rules: false,
            spell_checker,
            spelling_enabled: true,
            notes: Vec::new(),
            stage: RunStage::Init,
        }
    }

    /// In verbose runs, list the loaded rule tables in the report notes
    pub fn with_rule_dump(mut self, dump_rules: bool) -> Self {
        self.dump_rules = dump_rules;
        self
    }

    /// Note copied into every report this engine produces
    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn spelling_enabled(&self) -> bool {
        self.spelling_enabled
    }

    fn advance(&mut self, next: RunStage) {
        debug_assert!(next > self.stage, "stage {:?} after {:?}", next, self.stage);
        debug!(from = ?self.stage, to = ?next, "run stage");
        self.stage = next;
    }

    pub fn run(&mut self, rules: &RuleSet, form: &FormDocument, header: ReportHeader) -> Report {
        self.stage = RunStage::Init;
        self.spelling_enabled = true;
        let mut report = ReportAccumulator::new(self.options);
        for note in &self.notes {
            report.note(note.clone());
        }

        self.advance(RunStage::LoadedRules);
        self.note_rule_diagnostics(rules, &mut report);

        let sections = extract_sections(form);
        self.advance(RunStage::Extracted);

        version_check(&form.version, &form.document_type, &rules.versions, &mut report);
        self.advance(RunStage::CheckedVersion);

        for group in CheckGroup::ALL {
            let table = rules.table(group);
            for section in sections.iter().filter(|s| s.group == group) {
                self.check_section(&section.values, table.page(section.page), rules, &mut report);
            }
            self.advance(RunStage::after_group(group));
        }

        self.advance(RunStage::Finalized);
        let summary = report.summary();
        info!(
            document_type = %form.document_type,
            warnings = summary.warnings,
            failed_fields = summary.failed_fields,
            version_failures = summary.version_failures,
            "check finished"
        );
        report.finish(header, &form.document_type, &form.version)
    }

    /// Spelling, catch-list and format checks over one page of one group
    pub fn check_section(
        &mut self,
        values: &FormValues,
        table: &BTreeMap<String, RuleEntry>,
        rules: &RuleSet,
        report: &mut ReportAccumulator,
    ) {
        if self.spelling_enabled {
            let result = spell_check(
                values,
                table,
                &rules.overlook,
                self.spell_checker.as_mut(),
                report,
            );
            if let Err(e) = result {
                warn!(backend = self.spell_checker.name(), error = %e, "spell checker failed, skipping spelling for this run");
                report.note(format!(
                    "Spelling check stopped ({e}); remaining fields were not spell-checked"
                ));
                self.spelling_enabled = false;
            }
        }
        catch_common(values, table, &rules.catch, report);
        regex_check(values, table, report);
    }

    /// Rejected rule rows always reach the report. Header rows (no page
    /// number) and missing sheets only show in verbose runs.
    fn note_rule_diagnostics(&self, rules: &RuleSet, report: &mut ReportAccumulator) {
        let verbose = self.options.verbose;
        for rejection in &rules.rejected_rows {
            let header_row = matches!(rejection.reason, RejectReason::InvalidPage(_));
            if verbose || !header_row {
                report.note(rejection.to_string());
            }
        }
        if !verbose {
            return;
        }
        for sheet in &rules.missing_sheets {
            report.note(format!("Rule sheet \"{sheet}\" not found; nothing checked from it"));
        }
        if self.dump_rules {
            for line in rules.dump() {
                report.note(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetNames;
    use crate::error::SpellCheckError;
    use crate::preprocessors::parse_document;
    use crate::report::{CheckKind, EventKind};
    use crate::rules::loader::RuleSetLoader;
    use crate::spelling::{DictionarySpellChecker, Spelling};
    use crate::types::{Sheet, Workbook};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn rules() -> RuleSet {
        let workbook = Workbook {
            sheets: vec![
                Sheet {
                    name: "OPR Fields".to_string(),
                    rows: vec![
                        row(&["Name", "f1", "id", "[A-Z]+", "1", "N"]),
                        row(&["Duty", "DUTY", "text", "None", "2", "Y"]),
                    ],
                },
                Sheet {
                    name: "PR Version".to_string(),
                    rows: vec![row(&["OPR", "2.79.9"])],
                },
                Sheet {
                    name: "Catch".to_string(),
                    rows: vec![row(&["the the"])],
                },
            ],
        };
        RuleSetLoader::new(&SheetNames::default()).load(&workbook, "OPR")
    }

    fn form(name: &str, duty: &str, version: &str) -> FormDocument {
        let page1 = parse_document(&format!(
            r#"<page sid="PAGE1"><field sid="f1"><value>{name}</value></field>
               <field sid="unruled"><value>whatever</value></field></page>"#
        ))
        .unwrap();
        let page2 = parse_document(&format!(
            r#"<page sid="PAGE2"><field sid="DUTY"><value>{duty}</value></field></page>"#
        ))
        .unwrap();
        FormDocument {
            title: "Officer Performance Report".to_string(),
            document_type: "OPR".to_string(),
            version: version.to_string(),
            page1,
            page2,
        }
    }

    fn engine(verbose: bool) -> CheckEngine {
        let checker = DictionarySpellChecker::from_words(["led", "the", "team"], 5).unwrap();
        CheckEngine::new(CheckOptions { verbose }, Box::new(checker))
    }

    fn header() -> ReportHeader {
        ReportHeader::new("form.xfdl", None)
    }

    struct FailingChecker;

    impl SpellChecker for FailingChecker {
        fn check(&mut self, _word: &str) -> Result<Spelling, SpellCheckError> {
            Err(SpellCheckError::Unavailable("engine exited".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_clean_form_passes() {
        let mut engine = engine(false);
        let report = engine.run(&rules(), &form("ABC", "led the team", "2.79.9"), header());

        assert!(report.events().is_empty());
        assert!(report.summary().unwrap().passed());
        assert_eq!(engine.stage(), RunStage::Finalized);
    }

    #[test]
    fn test_lowercase_value_fails_format() {
        let mut engine = engine(false);
        let report = engine.run(&rules(), &form("abc", "led the team", "2.79.9"), header());

        let events = report.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Fail);
        assert_eq!(events[0].check, CheckKind::Format);
        assert_eq!(events[0].field.as_deref(), Some("f1"));
        assert_eq!(report.summary().unwrap().failed_fields, 1);
    }

    #[test]
    fn test_check_order_within_run() {
        let mut engine = engine(false);
        let report = engine.run(
            &rules(),
            &form("abc", "led teh the the team", "2.79.8"),
            header(),
        );

        let checks: Vec<_> = report.events().iter().map(|e| e.check).collect();
        assert_eq!(
            checks,
            vec![
                CheckKind::Version,
                CheckKind::Format,
                CheckKind::Spelling,
                CheckKind::CommonError,
            ]
        );
        let summary = report.summary().unwrap();
        assert_eq!(summary.warnings, 2);
        assert_eq!(summary.failed_fields, 1);
        assert_eq!(summary.version_failures, 1);
    }

    #[test]
    fn test_runs_are_idempotent() {
        let rules = rules();
        let form = form("abc", "led teh team", "2.79.8");
        let mut engine = engine(true);

        let first = engine.run(&rules, &form, header());
        let second = engine.run(&rules, &form, header());
        assert_eq!(first.events(), second.events());
        assert_eq!(first.summary(), second.summary());
    }

    #[test]
    fn test_spell_failure_disables_spelling_with_note() {
        let mut engine = CheckEngine::new(CheckOptions::default(), Box::new(FailingChecker));
        let report = engine.run(&rules(), &form("ABC", "the the", "2.79.9"), header());

        assert!(!engine.spelling_enabled());
        assert_eq!(report.notes().len(), 1);
        assert!(report.notes()[0].starts_with("Spelling check stopped"));
        // catch-list still runs on the field
        assert_eq!(report.summary().unwrap().warnings, 1);
    }

    #[test]
    fn test_verbose_rule_dump() {
        let mut engine = engine(true).with_rule_dump(true);
        let report = engine.run(&rules(), &form("ABC", "led", "2.79.9"), header());

        let notes = report.notes();
        assert!(notes.iter().any(|n| n == "Rule sheet \"OPR Checks\" not found; nothing checked from it"));
        assert!(notes.iter().any(|n| n == "Page 1 Field Dictionary"));
        assert!(notes.iter().any(|n| n.starts_with("f1 (Name, id, [A-Z]+, 1, N)")));
    }

    /// Errors on its first word, then flags every word
    struct FailsOnce {
        failed: bool,
    }

    impl SpellChecker for FailsOnce {
        fn check(&mut self, _word: &str) -> Result<Spelling, SpellCheckError> {
            if !self.failed {
                self.failed = true;
                return Err(SpellCheckError::Timeout(5));
            }
            Ok(Spelling::misspelled(Vec::new()))
        }

        fn name(&self) -> &str {
            "fails-once"
        }
    }

    #[test]
    fn test_spell_failure_is_scoped_to_its_run() {
        let rules = rules();
        let form = form("ABC", "led team", "2.79.9");
        let mut engine = CheckEngine::new(
            CheckOptions::default(),
            Box::new(FailsOnce { failed: false }),
        );

        let first = engine.run(&rules, &form, header());
        assert_eq!(first.notes().len(), 1);
        assert_eq!(first.summary().unwrap().warnings, 0);

        let second = engine.run(&rules, &form, header());
        assert!(engine.spelling_enabled());
        assert!(second.notes().is_empty());
        assert_eq!(second.summary().unwrap().warnings, 2);
    }

    #[test]
    fn test_rejected_rows_noted_without_verbose() {
        let workbook = Workbook {
            sheets: vec![
                Sheet {
                    name: "OPR Fields".to_string(),
                    rows: vec![
                        row(&["Label", "Field", "Category", "Pattern", "Page", "Spell"]),
                        row(&["Broken", "f9", "id", "[A-Z", "1", "N"]),
                    ],
                },
                Sheet {
                    name: "Catch".to_string(),
                    rows: vec![row(&["(unclosed"])],
                },
            ],
        };
        let rules = RuleSetLoader::new(&SheetNames::default()).load(&workbook, "OPR");
        let report = engine(false).run(&rules, &form("ABC", "led", "2.79.9"), header());

        let notes = report.notes();
        assert!(notes.iter().any(|n| n.starts_with("skipped row 2 of \"OPR Fields\"")));
        assert!(notes.iter().any(|n| n.starts_with("skipped row 1 of \"Catch\"")));
        // header row and missing sheets stay out of quiet reports
        assert!(!notes.iter().any(|n| n.contains("row 1 of \"OPR Fields\"")));
        assert!(!notes.iter().any(|n| n.contains("not found")));
    }

    #[test]
    fn test_two_to_three_capitals_scenario() {
        let workbook = Workbook {
            sheets: vec![Sheet {
                name: "OPR Fields".to_string(),
                rows: vec![row(&["Name", "f1", "", "^[A-Z]{2,3}$", "1", "N"])],
            }],
        };
        let rules = RuleSetLoader::new(&SheetNames::default()).load(&workbook, "OPR");

        let verbose = engine(true).run(&rules, &form("ABC", "", "2.79.9"), header());
        let formats: Vec<_> = verbose
            .events()
            .iter()
            .filter(|e| e.check == CheckKind::Format)
            .collect();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].kind, EventKind::Ok);
        assert_eq!(verbose.summary().unwrap().failed_fields, 0);

        let quiet = engine(false).run(&rules, &form("ABC", "", "2.79.9"), header());
        assert!(quiet.events().is_empty());

        let failed = engine(false).run(&rules, &form("abc", "", "2.79.9"), header());
        assert_eq!(failed.events().len(), 1);
        assert_eq!(failed.events()[0].kind, EventKind::Fail);
        assert_eq!(failed.summary().unwrap().failed_fields, 1);
    }
}

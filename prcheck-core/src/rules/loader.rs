//! Rule table loader
//!
//! Turns the sheets of a rules workbook into a typed [`RuleSet`]. Every row
//! either becomes a record or is dropped with a [`RowRejection`]; a missing
//! sheet is recorded and read as empty.

use super::ruleset::{
    CatchPattern, FieldPattern, OverlookPattern, PatternError, RejectReason, RowRejection,
    RuleEntry, RuleSet, RuleTable, SenderRater,
};
use crate::config::SheetNames;
use crate::types::{CheckGroup, Page, Sheet, Workbook};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Pattern cell value meaning "no format check"
pub const NO_PATTERN: &str = "None";

/// Spell cell value enabling spelling and catch-list checks
pub const SPELL_FLAG: &str = "Y";

const RULE_COLUMNS: usize = 6;
const SENIOR_RATER_COLUMNS: usize = 3;
const VERSION_COLUMNS: usize = 2;

pub struct RuleSetLoader<'a> {
    sheets: &'a SheetNames,
}

impl<'a> RuleSetLoader<'a> {
    pub fn new(sheets: &'a SheetNames) -> Self {
        Self { sheets }
    }

    pub fn load(&self, workbook: &Workbook, document_type: &str) -> RuleSet {
        let mut rules = RuleSet {
            document_type: document_type.to_string(),
            ..RuleSet::default()
        };

        for group in CheckGroup::ALL {
            let name = self.sheets.rule_sheet(group, document_type);
            let Some(sheet) = self.sheet(workbook, &name, &mut rules) else {
                continue;
            };
            let table = load_rule_table(sheet, &mut rules.rejected_rows);
            debug!(sheet = %name, rules = table.len(), "loaded rule sheet");
            match group {
                CheckGroup::Fields => rules.fields = table,
                CheckGroup::Checks => rules.checks = table,
                CheckGroup::Popups => rules.popups = table,
            }
        }

        if let Some(sheet) = self.sheet(workbook, &self.sheets.senior_raters, &mut rules) {
            rules.sender_raters = load_sender_raters(sheet, &mut rules.rejected_rows);
        }
        if let Some(sheet) = self.sheet(workbook, &self.sheets.versions, &mut rules) {
            rules.versions = load_versions(sheet, &mut rules.rejected_rows);
        }
        if let Some(sheet) = self.sheet(workbook, &self.sheets.overlook, &mut rules) {
            rules.overlook = compile_cells(sheet, OverlookPattern::new, &mut rules.rejected_rows);
        }
        if let Some(sheet) = self.sheet(workbook, &self.sheets.catch, &mut rules) {
            rules.catch = compile_cells(sheet, CatchPattern::new, &mut rules.rejected_rows);
        }

        debug!(
            document_type,
            fields = rules.fields.len(),
            checks = rules.checks.len(),
            popups = rules.popups.len(),
            overlook = rules.overlook.len(),
            catch = rules.catch.len(),
            rejected = rules.rejected_rows.len(),
            "rule set ready"
        );
        rules
    }

    fn sheet<'w>(&self, workbook: &'w Workbook, name: &str, rules: &mut RuleSet) -> Option<&'w Sheet> {
        let sheet = workbook.sheet(name);
        if sheet.is_none() {
            warn!(sheet = name, "rule sheet missing, treating as empty");
            rules.missing_sheets.push(name.to_string());
        }
        sheet
    }
}

fn reject(sheet: &Sheet, index: usize, reason: RejectReason, rejected: &mut Vec<RowRejection>) {
    let rejection = RowRejection {
        sheet: sheet.name.clone(),
        row: index + 1,
        reason,
    };
    // Header rows land here as invalid pages on every run
    match rejection.reason {
        RejectReason::InvalidPage(_) => debug!("{rejection}"),
        _ => warn!("{rejection}"),
    }
    rejected.push(rejection);
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Map one `[label, key, category, pattern, page, spell]` row
pub fn rule_entry_from_row(row: &[String]) -> Result<RuleEntry, RejectReason> {
    if row.len() < RULE_COLUMNS {
        return Err(RejectReason::TooFewColumns {
            found: row.len(),
            needed: RULE_COLUMNS,
        });
    }
    let key = row[1].trim();
    if key.is_empty() {
        return Err(RejectReason::EmptyKey);
    }
    let page = Page::from_cell(row[4].trim())
        .ok_or_else(|| RejectReason::InvalidPage(row[4].clone()))?;
    let pattern = match row[3].as_str() {
        NO_PATTERN => None,
        source => Some(FieldPattern::new(source).map_err(|e| RejectReason::InvalidPattern {
            pattern: source.to_string(),
            error: e.to_string(),
        })?),
    };

    Ok(RuleEntry {
        label: row[0].clone(),
        key: key.to_string(),
        category: row[2].clone(),
        pattern,
        page,
        spell_check: row[5].trim() == SPELL_FLAG,
    })
}

fn load_rule_table(sheet: &Sheet, rejected: &mut Vec<RowRejection>) -> RuleTable {
    let mut table = RuleTable::default();
    for (index, row) in sheet.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        match rule_entry_from_row(row) {
            Ok(entry) => table.insert(entry),
            Err(reason) => reject(sheet, index, reason, rejected),
        }
    }
    table
}

/// `[rank, identifier, name]` rows
fn load_sender_raters(
    sheet: &Sheet,
    rejected: &mut Vec<RowRejection>,
) -> BTreeMap<String, SenderRater> {
    let mut raters = BTreeMap::new();
    for (index, row) in sheet.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        if row.len() < SENIOR_RATER_COLUMNS {
            let reason = RejectReason::TooFewColumns {
                found: row.len(),
                needed: SENIOR_RATER_COLUMNS,
            };
            reject(sheet, index, reason, rejected);
            continue;
        }
        let id = row[1].trim();
        if id.is_empty() {
            reject(sheet, index, RejectReason::EmptyKey, rejected);
            continue;
        }
        raters.insert(
            id.to_string(),
            SenderRater {
                rank: row[0].clone(),
                name: row[2].clone(),
            },
        );
    }
    raters
}

/// `[document type, version]` rows
fn load_versions(
    sheet: &Sheet,
    rejected: &mut Vec<RowRejection>,
) -> BTreeMap<String, String> {
    let mut versions = BTreeMap::new();
    for (index, row) in sheet.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        if row.len() < VERSION_COLUMNS {
            let reason = RejectReason::TooFewColumns {
                found: row.len(),
                needed: VERSION_COLUMNS,
            };
            reject(sheet, index, reason, rejected);
            continue;
        }
        let doc_type = row[0].trim();
        if doc_type.is_empty() {
            reject(sheet, index, RejectReason::EmptyKey, rejected);
            continue;
        }
        versions.insert(doc_type.to_string(), row[1].trim().to_string());
    }
    versions
}

/// Every non-empty cell of a list sheet, compiled in document order
fn compile_cells<T>(
    sheet: &Sheet,
    compile: impl Fn(&str) -> Result<T, PatternError>,
    rejected: &mut Vec<RowRejection>,
) -> Vec<T> {
    let mut compiled = Vec::new();
    for (index, row) in sheet.rows.iter().enumerate() {
        for cell in row.iter().filter(|cell| !cell.is_empty()) {
            match compile(cell) {
                Ok(pattern) => compiled.push(pattern),
                Err(e) => {
                    let reason = RejectReason::InvalidPattern {
                        pattern: cell.clone(),
                        error: e.to_string(),
                    };
                    reject(sheet, index, reason, rejected);
                }
            }
        }
    }
    compiled
}

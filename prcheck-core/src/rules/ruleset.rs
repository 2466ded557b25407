use crate::types::{CheckGroup, Page};
use fancy_regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Compile or match failure of a workbook pattern. Matching can fail at run
/// time when backtracking exceeds the engine's limit.
pub type PatternError = fancy_regex::Error;

/// Rewrite the end anchors of a workbook pattern: `$` also matches before a
/// single trailing newline and `\Z` means the very end, as the workbook's
/// authors expect.
pub fn workbook_dialect(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('Z') => out.push_str(r"\z"),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '[' => copy_class(&mut chars, &mut out),
            '$' => out.push_str(r"(?=\n?\z)"),
            _ => out.push(c),
        }
    }
    out
}

/// Copy a character class verbatim; the opening `[` is already consumed.
/// A `]` right after `[` or `[^` is a literal.
fn copy_class(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    out.push('[');
    if chars.peek() == Some(&'^') {
        chars.next();
        out.push('^');
    }
    if chars.peek() == Some(&']') {
        chars.next();
        out.push_str(r"\]");
    }
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            ']' => return,
            _ => {}
        }
    }
}

/// Format pattern of a field rule, matched at the start of the value only
#[derive(Debug, Clone)]
pub struct FieldPattern {
    source: String,
    anchored: Regex,
}

impl FieldPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            source: source.to_string(),
            anchored: Regex::new(&format!(r"\A(?:{})", workbook_dialect(source)))?,
        })
    }

    /// Text matched from position 0, if the pattern matches there
    pub fn match_prefix<'t>(&self, text: &'t str) -> Result<Option<&'t str>, PatternError> {
        Ok(self.anchored.find(text)?.map(|m| m.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Catch-list pattern, searched anywhere in a line
#[derive(Debug, Clone)]
pub struct CatchPattern {
    source: String,
    regex: Regex,
}

impl CatchPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(&workbook_dialect(source))?,
        })
    }

    pub fn find<'t>(&self, line: &'t str) -> Result<Option<&'t str>, PatternError> {
        Ok(self.regex.find(line)?.map(|m| m.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Overlook-list pattern: case-insensitive, anchored at the token start
#[derive(Debug, Clone)]
pub struct OverlookPattern {
    source: String,
    anchored: Regex,
}

impl OverlookPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        Ok(Self {
            source: source.to_string(),
            anchored: Regex::new(&format!(r"(?i)\A(?:{})", workbook_dialect(source)))?,
        })
    }

    pub fn matches(&self, token: &str) -> Result<bool, PatternError> {
        self.anchored.is_match(token)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Report note for a pattern that failed while matching a field
pub fn unevaluated_note(pattern: &str, key: &str, error: &PatternError) -> String {
    format!("Pattern \"{pattern}\" could not be checked against {key}: {error}")
}

/// One row of a Fields/Checks/Popups sheet
#[derive(Debug, Clone)]
pub struct RuleEntry {
    pub label: String,
    pub key: String,
    pub category: String,
    /// `None` for the "None" sentinel: no format check
    pub pattern: Option<FieldPattern>,
    pub page: Page,
    pub spell_check: bool,
}

/// Rules of one sheet, split by page and keyed by field identifier
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    page1: BTreeMap<String, RuleEntry>,
    page2: BTreeMap<String, RuleEntry>,
}

impl RuleTable {
    /// A later entry for the same key replaces the earlier one
    pub fn insert(&mut self, entry: RuleEntry) {
        let page = match entry.page {
            Page::One => &mut self.page1,
            Page::Two => &mut self.page2,
        };
        page.insert(entry.key.clone(), entry);
    }

    pub fn page(&self, page: Page) -> &BTreeMap<String, RuleEntry> {
        match page {
            Page::One => &self.page1,
            Page::Two => &self.page2,
        }
    }

    pub fn len(&self) -> usize {
        self.page1.len() + self.page2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderRater {
    pub rank: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    TooFewColumns { found: usize, needed: usize },
    EmptyKey,
    InvalidPage(String),
    InvalidPattern { pattern: String, error: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooFewColumns { found, needed } => {
                write!(f, "{found} column(s), need {needed}")
            }
            RejectReason::EmptyKey => write!(f, "empty field key"),
            RejectReason::InvalidPage(page) => write!(f, "page \"{page}\" is not 1 or 2"),
            RejectReason::InvalidPattern { pattern, error } => {
                write!(f, "pattern \"{pattern}\" does not compile: {error}")
            }
        }
    }
}

/// A sheet row dropped while loading, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub sheet: String,
    /// 1-based row position in the sheet
    pub row: usize,
    pub reason: RejectReason,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped row {} of \"{}\": {}", self.row, self.sheet, self.reason)
    }
}

/// Every rule table for one run. Built once by the loader, read-only after.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub document_type: String,
    pub fields: RuleTable,
    pub checks: RuleTable,
    pub popups: RuleTable,
    /// Document type → required form version
    pub versions: BTreeMap<String, String>,
    pub sender_raters: BTreeMap<String, SenderRater>,
    pub overlook: Vec<OverlookPattern>,
    pub catch: Vec<CatchPattern>,
    pub missing_sheets: Vec<String>,
    pub rejected_rows: Vec<RowRejection>,
}

impl RuleSet {
    pub fn table(&self, group: CheckGroup) -> &RuleTable {
        match group {
            CheckGroup::Fields => &self.fields,
            CheckGroup::Checks => &self.checks,
            CheckGroup::Popups => &self.popups,
        }
    }

    /// Human-readable listing of the loaded tables for verbose reports
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (group, title) in [
            (CheckGroup::Fields, "Field"),
            (CheckGroup::Checks, "Check Box"),
            (CheckGroup::Popups, "Popups"),
        ] {
            for page in Page::ALL {
                let entries = self.table(group).page(page);
                if entries.is_empty() {
                    continue;
                }
                lines.push(format!("Page {} {title} Dictionary", page.number()));
                for (key, entry) in entries {
                    lines.push(format!(
                        "{key} ({}, {}, {}, {}, {})",
                        entry.label,
                        entry.category,
                        entry.pattern.as_ref().map(FieldPattern::as_str).unwrap_or("None"),
                        page.number(),
                        if entry.spell_check { "Y" } else { "N" }
                    ));
                }
            }
        }
        if !self.sender_raters.is_empty() {
            lines.push("Senior Rater Info".to_string());
            for (id, rater) in &self.sender_raters {
                lines.push(format!("{id} ({}, {})", rater.rank, rater.name));
            }
        }
        if !self.versions.is_empty() {
            lines.push("Version Information".to_string());
            for (doc_type, version) in &self.versions {
                lines.push(format!("{doc_type} {version}"));
            }
        }
        let overlook: Vec<_> = self.overlook.iter().map(OverlookPattern::as_str).collect();
        lines.push(format!("Overlook: {overlook:?}"));
        let catch: Vec<_> = self.catch.iter().map(CatchPattern::as_str).collect();
        lines.push(format!("Catch: {catch:?}"));
        lines
    }
}

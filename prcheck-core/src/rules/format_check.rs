use super::ruleset::{unevaluated_note, RuleEntry};
use crate::report::{CheckKind, EventDetail, EventKind, ReportAccumulator, ReportEvent};
use crate::types::FormValues;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Match every ruled value against its format pattern, prefix semantics.
///
/// Keys without a rule, and rules with no pattern, are skipped.
pub fn regex_check(
    values: &FormValues,
    rules: &BTreeMap<String, RuleEntry>,
    report: &mut ReportAccumulator,
) {
    for (key, value) in values.iter() {
        let Some(rule) = rules.get(key) else {
            continue;
        };
        let Some(pattern) = &rule.pattern else {
            continue;
        };

        let matched = pattern.match_prefix(value).unwrap_or_else(|e| {
            report.note(unevaluated_note(pattern.as_str(), key, &e));
            None
        });
        let (kind, detail) = match matched {
            Some(matched) => (
                EventKind::Ok,
                EventDetail::Matched {
                    text: matched.to_string(),
                },
            ),
            None => (
                EventKind::Fail,
                EventDetail::Value {
                    escaped: escape_value(value),
                },
            ),
        };
        report.record(ReportEvent {
            kind,
            check: CheckKind::Format,
            label: rule.label.clone(),
            field: Some(key.to_string()),
            line: None,
            detail,
        });
    }
}

/// Field text on one line: common escapes, other control and non-ASCII
/// characters as `\u{..}`
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\\' => escaped.push_str("\\\\"),
            c if c.is_ascii() && !c.is_ascii_control() => escaped.push(c),
            c => {
                let _ = write!(escaped, "\\u{{{:x}}}", c as u32);
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckOptions;
    use crate::rules::ruleset::FieldPattern;
    use crate::types::Page;

    fn rules(entries: &[(&str, Option<&str>)]) -> BTreeMap<String, RuleEntry> {
        entries
            .iter()
            .map(|(key, pattern)| {
                let entry = RuleEntry {
                    label: format!("Label {key}"),
                    key: key.to_string(),
                    category: "text".to_string(),
                    pattern: pattern.map(|p| FieldPattern::new(p).unwrap()),
                    page: Page::One,
                    spell_check: false,
                };
                (key.to_string(), entry)
            })
            .collect()
    }

    fn verbose() -> ReportAccumulator {
        ReportAccumulator::new(CheckOptions { verbose: true })
    }

    #[test]
    fn test_none_pattern_never_emits() {
        let values: FormValues = [("f1", "anything at all")].into_iter().collect();
        let mut report = verbose();
        regex_check(&values, &rules(&[("f1", None)]), &mut report);
        assert!(report.events().is_empty());
    }

    #[test]
    fn test_none_pattern_skips_empty_value() {
        let values: FormValues = [("f1", "")].into_iter().collect();
        let mut report = verbose();
        regex_check(&values, &rules(&[("f1", None)]), &mut report);
        assert!(report.events().is_empty());
        assert_eq!(report.summary().failed_fields, 0);
    }

    #[test]
    fn test_anchored_pattern_accepts_one_trailing_newline() {
        let table = rules(&[("f1", Some("^[A-Z]{2,3}$"))]);
        let mut report = ReportAccumulator::new(CheckOptions::default());
        regex_check(&[("f1", "ABC\n")].into_iter().collect(), &table, &mut report);
        assert!(report.events().is_empty());
        regex_check(&[("f1", "ABCD")].into_iter().collect(), &table, &mut report);
        assert_eq!(report.summary().failed_fields, 1);
    }

    #[test]
    fn test_unruled_keys_are_skipped() {
        let values: FormValues = [("other", "zzz")].into_iter().collect();
        let mut report = verbose();
        regex_check(&values, &rules(&[("f1", Some("[A-Z]+"))]), &mut report);
        assert!(report.events().is_empty());
        assert_eq!(report.summary().failed_fields, 0);
    }

    #[test]
    fn test_start_anchoring() {
        let table = rules(&[("a", Some("ABC")), ("b", Some("ABC"))]);
        let values: FormValues = [("a", "ABC123"), ("b", "XABC123")].into_iter().collect();
        let mut report = verbose();
        regex_check(&values, &table, &mut report);

        let events = report.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Ok);
        assert_eq!(
            events[0].detail,
            EventDetail::Matched {
                text: "ABC".to_string()
            }
        );
        assert_eq!(events[1].kind, EventKind::Fail);
        assert_eq!(events[1].field.as_deref(), Some("b"));
        assert_eq!(report.summary().failed_fields, 1);
    }

    #[test]
    fn test_quiet_run_keeps_only_failures() {
        let table = rules(&[("f1", Some("[A-Z]+"))]);
        let mut report = ReportAccumulator::new(CheckOptions::default());
        regex_check(&[("f1", "ABC")].into_iter().collect(), &table, &mut report);
        assert!(report.events().is_empty());
        regex_check(&[("f1", "abc")].into_iter().collect(), &table, &mut report);
        assert_eq!(report.events().len(), 1);
        assert_eq!(report.summary().failed_fields, 1);
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("a\nb\tc\\"), "a\\nb\\tc\\\\");
        assert_eq!(escape_value("caf\u{e9}"), "caf\\u{e9}");
        assert_eq!(escape_value("\u{1}"), "\\u{1}");
    }
}

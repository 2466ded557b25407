use super::extractor::split_lines;
use super::ruleset::{unevaluated_note, CatchPattern, RuleEntry};
use crate::report::{CheckKind, EventDetail, EventKind, ReportAccumulator, ReportEvent};
use crate::types::FormValues;
use std::collections::BTreeMap;

/// Search every line of each spell-checked field for every catch pattern.
///
/// One WARNING per (line, matching pattern); verbose runs also get an OK per
/// pattern that found nothing on a line.
pub fn catch_common(
    values: &FormValues,
    rules: &BTreeMap<String, RuleEntry>,
    catch: &[CatchPattern],
    report: &mut ReportAccumulator,
) {
    if catch.is_empty() {
        return;
    }
    for (key, value) in values.iter() {
        let Some(rule) = rules.get(key) else {
            continue;
        };
        if !rule.spell_check {
            continue;
        }
        for (index, line) in split_lines(value).into_iter().enumerate() {
            for pattern in catch {
                let matched = pattern
                    .find(line)
                    .unwrap_or_else(|e| {
                        report.note(unevaluated_note(pattern.as_str(), key, &e));
                        None
                    })
                    .map(str::to_string);
                let kind = if matched.is_some() {
                    EventKind::Warning
                } else {
                    EventKind::Ok
                };
                report.record(ReportEvent {
                    kind,
                    check: CheckKind::CommonError,
                    label: rule.label.clone(),
                    field: Some(key.to_string()),
                    line: Some(index + 1),
                    detail: EventDetail::CatchPhrase {
                        pattern: pattern.as_str().to_string(),
                        matched,
                    },
                });
            }
        }
    }
}

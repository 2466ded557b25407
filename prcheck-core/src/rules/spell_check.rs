use super::extractor::split_lines;
use super::ruleset::{unevaluated_note, OverlookPattern, RuleEntry};
use crate::error::SpellCheckError;
use crate::report::{CheckKind, EventDetail, EventKind, ReportAccumulator, ReportEvent};
use crate::spelling::SpellChecker;
use crate::types::FormValues;
use std::collections::BTreeMap;

/// Words of one line: `-` and `/` separate words like whitespace
pub fn tokenize(line: &str) -> Vec<String> {
    line.replace(['-', '/'], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Spell-check every line of each field whose rule has the spell flag.
///
/// A misspelled token that matches no overlook pattern is a WARNING.
/// Stops at the first checker error; events recorded before it stay.
pub fn spell_check(
    values: &FormValues,
    rules: &BTreeMap<String, RuleEntry>,
    overlook: &[OverlookPattern],
    checker: &mut dyn SpellChecker,
    report: &mut ReportAccumulator,
) -> Result<(), SpellCheckError> {
    for (key, value) in values.iter() {
        let Some(rule) = rules.get(key) else {
            continue;
        };
        if !rule.spell_check {
            continue;
        }
        for (index, line) in split_lines(value).into_iter().enumerate() {
            for token in tokenize(line) {
                let spelling = checker.check(&token)?;
                let overlooked = !spelling.correct
                    && overlook.iter().any(|p| {
                        p.matches(&token).unwrap_or_else(|e| {
                            report.note(unevaluated_note(p.as_str(), key, &e));
                            false
                        })
                    });
                let kind = if spelling.correct || overlooked {
                    EventKind::Ok
                } else {
                    EventKind::Warning
                };
                report.record(ReportEvent {
                    kind,
                    check: CheckKind::Spelling,
                    label: rule.label.clone(),
                    field: Some(key.to_string()),
                    line: Some(index + 1),
                    detail: EventDetail::Spelling {
                        token,
                        suggestions: spelling.suggestions,
                        overlooked,
                    },
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckOptions;
    use crate::spelling::{DictionarySpellChecker, Spelling};
    use crate::types::Page;

    fn duty() -> BTreeMap<String, RuleEntry> {
        let entry = RuleEntry {
            label: "Duty".to_string(),
            key: "DUTY".to_string(),
            category: "text".to_string(),
            pattern: None,
            page: Page::Two,
            spell_check: true,
        };
        BTreeMap::from([("DUTY".to_string(), entry)])
    }

    fn dictionary() -> DictionarySpellChecker {
        DictionarySpellChecker::from_words(["led", "the", "team", "flight", "ops"], 5).unwrap()
    }

    struct FailingChecker;

    impl SpellChecker for FailingChecker {
        fn check(&mut self, _word: &str) -> Result<Spelling, SpellCheckError> {
            Err(SpellCheckError::Timeout(10))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_tokenize_splits_on_dash_and_slash() {
        assert_eq!(tokenize("flight-ops/team  led"), vec!["flight", "ops", "team", "led"]);
    }

    #[test]
    fn test_misspelling_warns_with_line_number() {
        let values: FormValues = [("DUTY", "led the team\nled teh flight")].into_iter().collect();
        let mut report = ReportAccumulator::new(CheckOptions::default());
        spell_check(&values, &duty(), &[], &mut dictionary(), &mut report).unwrap();

        let events = report.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Warning);
        assert_eq!(events[0].line, Some(2));
        assert!(matches!(
            &events[0].detail,
            EventDetail::Spelling { token, suggestions, .. }
                if token == "teh" && suggestions.contains(&"the".to_string())
        ));
    }

    #[test]
    fn test_overlook_is_case_insensitive_prefix_match() {
        let overlook = vec![OverlookPattern::new("teh").unwrap()];
        let values: FormValues = [("DUTY", "Teh ateh")].into_iter().collect();
        let mut report = ReportAccumulator::new(CheckOptions { verbose: true });
        spell_check(&values, &duty(), &overlook, &mut dictionary(), &mut report).unwrap();

        let events = report.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Ok);
        assert!(matches!(events[0].detail, EventDetail::Spelling { overlooked: true, .. }));
        assert_eq!(events[1].kind, EventKind::Warning);
        assert_eq!(report.summary().warnings, 1);
    }

    #[test]
    fn test_checker_error_is_returned() {
        let values: FormValues = [("DUTY", "anything")].into_iter().collect();
        let mut report = ReportAccumulator::new(CheckOptions::default());
        let err = spell_check(&values, &duty(), &[], &mut FailingChecker, &mut report).unwrap_err();
        assert!(matches!(err, SpellCheckError::Timeout(10)));
        assert!(report.events().is_empty());
    }
}

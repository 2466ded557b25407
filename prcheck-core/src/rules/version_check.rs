use crate::report::{CheckKind, EventDetail, EventKind, ReportAccumulator, ReportEvent};
use std::collections::BTreeMap;

pub const VERSION_LABEL: &str = "Version Check";

/// Compare the declared form version with the one required for its type.
///
/// Exact string equality. A type with no required version gets a note and no
/// event.
pub fn version_check(
    declared: &str,
    document_type: &str,
    versions: &BTreeMap<String, String>,
    report: &mut ReportAccumulator,
) {
    let Some(expected) = versions.get(document_type) else {
        report.note(format!(
            "No required version listed for {document_type}; version not checked"
        ));
        return;
    };

    let kind = if expected == declared {
        EventKind::Ok
    } else {
        EventKind::Fail
    };
    report.record(ReportEvent {
        kind,
        check: CheckKind::Version,
        label: VERSION_LABEL.to_string(),
        field: None,
        line: None,
        detail: EventDetail::Version {
            expected: expected.clone(),
            actual: declared.to_string(),
        },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckOptions;

    fn versions() -> BTreeMap<String, String> {
        BTreeMap::from([("OPR".to_string(), "2.79.9".to_string())])
    }

    #[test]
    fn test_mismatch_fails_with_both_versions() {
        let mut report = ReportAccumulator::new(CheckOptions::default());
        version_check("2.79.8", "OPR", &versions(), &mut report);

        let events = report.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Fail);
        assert_eq!(
            events[0].detail,
            EventDetail::Version {
                expected: "2.79.9".to_string(),
                actual: "2.79.8".to_string(),
            }
        );
        assert_eq!(report.summary().version_failures, 1);
        assert_eq!(report.summary().failed_fields, 0);
    }

    #[test]
    fn test_match_is_ok_in_verbose_only() {
        let mut quiet = ReportAccumulator::new(CheckOptions::default());
        version_check("2.79.9", "OPR", &versions(), &mut quiet);
        assert!(quiet.events().is_empty());

        let mut verbose = ReportAccumulator::new(CheckOptions { verbose: true });
        version_check("2.79.9", "OPR", &versions(), &mut verbose);
        assert_eq!(verbose.events()[0].kind, EventKind::Ok);
    }

    #[test]
    fn test_unlisted_type_adds_note() {
        let mut report = ReportAccumulator::new(CheckOptions::default());
        version_check("1.0", "EPR", &versions(), &mut report);
        assert!(report.events().is_empty());
        assert_eq!(report.notes().len(), 1);
    }
}

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{canonicalize_unit, PatternCatalog};
use crate::models::{Confidence, PipelineWarning, RawMatch, TestResult};

/// Western grouping: 1,234 / 250,000.5
static RE_GROUPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:,\d{3})+(?:\.\d+)?$").unwrap());
/// Indian grouping: 2,50,000 / 1,20,50,000
static RE_GROUPED_INDIAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}(?:,\d{2})*,\d{3}(?:\.\d+)?$").unwrap());

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// One result per test key, ordered by position.
    pub results: Vec<TestResult>,
    pub warnings: Vec<PipelineWarning>,
}

/// Parse a captured numeric token.
/// Handles: "13.2", "250,000", "2,50,000", "10,5" (decimal comma).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned = if RE_GROUPED.is_match(raw) || RE_GROUPED_INDIAN.is_match(raw) {
        raw.replace(',', "")
    } else if raw.matches(',').count() == 1 && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Turn raw matches into typed results.
///
/// Unparsable values and unknown units drop their match with a warning.
/// When a test appears more than once, the match with the greatest
/// position wins.
pub fn normalize(matches: &[RawMatch], catalog: &PatternCatalog) -> NormalizeOutcome {
    let mut warnings = Vec::new();
    let mut latest: HashMap<&str, TestResult> = HashMap::new();

    for m in matches {
        let Some(rule) = catalog.rule(&m.test_key) else {
            warnings.push(PipelineWarning::UnknownTestKey {
                test_key: m.test_key.clone(),
                position: m.position,
            });
            continue;
        };

        let Some(value) = parse_decimal(&m.raw_value_text) else {
            tracing::debug!(test_key = %m.test_key, raw = %m.raw_value_text, "Unparsable value");
            warnings.push(PipelineWarning::UnparsableValue {
                test_key: m.test_key.clone(),
                raw_value: m.raw_value_text.clone(),
                position: m.position,
            });
            continue;
        };

        let (unit, confidence) = match m.raw_unit_text.as_deref() {
            Some(raw_unit) => match canonicalize_unit(raw_unit) {
                Some(canonical) => (Some(canonical.to_string()), Confidence::Exact),
                None => {
                    warnings.push(PipelineWarning::UnknownUnit {
                        test_key: m.test_key.clone(),
                        raw_unit: raw_unit.to_string(),
                        position: m.position,
                    });
                    continue;
                }
            },
            None => match &rule.expected_unit {
                Some(expected) => (Some(expected.clone()), Confidence::Inferred),
                None => (None, Confidence::Exact),
            },
        };

        let candidate = TestResult {
            test_key: m.test_key.clone(),
            value,
            unit,
            confidence,
            position: m.position,
        };

        match latest.entry(m.test_key.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let (kept, dropped) = if candidate.position >= existing.position {
                    (candidate, existing.clone())
                } else {
                    (existing.clone(), candidate)
                };
                if kept.value != dropped.value || kept.unit != dropped.unit {
                    warnings.push(PipelineWarning::ConflictingDuplicate {
                        test_key: kept.test_key.clone(),
                        kept_value: kept.value,
                        kept_position: kept.position,
                        dropped_value: dropped.value,
                        dropped_position: dropped.position,
                    });
                }
                *existing = kept;
            }
        }
    }

    let mut results: Vec<TestResult> = latest.into_values().collect();
    results.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.test_key.cmp(&b.test_key))
    });

    for result in &results {
        let Some(rule) = catalog.rule(&result.test_key) else {
            continue;
        };
        let Some((min, max)) = rule.plausible_range else {
            continue;
        };
        // The range is expressed in the expected unit.
        if result.unit != rule.expected_unit {
            continue;
        }
        if result.value < min || result.value > max {
            tracing::warn!(test_key = %result.test_key, value = result.value, "Implausible value");
            warnings.push(PipelineWarning::ImplausibleValue {
                test_key: result.test_key.clone(),
                value: result.value,
                min,
                max,
            });
        }
    }

    NormalizeOutcome { results, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PatternRule;

    fn make_rule(key: &str, unit: Option<&str>, plausible: Option<(f64, f64)>) -> PatternRule {
        PatternRule {
            test_key: key.into(),
            display_name: key.into(),
            category: "Test".into(),
            aliases: vec![key.to_uppercase()],
            expected_unit: unit.map(String::from),
            window: None,
            plausible_range: plausible,
        }
    }

    fn catalog() -> PatternCatalog {
        PatternCatalog::new(vec![
            make_rule("hemoglobin", Some("g/dL"), Some((1.0, 25.0))),
            make_rule("tsh", Some("mIU/L"), None),
            make_rule("ratio", None, None),
            make_rule("platelets", Some("/µL"), None),
        ])
        .unwrap()
    }

    fn raw(key: &str, value: &str, unit: Option<&str>, position: usize) -> RawMatch {
        RawMatch {
            test_key: key.into(),
            raw_value_text: value.into(),
            raw_unit_text: unit.map(String::from),
            position,
        }
    }

    #[test]
    fn parse_decimal_formats() {
        assert_eq!(parse_decimal("13.2"), Some(13.2));
        assert_eq!(parse_decimal("250,000"), Some(250_000.0));
        assert_eq!(parse_decimal("2,50,000"), Some(250_000.0));
        assert_eq!(parse_decimal("1,234.5"), Some(1234.5));
        assert_eq!(parse_decimal("10,5"), Some(10.5));
        assert_eq!(parse_decimal("7"), Some(7.0));
        assert_eq!(parse_decimal("1.2.3"), None);
        assert_eq!(parse_decimal("12.03.2024"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn explicit_unit_is_canonicalized() {
        let out = normalize(&[raw("hemoglobin", "13.2", Some("gm/dl"), 0)], &catalog());
        let r = &out.results[0];
        assert_eq!(r.value, 13.2);
        assert_eq!(r.unit.as_deref(), Some("g/dL"));
        assert_eq!(r.confidence, Confidence::Exact);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn missing_unit_defaults_to_expected() {
        let out = normalize(&[raw("tsh", "2.5", None, 0)], &catalog());
        assert_eq!(out.results[0].unit.as_deref(), Some("mIU/L"));
        assert_eq!(out.results[0].confidence, Confidence::Inferred);
    }

    #[test]
    fn unitless_test_stays_unitless() {
        let out = normalize(&[raw("ratio", "4.1", None, 0)], &catalog());
        assert_eq!(out.results[0].unit, None);
        assert_eq!(out.results[0].confidence, Confidence::Exact);
    }

    #[test]
    fn latest_position_wins() {
        let out = normalize(
            &[
                raw("hemoglobin", "11.0", Some("g/dL"), 200),
                raw("hemoglobin", "12.5", Some("g/dL"), 10),
            ],
            &catalog(),
        );
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].value, 11.0);
        assert_eq!(out.results[0].position, 200);
        assert!(matches!(
            &out.warnings[0],
            PipelineWarning::ConflictingDuplicate { kept_position: 200, dropped_position: 10, .. }
        ));
    }

    #[test]
    fn identical_duplicates_are_silent() {
        let out = normalize(
            &[raw("tsh", "2.5", None, 10), raw("tsh", "2.5", None, 90)],
            &catalog(),
        );
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].position, 90);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn parse_failures_drop_only_their_match() {
        let out = normalize(
            &[
                raw("hemoglobin", "1.2.3", None, 0),
                raw("tsh", "2.5", Some("furlongs"), 20),
                raw("ratio", "3.9", None, 40),
                raw("mystery", "1", None, 60),
            ],
            &catalog(),
        );
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].test_key, "ratio");
        assert_eq!(out.warnings.len(), 3);
        assert_eq!(out.warnings.iter().filter(|w| w.is_parse_failure()).count(), 2);
    }

    #[test]
    fn failed_later_match_does_not_displace_earlier() {
        let out = normalize(
            &[raw("tsh", "2.5", None, 10), raw("tsh", "n/a", None, 90)],
            &catalog(),
        );
        assert_eq!(out.results[0].value, 2.5);
    }

    #[test]
    fn implausible_values_are_kept_with_warning() {
        let out = normalize(&[raw("hemoglobin", "132", Some("g/dL"), 0)], &catalog());
        assert_eq!(out.results.len(), 1);
        assert!(matches!(
            out.warnings[0],
            PipelineWarning::ImplausibleValue { min, max, .. } if min == 1.0 && max == 25.0
        ));

        // Different unit: the plausible range does not apply.
        let out = normalize(&[raw("hemoglobin", "132", Some("g/L"), 0)], &catalog());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn results_ordered_by_position() {
        let out = normalize(
            &[
                raw("tsh", "2.5", None, 50),
                raw("hemoglobin", "13", None, 5),
                raw("platelets", "2,50,000", Some("/cumm"), 30),
            ],
            &catalog(),
        );
        let keys: Vec<_> = out.results.iter().map(|r| r.test_key.as_str()).collect();
        assert_eq!(keys, vec!["hemoglobin", "platelets", "tsh"]);
        assert_eq!(out.results[1].value, 250_000.0);
        assert_eq!(out.results[1].unit.as_deref(), Some("/µL"));
    }
}

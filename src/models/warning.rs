use serde::{Deserialize, Serialize};

/// A per-report anomaly. These never abort the pipeline; they are carried
/// on the `Report` so the caller can surface them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// A label was found but the adjacent number was part of a date,
    /// time or identifier.
    RejectedValue {
        test_key: String,
        raw_text: String,
        position: usize,
    },
    /// The captured value could not be parsed as a decimal number.
    UnparsableValue {
        test_key: String,
        raw_value: String,
        position: usize,
    },
    /// The captured unit is not in the unit-alias table.
    UnknownUnit {
        test_key: String,
        raw_unit: String,
        position: usize,
    },
    /// A match referenced a test key the catalog does not define.
    UnknownTestKey { test_key: String, position: usize },
    /// The same test appeared more than once with different values;
    /// the latest occurrence was kept.
    ConflictingDuplicate {
        test_key: String,
        kept_value: f64,
        kept_position: usize,
        dropped_value: f64,
        dropped_position: usize,
    },
    /// Value outside the physiologically plausible range for the test.
    ImplausibleValue {
        test_key: String,
        value: f64,
        min: f64,
        max: f64,
    },
    ResultsCapped { found: usize, kept: usize },
}

impl PipelineWarning {
    /// Parse failures drop the match; every other warning is advisory.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::UnparsableValue { .. } | Self::UnknownUnit { .. }
        )
    }
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RejectedValue {
                test_key,
                raw_text,
                position,
            } => write!(
                f,
                "'{test_key}' at {position}: '{raw_text}' looks like a date or identifier, ignored"
            ),
            Self::UnparsableValue {
                test_key,
                raw_value,
                position,
            } => write!(f, "'{test_key}' at {position}: value '{raw_value}' is not a number"),
            Self::UnknownUnit {
                test_key,
                raw_unit,
                position,
            } => write!(f, "'{test_key}' at {position}: unknown unit '{raw_unit}'"),
            Self::UnknownTestKey { test_key, position } => {
                write!(f, "'{test_key}' at {position}: no such test in catalog")
            }
            Self::ConflictingDuplicate {
                test_key,
                kept_value,
                kept_position,
                dropped_value,
                dropped_position,
            } => write!(
                f,
                "'{test_key}' reported twice: kept {kept_value} (at {kept_position}), dropped {dropped_value} (at {dropped_position})"
            ),
            Self::ImplausibleValue {
                test_key,
                value,
                min,
                max,
            } => write!(
                f,
                "'{test_key}': value {value} outside plausible range [{min}-{max}]"
            ),
            Self::ResultsCapped { found, kept } => {
                write!(f, "Excessive results ({found}) capped to {kept}")
            }
        }
    }
}

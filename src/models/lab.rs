use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::enums::{Confidence, ResultStatus};
use crate::catalog::RangeBand;

/// One alias-adjacent numeric capture, before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    pub test_key: String,
    pub raw_value_text: String,
    pub raw_unit_text: Option<String>,
    /// Character offset of the alias in the (sanitized) source text.
    pub position: usize,
}

/// A typed, validated result. At most one per test key per report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_key: String,
    pub value: f64,
    /// Canonical unit token, or `None` for unit-less tests (ratios).
    pub unit: Option<String>,
    pub confidence: Confidence,
    /// Position of the match this result was taken from.
    pub position: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub test_result: Arc<TestResult>,
    pub status: ResultStatus,
    /// Band used for classification; `None` iff `status` is unclassifiable.
    pub band: Option<Arc<RangeBand>>,
    /// The value expressed in the band's unit (after conversion, if any).
    pub compared_value: Option<f64>,
    /// Signed distance from the normal interval, in band units.
    pub margin: Option<f64>,
    pub concern: Option<String>,
}

impl ClassifiedResult {
    pub fn unclassifiable(test_result: Arc<TestResult>) -> Self {
        Self {
            test_result,
            status: ResultStatus::Unclassifiable,
            band: None,
            compared_value: None,
            margin: None,
            concern: None,
        }
    }

    pub fn test_key(&self) -> &str {
        &self.test_result.test_key
    }

    pub fn is_flagged(&self) -> bool {
        self.status.is_flagged()
    }
}

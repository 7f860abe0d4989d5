use std::sync::Arc;

use crate::catalog::ReferenceTable;
use crate::models::{ClassifiedResult, PatientMetadata, TestResult};

/// Classify every result against the reference table. Pure function of its
/// inputs; output order matches input order.
pub fn classify(
    results: Vec<TestResult>,
    table: &ReferenceTable,
    patient: &PatientMetadata,
) -> Vec<ClassifiedResult> {
    results
        .into_iter()
        .map(|r| classify_one(Arc::new(r), table, patient))
        .collect()
}

/// Use the most specific applicable band whose unit the result can be
/// expressed in. No such band means `unclassifiable`.
pub fn classify_one(
    result: Arc<TestResult>,
    table: &ReferenceTable,
    patient: &PatientMetadata,
) -> ClassifiedResult {
    let bands = table.applicable(&result.test_key, patient.sex, patient.age);
    if bands.is_empty() {
        tracing::debug!(test_key = %result.test_key, "No applicable reference band");
        return ClassifiedResult::unclassifiable(result);
    }

    for band in bands {
        let Some(compared) = table.convert(
            &result.test_key,
            result.value,
            result.unit.as_deref(),
            band.unit.as_deref(),
        ) else {
            continue;
        };

        let status = band.status_of(compared);
        return ClassifiedResult {
            status,
            band: Some(Arc::clone(band)),
            compared_value: Some(compared),
            margin: Some(band.margin(compared)),
            concern: band.concern_for(status).map(String::from),
            test_result: result,
        };
    }

    tracing::debug!(
        test_key = %result.test_key,
        unit = ?result.unit,
        "No reference band in a compatible unit"
    );
    ClassifiedResult::unclassifiable(result)
}

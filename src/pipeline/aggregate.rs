use std::collections::BTreeMap;

use crate::catalog::PatternCatalog;
use crate::models::{CategoryCounts, ClassifiedResult, Report};

/// Category for test keys the catalog does not map.
pub const OTHER_CATEGORY: &str = "Other";

/// Group classified results into a report skeleton: results in input
/// order, the flagged subsequence, and per-category counts. Patient info,
/// findings and warnings are left for the caller to fill in.
pub fn aggregate(classified: Vec<ClassifiedResult>, catalog: &PatternCatalog) -> Report {
    let mut category_counts: BTreeMap<String, CategoryCounts> = BTreeMap::new();
    for result in &classified {
        let category = catalog
            .category_of(result.test_key())
            .unwrap_or(OTHER_CATEGORY);
        category_counts
            .entry(category.to_string())
            .or_default()
            .record(result.status.tier());
    }

    let flagged: Vec<ClassifiedResult> = classified
        .iter()
        .filter(|r| r.is_flagged())
        .cloned()
        .collect();

    Report {
        classified_results: classified,
        flagged,
        category_counts,
        ..Report::default()
    }
}

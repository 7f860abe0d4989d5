use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "MedReport";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a directory of table overrides.
pub const TABLES_DIR_ENV: &str = "MEDREPORT_TABLES_DIR";

/// Characters allowed between the end of an alias and its value.
pub const DEFAULT_ADJACENCY_WINDOW: usize = 32;

/// Upper bound on results kept per report.
pub const DEFAULT_MAX_RESULTS: usize = 60;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "medreport_lib=debug,medreport=debug,warn"
    } else {
        "medreport_lib=info,medreport=info,warn"
    }
}

/// Per-pipeline tuning knobs. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub adjacency_window: usize,
    /// Rewrite near-miss OCR spellings of catalog aliases before extraction.
    pub ocr_correction: bool,
    pub max_results: usize,
    pub extract_patient_info: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            adjacency_window: DEFAULT_ADJACENCY_WINDOW,
            ocr_correction: true,
            max_results: DEFAULT_MAX_RESULTS,
            extract_patient_info: true,
        }
    }
}

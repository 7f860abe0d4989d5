pub mod catalog;
pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;

pub use catalog::{load_tables, CatalogError, LoadedTables, PatternCatalog, ReferenceTable};
pub use config::PipelineOptions;
pub use models::{PatientMetadata, Report, Sex};
pub use pipeline::{ReportInput, ReportPipeline};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr; stdout carries the
/// report JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

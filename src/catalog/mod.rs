//! Pattern catalog and reference table.
//!
//! Both tables are validated once at load time and are read-only afterwards,
//! so they can be shared across concurrently processed reports.

pub mod builtin;
pub mod loader;
pub mod pattern;
pub mod reference;
pub mod units;

pub use loader::*;
pub use pattern::*;
pub use reference::*;
pub use units::*;

use thiserror::Error;

/// Configuration fault: a malformed catalog or reference-table entry.
/// Fatal at startup, never raised while processing a report.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table file {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("Duplicate test key in pattern catalog: {0}")]
    DuplicateTestKey(String),

    #[error("Invalid test key '{0}' (expected lowercase letters, digits, underscores)")]
    InvalidTestKey(String),

    #[error("Rule '{0}' has no aliases")]
    EmptyAliases(String),

    #[error("Rule '{0}' has a blank alias")]
    BlankAlias(String),

    #[error("Rule '{0}' has no category")]
    MissingCategory(String),

    #[error("Rule '{0}' has a zero adjacency window")]
    InvalidWindow(String),

    #[error("Rule '{0}' has an invalid plausible range")]
    InvalidPlausibleRange(String),

    #[error("Alias pattern for '{test_key}' failed to compile: {reason}")]
    Pattern { test_key: String, reason: String },

    #[error("Unknown canonical unit '{unit}' in {context}")]
    UnknownUnit { unit: String, context: String },

    #[error("Band for '{0}' has a non-finite bound")]
    NonFiniteBound(String),

    #[error("Band for '{0}' has bounds out of order")]
    NonMonotonicBounds(String),

    #[error("Band for '{test_key}' has inverted age range {min}-{max}")]
    InvertedAgeRange { test_key: String, min: u32, max: u32 },

    #[error("Invalid conversion {from} -> {to} (factor {factor})")]
    InvalidConversion { from: String, to: String, factor: f64 },
}

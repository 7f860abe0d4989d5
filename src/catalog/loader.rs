use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::builtin;
use super::pattern::{PatternCatalog, PatternRule};
use super::reference::{ReferenceTable, ReferenceTableData};
use super::CatalogError;

pub const PATTERN_CATALOG_FILE: &str = "pattern_catalog.json";
pub const REFERENCE_RANGES_FILE: &str = "reference_ranges.json";

/// Where a loaded table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Bundled,
    File(PathBuf),
}

impl std::fmt::Display for TableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundled => f.write_str("bundled"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Both tables, validated and ready to share.
#[derive(Debug)]
pub struct LoadedTables {
    pub catalog: PatternCatalog,
    pub reference: ReferenceTable,
    pub catalog_source: TableSource,
    pub reference_source: TableSource,
}

/// Load the pattern catalog and reference table.
///
/// With no directory, the bundled tables are used. With a directory, each
/// of `pattern_catalog.json` and `reference_ranges.json` is read if
/// present; a missing file falls back to its bundled counterpart. Any
/// unreadable or malformed file is a configuration fault.
pub fn load_tables(dir: Option<&Path>) -> Result<LoadedTables, CatalogError> {
    let Some(dir) = dir else {
        tracing::debug!("Using bundled pattern catalog and reference table");
        return Ok(LoadedTables {
            catalog: builtin::catalog()?,
            reference: builtin::reference_table()?,
            catalog_source: TableSource::Bundled,
            reference_source: TableSource::Bundled,
        });
    };

    if !dir.is_dir() {
        return Err(CatalogError::Io {
            path: dir.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let (rules, catalog_source) = match read_json::<Vec<PatternRule>>(dir, PATTERN_CATALOG_FILE)? {
        Some((rules, path)) => (rules, TableSource::File(path)),
        None => (builtin::pattern_rules(), TableSource::Bundled),
    };
    let (data, reference_source) =
        match read_json::<ReferenceTableData>(dir, REFERENCE_RANGES_FILE)? {
            Some((data, path)) => (data, TableSource::File(path)),
            None => (builtin::reference_data(), TableSource::Bundled),
        };

    let catalog = PatternCatalog::new(rules)?;
    let reference = ReferenceTable::from_data(data)?;

    tracing::info!(
        rules = catalog.len(),
        bands = reference.len(),
        catalog = %catalog_source,
        reference = %reference_source,
        "Tables loaded"
    );

    Ok(LoadedTables {
        catalog,
        reference,
        catalog_source,
        reference_source,
    })
}

fn read_json<T: DeserializeOwned>(
    dir: &Path,
    file: &str,
) -> Result<Option<(T, PathBuf)>, CatalogError> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::debug!(file, "Table file absent, using bundled table");
        return Ok(None);
    }
    let json = std::fs::read_to_string(&path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let value = serde_json::from_str(&json).map_err(|e| CatalogError::Parse {
        file: file.into(),
        reason: e.to_string(),
    })?;
    Ok(Some((value, path)))
}

/// Write the bundled tables into `dir` as editable JSON files.
/// Returns the paths written.
pub fn export_bundled(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    std::fs::create_dir_all(dir).map_err(|e| CatalogError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;
    Ok(vec![
        write_json(dir, PATTERN_CATALOG_FILE, &builtin::pattern_rules())?,
        write_json(dir, REFERENCE_RANGES_FILE, &builtin::reference_data())?,
    ])
}

fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<PathBuf, CatalogError> {
    let path = dir.join(file);
    let json = serde_json::to_string_pretty(value).map_err(|e| CatalogError::Parse {
        file: file.into(),
        reason: e.to_string(),
    })?;
    std::fs::write(&path, json).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(path)
}

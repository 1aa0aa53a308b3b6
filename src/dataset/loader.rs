//! Dataset loading.
//!
//! Reads a delimited salary file into memory, checking the header for the
//! required columns before any row is parsed.

use crate::analysis::{apply_filters, FilterSelection};
use crate::error::DataLoadError;
use crate::models::{Field, Record};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Where a dataset comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A file on disk.
    Path(PathBuf),
    /// Bytes handed over by an upload widget.
    Upload { name: String, bytes: Arc<[u8]> },
}

/// Identity of a data source, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    Path(PathBuf),
    Upload { name: String, len: usize, digest: u64 },
}

impl DataSource {
    /// Source backed by a file.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        DataSource::Path(path.into())
    }

    /// Source backed by uploaded bytes.
    pub fn upload(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        DataSource::Upload {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name used in logs and error messages.
    pub fn name(&self) -> String {
        match self {
            DataSource::Path(path) => path.display().to_string(),
            DataSource::Upload { name, .. } => name.clone(),
        }
    }

    /// Stable identity: canonical path, or upload name plus content hash.
    pub fn identity(&self) -> SourceId {
        match self {
            DataSource::Path(path) => {
                SourceId::Path(std::fs::canonicalize(path).unwrap_or_else(|_| path.clone()))
            }
            DataSource::Upload { name, bytes } => {
                let mut hasher = DefaultHasher::new();
                bytes.hash(&mut hasher);
                SourceId::Upload {
                    name: name.clone(),
                    len: bytes.len(),
                    digest: hasher.finish(),
                }
            }
        }
    }
}

/// Parsing options for delimited input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field separator byte.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// An immutable, loaded record set.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Source name, for reports.
    pub name: String,
    /// Rows in file order.
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records passing `selection`, in file order.
    pub fn filter(&self, selection: &FilterSelection) -> Vec<&Record> {
        apply_filters(&self.records, selection)
    }
}

/// Load a dataset from `source`.
pub fn load_records(source: &DataSource, options: &LoadOptions) -> Result<Dataset, DataLoadError> {
    let name = source.name();
    info!("Loading dataset from {}", name);

    let dataset = match source {
        DataSource::Path(path) => {
            let file = open_file(path)?;
            read_records(file, &name, options)?
        }
        DataSource::Upload { bytes, .. } => read_records(Cursor::new(&bytes[..]), &name, options)?,
    };

    info!("Loaded {} records from {}", dataset.len(), name);
    Ok(dataset)
}

fn open_file(path: &Path) -> Result<File, DataLoadError> {
    File::open(path).map_err(|source| DataLoadError::Io {
        name: path.display().to_string(),
        source,
    })
}

/// Parse records from any reader. `name` labels errors.
pub fn read_records<R: Read>(
    reader: R,
    name: &str,
    options: &LoadOptions,
) -> Result<Dataset, DataLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|source| DataLoadError::Csv {
        name: name.to_string(),
        source,
    })?;
    debug!("Header of {}: {:?}", name, headers);

    for field in Field::REQUIRED {
        if !headers.iter().any(|h| h == field.as_str()) {
            return Err(DataLoadError::MissingColumn {
                name: name.to_string(),
                column: field.as_str().to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for (index, result) in rdr.deserialize::<Record>().enumerate() {
        // Header is line 1.
        let fallback_line = index as u64 + 2;
        let record = result.map_err(|err| DataLoadError::MalformedRow {
            name: name.to_string(),
            line: err.position().map(|p| p.line()).unwrap_or(fallback_line),
            reason: err.to_string(),
        })?;

        validate(&record).map_err(|reason| DataLoadError::MalformedRow {
            name: name.to_string(),
            line: fallback_line,
            reason,
        })?;

        records.push(record);
    }

    Ok(Dataset::new(name, records))
}

/// Range checks serde cannot express.
fn validate(record: &Record) -> Result<(), String> {
    if !record.salary_in_usd.is_finite() || record.salary_in_usd < 0.0 {
        return Err(format!(
            "salary_in_usd must be a non-negative number, got {}",
            record.salary_in_usd
        ));
    }
    if record.remote_ratio > 100 {
        return Err(format!(
            "remote_ratio must be between 0 and 100, got {}",
            record.remote_ratio
        ));
    }
    Ok(())
}

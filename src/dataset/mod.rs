use crate::error::{HarvestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Platform prefix of the `source` field
const SOURCE_PREFIX: &str = "github_repo";

/// One labeled sample, written as its own JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub code: String,
    pub source: String,
    pub file: String,
    pub license: String,
    pub language: String,
}

impl DatasetRecord {
    pub fn new(code: String, repo: &str, file: &str, license: &str, language: &str) -> Self {
        Self {
            code,
            source: format!("{}:{}", SOURCE_PREFIX, repo),
            file: file.to_string(),
            license: license.to_uppercase(),
            language: language.to_string(),
        }
    }

    /// Pretty JSON with 4-space indentation; non-ASCII text is kept as is
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);

        self.serialize(&mut serializer)?;

        Ok(out)
    }
}

/// Writes records into the output directory as `<prefix>_<sequence>.json`
pub struct DatasetWriter {
    dir: PathBuf,
    prefix: String,
}

impl DatasetWriter {
    /// Create the output directory (and parents) if missing
    pub async fn create(dir: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let dir = dir.into();

        fs::create_dir_all(&dir)
            .await
            .map_err(|source| HarvestError::OutputDir {
                path: dir.clone(),
                source,
            })?;

        Ok(Self {
            dir,
            prefix: prefix.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.prefix, sequence))
    }

    pub async fn write(&self, sequence: u64, record: &DatasetRecord) -> Result<PathBuf> {
        let path = self.record_path(sequence);
        let write_err = |message: String| HarvestError::Write {
            path: path.clone(),
            message,
        };

        let data = record.to_json().map_err(|e| write_err(e.to_string()))?;
        fs::write(&path, data)
            .await
            .map_err(|e| write_err(e.to_string()))?;

        Ok(path)
    }
}

//! Input datasets and their staging into interpreter-loadable files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Csv,
    Json,
    Ndjson,
    Parquet,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "ndjson" | "jsonl" => Some(Self::Ndjson),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }

    /// Loader function looked up on the tabular module.
    pub fn loader(self) -> &'static str {
        match self {
            Self::Csv => "read_csv",
            Self::Json => "read_json",
            Self::Ndjson => "read_ndjson",
            Self::Parquet => "read_parquet",
        }
    }
}

/// The data every unit of a batch is run against.
#[derive(Debug, Clone)]
pub enum Dataset {
    File { path: PathBuf, format: DatasetFormat },
    Records(Vec<serde_json::Map<String, serde_json::Value>>),
}

impl Dataset {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = DatasetFormat::from_path(&path).with_context(|| {
            format!(
                "unsupported dataset extension: {} (expected csv, json, ndjson, jsonl or parquet)",
                path.display()
            )
        })?;
        Ok(Self::File { path, format })
    }

    pub fn from_records(records: Vec<serde_json::Map<String, serde_json::Value>>) -> Self {
        Self::Records(records)
    }

    /// Make the dataset readable by the interpreter. Records are written once,
    /// named by their content digest, so identical data maps to the same file.
    pub fn stage(&self, staging_dir: &Path) -> Result<StagedDataset> {
        match self {
            Self::File { path, format } => {
                if !path.is_file() {
                    bail!("dataset file '{}' does not exist", path.display());
                }
                let path = path
                    .canonicalize()
                    .with_context(|| format!("resolving dataset path {}", path.display()))?;
                Ok(StagedDataset {
                    path,
                    format: *format,
                })
            }
            Self::Records(rows) => {
                let body = serde_json::to_vec(rows)?;
                let digest = md5::compute(&body);
                fs::create_dir_all(staging_dir).with_context(|| {
                    format!("creating staging dir {}", staging_dir.display())
                })?;
                let path = staging_dir.join(format!("{:x}.json", digest));
                if !path.exists() {
                    // Persisted atomically; readers only ever see a complete file.
                    let mut tmp = tempfile::NamedTempFile::new_in(staging_dir)?;
                    std::io::Write::write_all(&mut tmp, &body)?;
                    tmp.persist(&path)
                        .with_context(|| format!("staging dataset at {}", path.display()))?;
                }
                tracing::debug!(path = %path.display(), rows = rows.len(), "staged dataset records");
                Ok(StagedDataset {
                    path,
                    format: DatasetFormat::Json,
                })
            }
        }
    }
}

/// A dataset available on disk for the interpreter to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedDataset {
    pub path: PathBuf,
    pub format: DatasetFormat,
}

impl StagedDataset {
    pub fn loader(&self) -> &'static str {
        self.format.loader()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<serde_json::Map<String, serde_json::Value>> {
        vec![
            json!({"a": 1, "b": "x"}).as_object().cloned().unwrap(),
            json!({"a": 2, "b": "y"}).as_object().cloned().unwrap(),
        ]
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DatasetFormat::from_path(Path::new("cars.CSV")),
            Some(DatasetFormat::Csv)
        );
        assert_eq!(
            DatasetFormat::from_path(Path::new("x.jsonl")),
            Some(DatasetFormat::Ndjson)
        );
        assert_eq!(DatasetFormat::from_path(Path::new("x.xlsx")), None);
        assert_eq!(DatasetFormat::Parquet.loader(), "read_parquet");
    }

    #[test]
    fn unknown_extension_rejected() {
        assert!(Dataset::from_path("data.xlsx").is_err());
    }

    #[test]
    fn records_stage_to_same_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ds = Dataset::from_records(rows());
        let a = ds.stage(dir.path())?;
        let b = ds.stage(dir.path())?;
        assert_eq!(a, b);
        assert_eq!(a.format, DatasetFormat::Json);
        let back: serde_json::Value = serde_json::from_str(&fs::read_to_string(&a.path)?)?;
        assert_eq!(back[1]["b"], "y");
        Ok(())
    }

    #[test]
    fn missing_file_fails_staging() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ds = Dataset::from_path(dir.path().join("nope.csv"))?;
        assert!(ds.stage(dir.path()).is_err());
        Ok(())
    }
}

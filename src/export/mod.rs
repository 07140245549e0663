//! Export
//!
//! Writes normalized records as JSON or CSV under the exports directory.
//! File names are `{query}_{YYYYmmdd_HHMMSS}.{ext}` so repeated exports of
//! the same query do not collide.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::types::NormalizedRecord;

const MAX_STEM_CHARS: usize = 50;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

/// Query reduced to something safe for a file name.
pub fn sanitize_query(query: &str) -> String {
    let stem: String = query
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .take(MAX_STEM_CHARS)
        .collect();

    if stem.is_empty() {
        "search".to_string()
    } else {
        stem
    }
}

/// `{sanitized_query}_{YYYYmmdd_HHMMSS}.{ext}`
pub fn export_file_name(query: &str, format: ExportFormat, at: DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        sanitize_query(query),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Record exporter bound to one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `records` and returns the path of the new file.
    pub async fn export(
        &self,
        records: &[NormalizedRecord],
        query: &str,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ExportError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self
            .dir
            .join(export_file_name(query, format, Local::now()));
        let contents = match format {
            ExportFormat::Json => render_json(records)?,
            ExportFormat::Csv => render_csv(records)?,
        };
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), records = records.len(), "Export written");
        Ok(path)
    }

    pub async fn export_json(
        &self,
        records: &[NormalizedRecord],
        query: &str,
    ) -> Result<PathBuf, ExportError> {
        self.export(records, query, ExportFormat::Json).await
    }

    pub async fn export_csv(
        &self,
        records: &[NormalizedRecord],
        query: &str,
    ) -> Result<PathBuf, ExportError> {
        self.export(records, query, ExportFormat::Csv).await
    }
}

fn render_json(records: &[NormalizedRecord]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(records)?)
}

fn render_csv(records: &[NormalizedRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

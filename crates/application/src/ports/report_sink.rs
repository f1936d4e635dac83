//! Report sink port

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use probe_domain::RunReport;

/// Errors that can occur while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The report could not be written.
    #[error("Failed to write report to {path}: {source}")]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Destination for finished run reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Writes `report` under `dir` and returns the written file.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    async fn write(&self, report: &RunReport, dir: &Path) -> Result<PathBuf, ReportError>;
}

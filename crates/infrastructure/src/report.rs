//! Report writers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use probe_application::ports::{ReportError, ReportSink};
use probe_domain::RunReport;
use tokio::fs;

use crate::serialization::to_json_stable;

/// Default report file name.
pub const REPORT_FILE: &str = "report.json";

/// Writes the run report as `report.json` in the output directory.
///
/// ```text
/// output/
///   report.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    file_name: String,
}

impl JsonReportWriter {
    /// Creates a writer producing `report.json`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            file_name: REPORT_FILE.to_string(),
        }
    }

    /// Uses a different file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

impl Default for JsonReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSink for JsonReportWriter {
    async fn write(&self, report: &RunReport, dir: &Path) -> Result<PathBuf, ReportError> {
        let json = to_json_stable(report).map_err(|e| ReportError::Serialization(e.to_string()))?;

        fs::create_dir_all(dir).await.map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(&self.file_name);
        fs::write(&path, json).await.map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

//! Run suite use case.

use std::path::PathBuf;
use std::sync::Arc;

use probe_domain::RunReport;

use crate::config::HarnessConfig;
use crate::error::ApplicationResult;
use crate::ports::{FeatureSource, HttpClient, ReportSink};
use crate::runner::ScenarioRunner;

/// Input for running a suite.
#[derive(Debug, Clone)]
pub struct RunSuiteInput {
    /// Configuration shared by every scenario.
    pub config: Arc<HarnessConfig>,
    /// Optional name filter.
    pub grep: Option<String>,
}

/// Output of a finished run.
#[derive(Debug, Clone)]
pub struct RunSuiteOutput {
    /// Per-scenario results and totals.
    pub report: RunReport,
    /// File the report was written to.
    pub report_path: PathBuf,
}

/// Loads the configured scenario files, runs them and writes the report.
pub struct RunSuite<S: FeatureSource, R: ReportSink> {
    source: S,
    sink: R,
    client: Arc<dyn HttpClient>,
}

impl<S: FeatureSource, R: ReportSink> RunSuite<S, R> {
    /// Creates a new `RunSuite` use case.
    #[must_use]
    pub fn new(source: S, sink: R, client: Arc<dyn HttpClient>) -> Self {
        Self {
            source,
            sink,
            client,
        }
    }

    /// Executes the suite.
    ///
    /// Failing scenarios do not make this an error; check
    /// [`RunReport::all_passed`] on the output.
    ///
    /// # Errors
    /// Returns an error if scenario files cannot be loaded or the report
    /// cannot be written.
    pub async fn execute(&self, input: RunSuiteInput) -> ApplicationResult<RunSuiteOutput> {
        let features = self.source.load(&input.config.tests).await?;
        tracing::info!(
            pattern = %input.config.tests,
            features = features.len(),
            "loaded scenario files"
        );

        let mut runner = ScenarioRunner::new(self.client.clone(), input.config.clone());
        if let Some(grep) = input.grep {
            runner = runner.with_grep(grep);
        }
        let report = runner.run(&features).await;

        let report_path = self.sink.write(&report, &input.config.output).await?;
        tracing::info!(path = %report_path.display(), "report written");

        Ok(RunSuiteOutput {
            report,
            report_path,
        })
    }
}

//! Probe - Main Entry Point
//!
//! Loads configuration, runs scenario files and maps the outcome to the
//! process exit code: 0 when every scenario passed, 1 when any failed,
//! 2 when configuration or scenario files could not be loaded.

mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use probe_application::{HarnessConfig, HttpClient, ListFeatures, RunSuite, RunSuiteInput};
use probe_infrastructure::{FileFeatureSource, JsonReportWriter, ReqwestHttpClient};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, DEFAULT_CONFIG};

const EXIT_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Command::Run { grep, output } => {
            let mut config = config;
            if let Some(output) = output {
                config.output = output;
            }
            tracing::info!(
                "Starting {} with probe v{}",
                config.name,
                env!("CARGO_PKG_VERSION")
            );

            let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
            let use_case = RunSuite::new(FileFeatureSource::new(), JsonReportWriter::new(), client);
            let output = use_case
                .execute(RunSuiteInput {
                    config: Arc::new(config),
                    grep,
                })
                .await?;

            let report = &output.report;
            for scenario in report.scenarios.iter().filter(|s| s.failure_message.is_some()) {
                tracing::error!(
                    "{} -- {}: {}",
                    scenario.feature_name,
                    scenario.scenario_name,
                    scenario.failure_message.as_deref().unwrap_or_default()
                );
            }
            tracing::info!(
                "{} passed, {} failed, {} skipped ({}ms)",
                report.passed,
                report.failed,
                report.skipped,
                report.duration_ms
            );

            Ok(if report.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILED)
            })
        }
        Command::List => {
            let features = ListFeatures::new(FileFeatureSource::new())
                .execute(&config.tests)
                .await?;
            for feature in features {
                println!("{}", feature.name);
                for (scenario, skipped) in feature.scenarios {
                    let marker = if skipped { " (skipped)" } else { "" };
                    println!("  - {scenario}{marker}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Reads `path`, or `probe.yaml` if present, or falls back to defaults.
async fn load_config(path: Option<&Path>) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(HarnessConfig::from_path(path).await?);
    }
    let default = Path::new(DEFAULT_CONFIG);
    if tokio::fs::try_exists(default).await.unwrap_or(false) {
        return Ok(HarnessConfig::from_path(default).await?);
    }

    tracing::debug!("no {DEFAULT_CONFIG} found, using defaults");
    let config = HarnessConfig::default().with_env_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

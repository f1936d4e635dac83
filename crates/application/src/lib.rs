//! Probe Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for external dependencies)
//! - Harness configuration
//! - Request execution, retry and the per-scenario session
//! - The scenario runner and use case orchestration

pub mod config;
pub mod error;
pub mod executor;
pub mod ports;
pub mod retry;
pub mod runner;
pub mod session;
pub mod use_cases;

pub use config::{ConfigError, HarnessConfig};
pub use error::{ApplicationError, ApplicationResult};
pub use executor::RequestExecutor;
pub use ports::{FeatureSource, HttpClient, HttpClientError, LoadError, ReportError, ReportSink};
pub use retry::retry_step;
pub use runner::{BoxFuture, Feature, Scenario, ScenarioRunner, StepFn};
pub use session::Session;
pub use use_cases::{FeatureSummary, ListFeatures, RunSuite, RunSuiteInput, RunSuiteOutput};

//! Application error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::ports::{LoadError, ReportError};

/// Errors that prevent a run from producing a report.
///
/// Scenario failures are not errors at this level; they are recorded in the
/// run report.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scenario files could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

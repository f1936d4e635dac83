//! Domain error types

use thiserror::Error;

use crate::assertion::AssertionError;
use crate::schema::ValidationReport;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The request body is invalid for the given content type.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A scenario attempted a lifecycle transition that is not allowed.
    #[error("invalid scenario transition: {from} -> {to}")]
    InvalidTransition {
        /// State the scenario was in.
        from: String,
        /// State that was requested.
        to: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failure of a single scenario step.
///
/// Every error that can abort a scenario body converges on this type, so a
/// body written with `?` reads top-to-bottom and stops at the first failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HarnessError {
    /// Connection-level failure (DNS, refused, TLS, transport).
    #[error("network error: {0}")]
    Network(String),

    /// The request or scenario exceeded its time budget.
    #[error("timed out after {timeout_ms}ms")]
    Timeout {
        /// Budget that elapsed.
        timeout_ms: u64,
    },

    /// An expectation on the response was not met.
    #[error("assertion failed: {0}")]
    Assertion(AssertionError),

    /// The response body did not conform to a schema.
    #[error("schema violation: {0}")]
    SchemaViolation(ValidationReport),

    /// The step itself was malformed (bad URL, bad method).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Hook or body reported a failure of its own.
    #[error("{0}")]
    Step(String),
}

impl HarnessError {
    /// Returns true if a retry of the failed step may succeed.
    ///
    /// Only connection-level failures qualify; timeouts and assertion
    /// failures are final.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Short name of the error class, used in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "NetworkError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Assertion(_) => "AssertionError",
            Self::SchemaViolation(_) => "SchemaViolationError",
            Self::Domain(_) => "DomainError",
            Self::Step(_) => "StepError",
        }
    }
}

impl From<AssertionError> for HarnessError {
    fn from(error: AssertionError) -> Self {
        match error {
            AssertionError::Schema(report) => Self::SchemaViolation(report),
            other => Self::Assertion(other),
        }
    }
}

/// Result type alias for scenario steps.
pub type StepResult<T = ()> = Result<T, HarnessError>;

//! Assertion failure type.

use thiserror::Error;

use crate::schema::ValidationReport;

/// An expectation on a response that was not met.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssertionError {
    /// Status code did not match.
    #[error("expected status {expected}, got {actual}")]
    Status {
        /// Description of the expected status.
        expected: String,
        /// Status actually received.
        actual: u16,
    },

    /// One or more keys were absent from the body.
    #[error("response is missing keys [{}]{}", .missing.join(", "), .location)]
    MissingKeys {
        /// Keys that were not found.
        missing: Vec<String>,
        /// Where they were looked for (empty for the top level).
        location: String,
    },

    /// The body was expected to be JSON of a certain shape.
    #[error("expected a JSON {expected} body, got {actual}")]
    BodyShape {
        /// Shape required by the check.
        expected: String,
        /// Preview of what was received.
        actual: String,
    },

    /// The body did not contain the expected JSON subset.
    #[error("JSON mismatch at {path}: expected {expected}, got {actual}")]
    JsonMismatch {
        /// Location of the first difference.
        path: String,
        /// Expected value at that location.
        expected: String,
        /// Actual value at that location.
        actual: String,
    },

    /// The body did not satisfy a schema.
    #[error("{0}")]
    Schema(ValidationReport),

    /// A caller-supplied validation rejected the response.
    #[error("{0}")]
    Callback(String),

    /// A header check failed.
    #[error("{0}")]
    Header(String),

    /// A JSON path check failed.
    #[error("{0}")]
    JsonPath(String),

    /// The response took longer than allowed.
    #[error("response took {actual_ms}ms, expected <= {max_ms}ms")]
    TooSlow {
        /// Measured duration.
        actual_ms: u64,
        /// Allowed duration.
        max_ms: u64,
    },
}

//! Probe Domain - Core contract-testing types
//!
//! This crate defines requests, responses, schemas, assertions and the
//! scenario lifecycle for the Probe harness.
//! All types here are pure Rust with no I/O dependencies.

pub mod assertion;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod scenario;
pub mod schema;

pub use assertion::{
    Assertion, AssertionError, ComparisonOperator, Expect, ResponseView, StatusExpectation,
};
pub use error::{DomainError, DomainResult, HarnessError, StepResult};
pub use request::{Header, Headers, HttpMethod, RequestSpec, RetryMode};
pub use response::{ResponseBody, ResponseSpec};
pub use retry::RetryPolicy;
pub use scenario::{RunReport, RunStatus, ScenarioReport, ScenarioStatus};
pub use schema::{Field, Schema, StringFormat, UnknownFields, ValidationReport, Violation, validate};

//! Response assertions.
//!
//! [`Expect`] borrows the response of one step and runs checks against it;
//! [`Assertion`] is the serializable form of the same checks.

mod declarative;
mod error;
mod expect;
mod json_path;
mod subset;

pub use declarative::{Assertion, StatusExpectation};
pub use error::AssertionError;
pub use expect::{Expect, ResponseView};
pub use json_path::{ComparisonOperator, query};
pub use subset::{Mismatch, contains_subset, json_eq};

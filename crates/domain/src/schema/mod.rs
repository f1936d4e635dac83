//! JSON schema model and validator.
//!
//! A [`Schema`] is an immutable tree of field constraints; [`validate`]
//! walks it against a JSON value and collects every violation.

mod types;
mod validator;

pub use types::{Field, Schema, StringFormat, UnknownFields};
pub use validator::{ValidationReport, Violation, validate};

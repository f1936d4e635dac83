//! Probe Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod loader;
pub mod report;
pub mod serialization;

pub use adapters::ReqwestHttpClient;
pub use loader::{FileFeatureSource, load_features, parse_document, parse_feature};
pub use report::{JsonReportWriter, REPORT_FILE};
pub use serialization::{SerializationError, to_json_stable};

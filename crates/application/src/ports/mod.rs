//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod feature_source;
mod http_client;
mod report_sink;

pub use feature_source::{FeatureSource, LoadError};
pub use http_client::{HttpClient, HttpClientError, HttpFuture};
pub use report_sink::{ReportError, ReportSink};

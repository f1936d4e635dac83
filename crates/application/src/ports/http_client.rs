//! HTTP Client port

use std::future::Future;
use std::pin::Pin;

use probe_domain::{DomainError, HarnessError, RequestSpec, ResponseSpec};
use thiserror::Error;

/// Future returned by [`HttpClient::execute`].
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + 'a>>;

/// Port for executing HTTP requests.
///
/// The request handed to an adapter is already resolved: `url` is absolute,
/// `headers` is the fully merged set and `timeout_ms` is always present.
/// Adapters never interpret status codes; 4xx and 5xx are ordinary responses.
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails due to network issues,
    /// timeout, or an unusable URL or body.
    fn execute<'a>(&'a self, request: &'a RequestSpec) -> HttpFuture<'a>;
}

/// Transport-level failures reported by an [`HttpClient`] adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The request did not complete within its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("could not resolve host '{host}': {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server actively refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS handshake or certificate failure.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// The URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true for failures of the connection itself.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::DnsError { .. }
                | Self::ConnectionRefused { .. }
                | Self::ConnectionFailed(_)
                | Self::TlsError(_)
                | Self::TooManyRedirects { .. }
                | Self::Other(_)
        )
    }
}

impl From<HttpClientError> for HarnessError {
    fn from(error: HttpClientError) -> Self {
        match error {
            HttpClientError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            HttpClientError::InvalidUrl(msg) => Self::Domain(DomainError::InvalidUrl(msg)),
            HttpClientError::InvalidBody(msg) => Self::Domain(DomainError::InvalidBody(msg)),
            other => Self::Network(other.to_string()),
        }
    }
}

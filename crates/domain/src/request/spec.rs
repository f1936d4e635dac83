//! Request specification type

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// Whether a failed send of a request may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Retry idempotent methods when the retry plugin is enabled.
    #[default]
    Auto,
    /// Always retry on network failure.
    Always,
    /// Never retry.
    Never,
}

/// Specification for one HTTP request issued by a scenario step.
///
/// A request is immutable once handed to the executor, which only ever
/// borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Absolute URL, or a path relative to the configured endpoint
    pub url: String,
    /// Extra headers layered over configured defaults
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
    /// Optional JSON payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Per-request timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Retry behaviour on network failure
    #[serde(default)]
    pub retry: RetryMode,
}

impl RequestSpec {
    /// Creates a request with the given method and URL.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            timeout_ms: None,
            retry: RetryMode::Auto,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Post, url).with_body(body)
    }

    /// Creates a PUT request with a JSON body.
    #[must_use]
    pub fn put(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Put, url).with_body(body)
    }

    /// Creates a PATCH request with a JSON body.
    #[must_use]
    pub fn patch(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(HttpMethod::Patch, url).with_body(body)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header, replacing any header with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Overrides the configured timeout for this request.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets the retry mode.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryMode) -> Self {
        self.retry = retry;
        self
    }

    /// Decides whether a network failure of this request may be retried.
    #[must_use]
    pub const fn is_retryable(&self, retry_plugin_enabled: bool) -> bool {
        match self.retry {
            RetryMode::Always => true,
            RetryMode::Never => false,
            RetryMode::Auto => retry_plugin_enabled && self.method.is_idempotent(),
        }
    }

    /// Returns true if the URL carries its own scheme.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        Url::parse(&self.url).is_ok()
    }

    /// Resolves the URL against an optional base endpoint.
    ///
    /// Absolute URLs are returned unchanged. Relative URLs are appended to
    /// the endpoint with exactly one `/` at the join.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if the URL is relative and no
    /// endpoint is configured, or if the joined URL does not parse.
    pub fn resolve_url(&self, endpoint: Option<&str>) -> DomainResult<Url> {
        if let Ok(url) = Url::parse(&self.url) {
            return Ok(url);
        }
        let Some(base) = endpoint else {
            return Err(DomainError::InvalidUrl(format!(
                "relative URL '{}' requires a configured endpoint",
                self.url
            )));
        };
        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| DomainError::InvalidUrl(format!("{e}: {joined}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absolute_url_used_as_is() {
        let req = RequestSpec::get("https://api.github.com/users/octocat");
        let url = req.resolve_url(Some("https://www.youtube.com")).unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/users/octocat");
    }

    #[test]
    fn test_relative_url_joined_with_endpoint() {
        let req = RequestSpec::get("/results?search_query=codeceptjs");
        let url = req.resolve_url(Some("https://www.youtube.com/")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.youtube.com/results?search_query=codeceptjs"
        );

        let req = RequestSpec::get("posts/1");
        let url = req.resolve_url(Some("http://localhost:3000/api")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/posts/1");
    }

    #[test]
    fn test_relative_url_without_endpoint_fails() {
        let req = RequestSpec::get("/");
        assert!(matches!(
            req.resolve_url(None),
            Err(DomainError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_retry_mode() {
        let get = RequestSpec::get("/");
        assert!(get.is_retryable(true));
        assert!(!get.is_retryable(false));

        let post = RequestSpec::post("/posts", serde_json::json!({}));
        assert!(!post.is_retryable(true));
        assert!(post.with_retry(RetryMode::Always).is_retryable(false));
        assert!(!get.with_retry(RetryMode::Never).is_retryable(true));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let req: RequestSpec = serde_yaml::from_str(
            "method: POST\nurl: /posts\nheaders:\n  X-Trace: abc\nbody:\n  title: t\n",
        )
        .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.headers.get("x-trace"), Some("abc"));
        assert_eq!(req.body, Some(serde_json::json!({"title": "t"})));
        assert_eq!(req.retry, RetryMode::Auto);
    }
}

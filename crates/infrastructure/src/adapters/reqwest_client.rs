//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It sends exactly the request it is given; URL resolution and header
//! merging happen in the executor.

use std::error::Error as _;
use std::time::{Duration, Instant};

use probe_application::ports::{HttpClient, HttpClientError, HttpFuture};
use probe_domain::{Headers, HttpMethod, RequestSpec, ResponseSpec};
use reqwest::{Client, Method, Url};

const MAX_REDIRECTS: usize = 10;
const FALLBACK_TIMEOUT_MS: u64 = 60_000;

/// HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// Redirects are followed up to ten times and TLS certificates are
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(concat!("probe/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a new HTTP client with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Joins the messages of `error` and its sources.
    fn describe(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }
        if error.is_redirect() {
            return HttpClientError::TooManyRedirects { max: MAX_REDIRECTS };
        }

        let message = Self::describe(error);
        let lower = message.to_lowercase();
        let host = error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string();

        if !error.is_connect() && !error.is_request() {
            return HttpClientError::Other(message);
        }
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("lookup") {
            return HttpClientError::DnsError { host, message };
        }
        if lower.contains("refused") {
            let port = error
                .url()
                .and_then(Url::port_or_known_default)
                .unwrap_or(80);
            return HttpClientError::ConnectionRefused { host, port };
        }
        if lower.contains("certificate") || lower.contains("tls") || lower.contains("handshake") {
            return HttpClientError::TlsError(message);
        }
        HttpClientError::ConnectionFailed(message)
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: &'a RequestSpec) -> HttpFuture<'a> {
        Box::pin(async move {
            let url = Url::parse(&request.url)
                .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.url)))?;
            let timeout_ms = request.timeout_ms.unwrap_or(FALLBACK_TIMEOUT_MS);

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(request.method), url)
                .timeout(Duration::from_millis(timeout_ms));

            for header in request.headers.iter() {
                builder = builder.header(&header.name, &header.value);
            }

            if let Some(body) = &request.body {
                let bytes = serde_json::to_vec(body)
                    .map_err(|e| HttpClientError::InvalidBody(format!("Invalid JSON: {e}")))?;
                if !request.headers.contains("content-type") {
                    builder = builder.header("Content-Type", "application/json");
                }
                builder = builder.body(bytes);
            }

            let start = Instant::now();
            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();
            let mut headers = Headers::new();
            for (name, value) in response.headers() {
                headers.append(name.as_str(), value.to_str().unwrap_or("<binary>"));
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;
            let duration = start.elapsed();

            Ok(ResponseSpec::new(status, headers, &body, duration))
        })
    }
}

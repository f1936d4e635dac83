//! Request executor
//!
//! Turns a step's [`RequestSpec`] into a fully resolved request, sends it
//! through the [`HttpClient`] port and hands the response back by value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use probe_domain::{HarnessError, Headers, RequestSpec, ResponseSpec, RetryPolicy, StepResult};

use crate::config::HarnessConfig;
use crate::ports::HttpClient;
use crate::retry::retry_step;

/// Sends requests with configured defaults applied.
///
/// # Example
///
/// ```ignore
/// let executor = RequestExecutor::new(Arc::new(ReqwestHttpClient::new()?), config);
/// let response = executor.send(&RequestSpec::get("/posts/1"), &Headers::new()).await?;
/// ```
pub struct RequestExecutor {
    client: Arc<dyn HttpClient>,
    config: Arc<HarnessConfig>,
}

impl RequestExecutor {
    /// Creates an executor over `client` with shared read-only `config`.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, config: Arc<HarnessConfig>) -> Self {
        Self { client, config }
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Resolves URL, headers and timeout of `request`.
    ///
    /// Header layers, lowest precedence first: configured defaults,
    /// `session_headers`, the request's own headers.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Domain` if the URL cannot be resolved.
    pub fn prepare(
        &self,
        request: &RequestSpec,
        session_headers: &Headers,
    ) -> StepResult<RequestSpec> {
        let url = request.resolve_url(self.config.endpoint.as_deref())?;

        let mut headers = self
            .config
            .default_headers
            .merged_with(session_headers)
            .merged_with(&request.headers);
        if request.body.is_some() && !headers.contains("content-type") {
            headers.set("Content-Type", "application/json");
        }

        Ok(RequestSpec {
            method: request.method,
            url: url.to_string(),
            headers,
            body: request.body.clone(),
            timeout_ms: Some(request.timeout_ms.unwrap_or(self.config.timeout_ms)),
            retry: request.retry,
        })
    }

    /// Sends `request` once.
    ///
    /// # Errors
    ///
    /// - `HarnessError::Timeout` when the timeout elapses
    /// - `HarnessError::Network` on connection failures
    /// - `HarnessError::Domain` for an unusable URL or body
    pub async fn send(
        &self,
        request: &RequestSpec,
        session_headers: &Headers,
    ) -> StepResult<ResponseSpec> {
        let prepared = self.prepare(request, session_headers)?;
        let timeout_ms = prepared.timeout_ms.unwrap_or(self.config.timeout_ms);
        let started = Instant::now();

        tracing::debug!(method = %prepared.method, url = %prepared.url, "sending request");

        let outcome = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.client.execute(&prepared),
        )
        .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(Ok(response)) => {
                tracing::info!(
                    method = %prepared.method,
                    url = %prepared.url,
                    status = response.status,
                    elapsed_ms,
                    "response received"
                );
                Ok(response)
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    method = %prepared.method,
                    url = %prepared.url,
                    elapsed_ms,
                    error = %error,
                    "request failed"
                );
                Err(error.into())
            }
            Err(_) => {
                tracing::warn!(
                    method = %prepared.method,
                    url = %prepared.url,
                    timeout_ms,
                    "request timed out"
                );
                Err(HarnessError::Timeout { timeout_ms })
            }
        }
    }

    /// Sends `request`, retrying network failures when the request allows it.
    ///
    /// A scenario `policy` enables retrying on its own and replaces the
    /// budget of the retry plugin.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn send_with_retry(
        &self,
        request: &RequestSpec,
        session_headers: &Headers,
        policy: Option<&RetryPolicy>,
    ) -> StepResult<ResponseSpec> {
        if !request.is_retryable(policy.is_some() || self.config.retry_enabled()) {
            return self.send(request, session_headers).await;
        }
        let policy = policy.copied().unwrap_or_else(|| self.config.retry_policy());
        retry_step(&policy, move || self.send(request, session_headers)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::config::RetryFailedStepConfig;
    use crate::ports::{HttpClientError, HttpFuture};
    use pretty_assertions::assert_eq;
    use probe_domain::{HttpMethod, RetryMode};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock HTTP client replaying scripted outcomes and recording requests.
    pub(crate) struct MockHttpClient {
        outcomes: Mutex<VecDeque<Result<ResponseSpec, HttpClientError>>>,
        fallback: Result<ResponseSpec, HttpClientError>,
        delay: Option<Duration>,
        sent: Mutex<Vec<RequestSpec>>,
    }

    impl MockHttpClient {
        pub(crate) fn always(response: ResponseSpec) -> Self {
            Self::scripted(Vec::new(), Ok(response))
        }

        pub(crate) fn failing(error: HttpClientError) -> Self {
            Self::scripted(Vec::new(), Err(error))
        }

        pub(crate) fn scripted(
            outcomes: Vec<Result<ResponseSpec, HttpClientError>>,
            fallback: Result<ResponseSpec, HttpClientError>,
        ) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                fallback,
                delay: None,
                sent: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn sent(&self) -> Vec<RequestSpec> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    impl HttpClient for MockHttpClient {
        fn execute<'a>(&'a self, request: &'a RequestSpec) -> HttpFuture<'a> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(request.clone());
            }
            let outcome = self
                .outcomes
                .lock()
                .ok()
                .and_then(|mut queue| queue.pop_front())
                .unwrap_or_else(|| self.fallback.clone());
            let delay = self.delay;
            Box::pin(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                outcome
            })
        }
    }

    fn config() -> HarnessConfig {
        HarnessConfig {
            endpoint: Some("https://jsonplaceholder.typicode.com".to_string()),
            default_headers: Headers::new()
                .with("Accept", "text/html")
                .with("User-Agent", "probe"),
            ..HarnessConfig::default()
        }
    }

    fn executor(client: &Arc<MockHttpClient>, config: HarnessConfig) -> RequestExecutor {
        RequestExecutor::new(client.clone(), Arc::new(config))
    }

    #[test]
    fn test_header_precedence() {
        let client = Arc::new(MockHttpClient::always(ResponseSpec::text(200, "")));
        let executor = executor(&client, config());
        let session = Headers::new()
            .with("accept", "application/json")
            .with("X-Trace", "session");
        let request = RequestSpec::get("/posts").with_header("X-TRACE", "request");

        let prepared = executor.prepare(&request, &session).unwrap();
        assert_eq!(prepared.headers.get("Accept"), Some("application/json"));
        assert_eq!(prepared.headers.get("x-trace"), Some("request"));
        assert_eq!(prepared.headers.get("User-Agent"), Some("probe"));
        assert_eq!(prepared.url, "https://jsonplaceholder.typicode.com/posts");
        assert_eq!(prepared.timeout_ms, Some(60_000));
    }

    #[test]
    fn test_json_body_sets_content_type_once() {
        let client = Arc::new(MockHttpClient::always(ResponseSpec::text(200, "")));
        let executor = executor(&client, config());

        let request = RequestSpec::post("/posts", json!({"title": "Test Post"}));
        let prepared = executor.prepare(&request, &Headers::new()).unwrap();
        assert_eq!(prepared.headers.get("content-type"), Some("application/json"));

        let session = Headers::new().with("Content-Type", "application/json; charset=UTF-8");
        let prepared = executor.prepare(&request, &session).unwrap();
        assert_eq!(
            prepared.headers.get("content-type"),
            Some("application/json; charset=UTF-8")
        );
    }

    #[test]
    fn test_relative_url_without_endpoint() {
        let client = Arc::new(MockHttpClient::always(ResponseSpec::text(200, "")));
        let executor = executor(&client, HarnessConfig::default());
        let result = executor.prepare(&RequestSpec::get("/"), &Headers::new());
        assert!(matches!(result, Err(HarnessError::Domain(_))));
    }

    #[tokio::test]
    async fn test_error_status_is_a_normal_response() {
        let client = Arc::new(MockHttpClient::always(ResponseSpec::json(
            404,
            json!({"message": "Not Found"}),
        )));
        let executor = executor(&client, config());

        let response = executor
            .send(&RequestSpec::get("/posts/999"), &Headers::new())
            .await;
        assert_eq!(response.map(|r| r.status), Ok(404));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_timeout_error() {
        let client = Arc::new(
            MockHttpClient::always(ResponseSpec::text(200, "late"))
                .with_delay(Duration::from_secs(5)),
        );
        let executor = executor(&client, config());

        let request = RequestSpec::get("/slow").with_timeout_ms(100);
        let result = executor.send(&request, &Headers::new()).await;
        assert_eq!(result, Err(HarnessError::Timeout { timeout_ms: 100 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_idempotent_request_when_enabled() {
        let client = Arc::new(MockHttpClient::scripted(
            vec![
                Err(HttpClientError::ConnectionFailed("reset".into())),
                Err(HttpClientError::ConnectionFailed("reset".into())),
            ],
            Ok(ResponseSpec::json(200, json!({"id": 1}))),
        ));
        let mut config = config();
        config.plugins.retry_failed_step = RetryFailedStepConfig {
            enabled: true,
            retries: 2,
            delay_ms: 10,
            backoff_factor: 1.0,
            max_delay_ms: 10,
        };
        let executor = executor(&client, config);

        let response = executor
            .send_with_retry(&RequestSpec::get("/posts/1"), &Headers::new(), None)
            .await;
        assert_eq!(response.map(|r| r.status), Ok(200));
        assert_eq!(client.sent().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_is_not_retried_automatically() {
        let client = Arc::new(MockHttpClient::failing(HttpClientError::ConnectionFailed(
            "reset".into(),
        )));
        let mut config = config();
        config.plugins.retry_failed_step.enabled = true;
        let executor = executor(&client, config);

        let request = RequestSpec::post("/posts", json!({"title": "x"}));
        assert_eq!(request.method, HttpMethod::Post);
        let result = executor.send_with_retry(&request, &Headers::new(), None).await;
        assert!(matches!(result, Err(HarnessError::Network(_))));
        assert_eq!(client.sent().len(), 1);

        let forced = request.with_retry(RetryMode::Always);
        let _ = executor.send_with_retry(&forced, &Headers::new(), None).await;
        assert_eq!(client.sent().len(), 1 + 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_policy_replaces_plugin_budget() {
        let reset = || HttpClientError::ConnectionFailed("reset".into());
        let client = Arc::new(MockHttpClient::failing(reset()));
        let mut config = config();
        config.plugins.retry_failed_step.enabled = true;
        config.plugins.retry_failed_step.retries = 5;
        let executor = executor(&client, config);

        let policy = RetryPolicy::fixed(2, 10);
        let result = executor
            .send_with_retry(&RequestSpec::get("/posts/1"), &Headers::new(), Some(&policy))
            .await;
        assert!(matches!(result, Err(HarnessError::Network(_))));
        assert_eq!(client.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_policy_retries_with_plugin_disabled() {
        let scripted = || {
            Arc::new(MockHttpClient::scripted(
                vec![Err(HttpClientError::ConnectionFailed("reset".into()))],
                Ok(ResponseSpec::json(200, json!({"id": 1}))),
            ))
        };
        let request = RequestSpec::get("/posts/1");

        let plain_client = scripted();
        let plain = executor(&plain_client, config());
        let result = plain.send_with_retry(&request, &Headers::new(), None).await;
        assert!(matches!(result, Err(HarnessError::Network(_))));
        assert_eq!(plain_client.sent().len(), 1);

        let retrying_client = scripted();
        let retrying = executor(&retrying_client, config());
        let policy = RetryPolicy::fixed(3, 10);
        let result = retrying
            .send_with_retry(&request, &Headers::new(), Some(&policy))
            .await;
        assert_eq!(result.map(|r| r.status), Ok(200));
        assert_eq!(retrying_client.sent().len(), 2);
    }
}

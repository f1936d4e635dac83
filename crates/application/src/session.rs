//! Per-scenario step context.

use std::sync::Arc;

use probe_domain::{Headers, RequestSpec, ResponseSpec, RetryPolicy, StepResult};
use serde_json::Value;

use crate::executor::RequestExecutor;

/// The actor a scenario drives: holds the headers set by before-hooks and
/// sends requests on the scenario's behalf.
///
/// A session keeps no response. Each send returns its [`ResponseSpec`] and
/// assertions run against that value:
///
/// ```ignore
/// let response = i.send_get("https://jsonplaceholder.typicode.com/posts/1").await?;
/// response.expect().status_successful()?.contains_json(&json!({"id": 1}))?;
/// ```
pub struct Session {
    executor: Arc<RequestExecutor>,
    headers: Headers,
    retry: Option<RetryPolicy>,
}

impl Session {
    /// Creates a session with no headers of its own.
    #[must_use]
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self {
            executor,
            headers: Headers::new(),
            retry: None,
        }
    }

    /// Uses `policy` instead of the retry plugin settings.
    #[must_use]
    pub const fn with_retry(mut self, policy: Option<RetryPolicy>) -> Self {
        self.retry = policy;
        self
    }

    /// Adds headers to every following request of this scenario.
    ///
    /// Existing names are replaced, case-insensitively.
    pub fn have_request_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.set(name, value);
        }
    }

    /// Headers set on this session so far.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Sends an arbitrary request.
    ///
    /// # Errors
    ///
    /// Returns a network, timeout or URL error; error statuses are not errors.
    pub async fn send(&self, request: &RequestSpec) -> StepResult<ResponseSpec> {
        self.executor
            .send_with_retry(request, &self.headers, self.retry.as_ref())
            .await
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_get(&self, url: &str) -> StepResult<ResponseSpec> {
        self.send(&RequestSpec::get(url)).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_post(&self, url: &str, body: Value) -> StepResult<ResponseSpec> {
        self.send(&RequestSpec::post(url, body)).await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_put(&self, url: &str, body: Value) -> StepResult<ResponseSpec> {
        self.send(&RequestSpec::put(url, body)).await
    }

    /// Sends a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_patch(&self, url: &str, body: Value) -> StepResult<ResponseSpec> {
        self.send(&RequestSpec::patch(url, body)).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub async fn send_delete(&self, url: &str) -> StepResult<ResponseSpec> {
        self.send(&RequestSpec::delete(url)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::executor::tests::MockHttpClient;
    use pretty_assertions::assert_eq;
    use probe_domain::HttpMethod;
    use serde_json::json;

    fn session(client: &Arc<MockHttpClient>) -> Session {
        let config = HarnessConfig {
            endpoint: Some("https://jsonplaceholder.typicode.com".to_string()),
            ..HarnessConfig::default()
        };
        Session::new(Arc::new(RequestExecutor::new(
            client.clone(),
            Arc::new(config),
        )))
    }

    #[tokio::test]
    async fn test_session_headers_apply_to_later_requests() {
        let client = Arc::new(MockHttpClient::always(ResponseSpec::json(200, json!([]))));
        let mut i = session(&client);

        i.have_request_headers([("Content-Type", "application/json; charset=UTF-8")]);
        i.have_request_headers([("content-type", "application/json")]);
        i.send_get("/posts").await.unwrap();

        let sent = client.sent();
        assert_eq!(sent[0].headers.get("Content-Type"), Some("application/json"));
        assert_eq!(i.headers().len(), 1);
    }

    #[tokio::test]
    async fn test_verb_helpers() {
        let client = Arc::new(MockHttpClient::always(ResponseSpec::json(200, json!({}))));
        let i = session(&client);

        i.send_post("/posts", json!({"title": "a"})).await.unwrap();
        i.send_put("/posts/1", json!({"id": 1})).await.unwrap();
        i.send_patch("/posts/1", json!({"title": "b"})).await.unwrap();
        i.send_delete("/posts/1").await.unwrap();

        let methods: Vec<_> = client.sent().iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Post,
                HttpMethod::Put,
                HttpMethod::Patch,
                HttpMethod::Delete
            ]
        );
        assert_eq!(client.sent()[2].body, Some(json!({"title": "b"})));
    }

    #[tokio::test]
    async fn test_each_step_gets_its_own_response() {
        let client = Arc::new(MockHttpClient::scripted(
            vec![
                Ok(ResponseSpec::json(404, json!({}))),
                Ok(ResponseSpec::json(200, json!({"id": 1}))),
            ],
            Ok(ResponseSpec::text(500, "")),
        ));
        let i = session(&client);

        let missing = i.send_get("/posts/999").await.unwrap();
        let found = i.send_get("/posts/1").await.unwrap();
        assert!(missing.expect().status_code(404).is_ok());
        assert!(found.expect().status_code(200).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_retry_policy_is_used() {
        let client = Arc::new(MockHttpClient::failing(
            crate::ports::HttpClientError::ConnectionFailed("reset".into()),
        ));
        let i = session(&client).with_retry(Some(RetryPolicy::fixed(4, 5)));

        assert!(i.send_get("/posts/1").await.is_err());
        assert_eq!(client.sent().len(), 4);
    }
}

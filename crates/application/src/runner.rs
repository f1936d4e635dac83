//! Scenario runner
//!
//! Executes features in order, one scenario at a time. A scenario's failure
//! is recorded in its report and never stops the run.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use probe_domain::{
    HarnessError, RetryPolicy, RunReport, ScenarioReport, ScenarioStatus, StepResult,
};

use crate::config::HarnessConfig;
use crate::executor::RequestExecutor;
use crate::ports::HttpClient;
use crate::session::Session;

/// Boxed future borrowing the session for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A hook or scenario body.
///
/// Written as `|i| Box::pin(async move { ... })`.
pub type StepFn = Arc<dyn for<'a> Fn(&'a mut Session) -> BoxFuture<'a, StepResult> + Send + Sync>;

/// One named test case.
#[derive(Clone)]
pub struct Scenario {
    name: String,
    skip: bool,
    retry: Option<RetryPolicy>,
    before: Option<StepFn>,
    body: StepFn,
}

impl Scenario {
    /// Creates a scenario running `body`.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: for<'a> Fn(&'a mut Session) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            skip: false,
            retry: None,
            before: None,
            body: Arc::new(body),
        }
    }

    /// Runs `hook` before the body, after any feature-level hooks.
    #[must_use]
    pub fn with_before<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Session) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Marks the scenario as skipped.
    #[must_use]
    pub const fn skipped(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Retries failed steps with `policy`, whatever the retry plugin says.
    #[must_use]
    pub const fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario-level retry policy, if any.
    #[must_use]
    pub const fn retry(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Returns true if the scenario will be skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        self.skip
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("skip", &self.skip)
            .field("retry", &self.retry)
            .field("has_before", &self.before.is_some())
            .finish_non_exhaustive()
    }
}

/// A named group of scenarios sharing before-hooks.
#[derive(Clone, Default)]
pub struct Feature {
    name: String,
    before: Vec<StepFn>,
    scenarios: Vec<Scenario>,
}

impl Feature {
    /// Creates an empty feature.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: Vec::new(),
            scenarios: Vec::new(),
        }
    }

    /// Adds a hook run before every scenario of this feature.
    #[must_use]
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Session) -> BoxFuture<'a, StepResult> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Appends a scenario.
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenarios in declaration order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name)
            .field("hooks", &self.before.len())
            .field("scenarios", &self.scenarios)
            .finish()
    }
}

/// Runs features sequentially and collects a [`RunReport`].
pub struct ScenarioRunner {
    executor: Arc<RequestExecutor>,
    config: Arc<HarnessConfig>,
    grep: Option<String>,
}

impl ScenarioRunner {
    /// Creates a runner sending through `client`.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, config: Arc<HarnessConfig>) -> Self {
        Self {
            executor: Arc::new(RequestExecutor::new(client, config.clone())),
            config,
            grep: None,
        }
    }

    /// Only runs scenarios whose feature or scenario name contains
    /// `pattern`, ignoring case. Others are reported as skipped.
    #[must_use]
    pub fn with_grep(mut self, pattern: impl Into<String>) -> Self {
        self.grep = Some(pattern.into()).filter(|p| !p.is_empty());
        self
    }

    /// Returns true if `scenario` passes the grep filter.
    #[must_use]
    pub fn selects(&self, feature: &Feature, scenario: &Scenario) -> bool {
        self.grep.as_ref().is_none_or(|pattern| {
            let pattern = pattern.to_lowercase();
            feature.name.to_lowercase().contains(&pattern)
                || scenario.name.to_lowercase().contains(&pattern)
        })
    }

    /// Runs every scenario of every feature, in order.
    pub async fn run(&self, features: &[Feature]) -> RunReport {
        let started = Instant::now();
        let mut reports = Vec::new();

        for feature in features {
            tracing::info!(feature = %feature.name, scenarios = feature.scenarios.len(), "feature");
            for scenario in &feature.scenarios {
                reports.push(self.run_scenario(feature, scenario).await);
            }
        }

        let report = RunReport::new(self.config.name.clone(), reports, elapsed_ms(started));
        tracing::info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            duration_ms = report.duration_ms,
            "run finished"
        );
        report
    }

    async fn run_scenario(&self, feature: &Feature, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        let mut status = ScenarioStatus::Pending;

        if scenario.skip || !self.selects(feature, scenario) {
            advance(&mut status, ScenarioStatus::Skipped);
            tracing::info!(feature = %feature.name, scenario = %scenario.name, "skipped");
            return report(feature, scenario, status, None, started);
        }

        advance(&mut status, ScenarioStatus::Running);
        tracing::info!(feature = %feature.name, scenario = %scenario.name, "started");

        let mut session = Session::new(self.executor.clone()).with_retry(scenario.retry);
        let work = execute(feature, scenario, &mut session);
        let outcome = match self.config.scenario_timeout_ms {
            Some(timeout_ms) => tokio::time::timeout(Duration::from_millis(timeout_ms), work)
                .await
                .unwrap_or(Err(HarnessError::Timeout { timeout_ms })),
            None => work.await,
        };

        match outcome {
            Ok(()) => {
                advance(&mut status, ScenarioStatus::Passed);
                tracing::info!(
                    feature = %feature.name,
                    scenario = %scenario.name,
                    duration_ms = elapsed_ms(started),
                    "passed"
                );
                report(feature, scenario, status, None, started)
            }
            Err(error) => {
                advance(&mut status, ScenarioStatus::Failed);
                let message = format!("{}: {error}", error.kind());
                tracing::warn!(
                    feature = %feature.name,
                    scenario = %scenario.name,
                    reason = %message,
                    "failed"
                );
                report(feature, scenario, status, Some(message), started)
            }
        }
    }
}

/// Feature hooks, then the scenario hook, then the body; stops at the first error.
async fn execute(feature: &Feature, scenario: &Scenario, session: &mut Session) -> StepResult {
    for hook in feature.before.iter().chain(scenario.before.iter()) {
        hook(&mut *session).await?;
    }
    (scenario.body)(&mut *session).await
}

fn advance(status: &mut ScenarioStatus, next: ScenarioStatus) {
    match status.transition(next) {
        Ok(moved) => *status = moved,
        Err(error) => tracing::error!(%error, "scenario lifecycle"),
    }
}

fn report(
    feature: &Feature,
    scenario: &Scenario,
    status: ScenarioStatus,
    failure_message: Option<String>,
    started: Instant,
) -> ScenarioReport {
    ScenarioReport {
        scenario_name: scenario.name.clone(),
        feature_name: feature.name.clone(),
        status,
        failure_message,
        duration_ms: elapsed_ms(started),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::executor::tests::MockHttpClient;
    use crate::ports::HttpClientError;
    use pretty_assertions::assert_eq;
    use probe_domain::{Field, ResponseSpec, RunStatus, Schema};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn runner(client: MockHttpClient, config: HarnessConfig) -> ScenarioRunner {
        ScenarioRunner::new(Arc::new(client), Arc::new(config))
    }

    fn post_schema() -> Schema {
        Schema::object([
            ("userId", Field::required(Schema::number())),
            ("id", Field::required(Schema::number())),
            ("title", Field::required(Schema::string())),
            ("body", Field::required(Schema::string())),
        ])
    }

    fn post() -> ResponseSpec {
        ResponseSpec::json(
            200,
            json!({
                "userId": 1,
                "id": 1,
                "title": "sunt aut facere repellat provident occaecati excepturi optio reprehenderit",
                "body": "quia et suscipit"
            }),
        )
    }

    #[tokio::test]
    async fn test_get_specific_post_passes() {
        let feature = Feature::new("JSONPlaceholder API")
            .before(|i| {
                Box::pin(async move {
                    i.have_request_headers([("Content-Type", "application/json; charset=UTF-8")]);
                    Ok(())
                })
            })
            .scenario(Scenario::new("get specific post", |i| {
                Box::pin(async move {
                    let response = i
                        .send_get("https://jsonplaceholder.typicode.com/posts/1")
                        .await?;
                    response
                        .expect()
                        .status_successful()?
                        .matches_schema(&post_schema())?
                        .contains_json(&json!({"userId": 1, "id": 1}))?;
                    Ok(())
                })
            }));

        let report = runner(MockHttpClient::always(post()), HarnessConfig::default())
            .run(&[feature])
            .await;

        assert_eq!(report.status, RunStatus::Passed);
        assert_eq!(report.scenarios[0].status, ScenarioStatus::Passed);
        assert_eq!(report.scenarios[0].feature_name, "JSONPlaceholder API");
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_run() {
        let feature = Feature::new("JSONPlaceholder API")
            .scenario(Scenario::new("create new post", |i| {
                Box::pin(async move {
                    let response = i
                        .send_post("https://jsonplaceholder.typicode.com/posts", json!({}))
                        .await?;
                    response.expect().status_code(201)?;
                    Ok(())
                })
            }))
            .scenario(Scenario::new("get specific post", |i| {
                Box::pin(async move {
                    i.send_get("https://jsonplaceholder.typicode.com/posts/1")
                        .await?
                        .expect()
                        .status_code(200)?;
                    Ok(())
                })
            }));

        let report = runner(MockHttpClient::always(post()), HarnessConfig::default())
            .run(&[feature])
            .await;

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.failed, 1);
        assert_eq!(report.passed, 1);
        let message = report.scenarios[0].failure_message.clone().unwrap();
        assert!(message.starts_with("AssertionError"), "{message}");
        assert!(message.contains("201") && message.contains("200"), "{message}");
    }

    #[tokio::test]
    async fn test_before_hook_failure_skips_body() {
        static BODY_RAN: AtomicBool = AtomicBool::new(false);
        let feature = Feature::new("GitHub API").scenario(
            Scenario::new("get GitHub user information", |_| {
                Box::pin(async move {
                    BODY_RAN.store(true, Ordering::SeqCst);
                    Ok(())
                })
            })
            .with_before(|i| {
                Box::pin(async move {
                    i.send_get("https://api.github.com/").await?;
                    Ok(())
                })
            }),
        );

        let client = MockHttpClient::failing(HttpClientError::DnsError {
            host: "api.github.com".to_string(),
            message: "no record".to_string(),
        });
        let report = runner(client, HarnessConfig::default()).run(&[feature]).await;

        assert_eq!(report.scenarios[0].status, ScenarioStatus::Failed);
        assert!(!BODY_RAN.load(Ordering::SeqCst));
        assert!(
            report.scenarios[0]
                .failure_message
                .as_deref()
                .unwrap()
                .starts_with("NetworkError")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_timeout() {
        let feature = Feature::new("YouTube Website").scenario(Scenario::new(
            "access YouTube homepage",
            |i| {
                Box::pin(async move {
                    i.send_get("https://www.youtube.com/").await?;
                    Ok(())
                })
            },
        ));
        let client = MockHttpClient::always(ResponseSpec::text(200, "<html>"))
            .with_delay(Duration::from_secs(30));
        let config = HarnessConfig {
            scenario_timeout_ms: Some(1000),
            ..HarnessConfig::default()
        };

        let report = runner(client, config).run(&[feature]).await;

        assert_eq!(report.scenarios[0].status, ScenarioStatus::Failed);
        assert_eq!(
            report.scenarios[0].failure_message.as_deref(),
            Some("TimeoutError: timed out after 1000ms")
        );
    }

    #[tokio::test]
    async fn test_skip_and_grep() {
        let ok = |name: &str| Scenario::new(name, |_| Box::pin(async move { Ok(()) }));
        let features = [
            Feature::new("REST Countries API")
                .scenario(ok("get all countries").skipped(true))
                .scenario(ok("get country by code - Germany (DE)")),
            Feature::new("GitHub API").scenario(ok("get GitHub API rate limit")),
        ];

        let report = runner(MockHttpClient::always(post()), HarnessConfig::default())
            .with_grep("germany")
            .run(&features)
            .await;

        let statuses: Vec<_> = report.scenarios.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                ScenarioStatus::Skipped,
                ScenarioStatus::Passed,
                ScenarioStatus::Skipped
            ]
        );
        assert_eq!(report.status, RunStatus::Passed);
    }

    #[tokio::test]
    async fn test_fresh_session_per_scenario() {
        let feature = Feature::new("JSONPlaceholder API")
            .scenario(Scenario::new("sets header", |i| {
                Box::pin(async move {
                    i.have_request_headers([("X-Leak", "1")]);
                    Ok(())
                })
            }))
            .scenario(Scenario::new("sees no header", |i| {
                Box::pin(async move {
                    if i.headers().contains("x-leak") {
                        return Err(HarnessError::Step("header leaked".into()));
                    }
                    Ok(())
                })
            }));

        let report = runner(MockHttpClient::always(post()), HarnessConfig::default())
            .run(&[feature])
            .await;
        assert!(report.all_passed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_retry_budget_overrides_config() {
        fn get_post(i: &mut Session) -> BoxFuture<'_, StepResult> {
            Box::pin(async move {
                i.send_get("https://jsonplaceholder.typicode.com/posts/1")
                    .await?
                    .expect()
                    .status_successful()?;
                Ok(())
            })
        }
        let feature = Feature::new("JSONPlaceholder API")
            .scenario(Scenario::new("short budget", get_post).with_retry(RetryPolicy::fixed(2, 10)))
            .scenario(Scenario::new("plugin budget", get_post));

        let reset = || Err(HttpClientError::ConnectionFailed("reset".into()));
        let client = Arc::new(MockHttpClient::scripted(
            vec![reset(), reset(), reset()],
            Ok(post()),
        ));
        let mut config = HarnessConfig::default();
        config.plugins.retry_failed_step.enabled = true;
        config.plugins.retry_failed_step.retries = 5;
        config.plugins.retry_failed_step.delay_ms = 10;

        let report = ScenarioRunner::new(client.clone(), Arc::new(config))
            .run(&[feature])
            .await;

        assert_eq!(report.scenarios[0].status, ScenarioStatus::Failed);
        assert_eq!(report.scenarios[1].status, ScenarioStatus::Passed);
        assert_eq!(client.sent().len(), 2 + 2);
    }
}

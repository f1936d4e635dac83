//! Serde model of a scenario file.

use std::collections::BTreeMap;

use probe_domain::{Assertion, Headers, RequestSpec, RetryPolicy, Schema};
use serde::Deserialize;

/// One feature per file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteDocument {
    /// Feature name.
    pub feature: String,
    /// Hook run before every scenario of the file.
    #[serde(default)]
    pub before: Option<HookDocument>,
    /// Named schemas, referenced as `{ type: ref, name: ... }`.
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
    /// Scenarios in execution order.
    #[serde(default)]
    pub scenarios: Vec<ScenarioDocument>,
}

/// A before-hook: headers for the session, then optional steps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookDocument {
    /// Headers added to the session.
    #[serde(default)]
    pub headers: Headers,
    /// Steps run after the headers are set.
    #[serde(default)]
    pub steps: Vec<StepDocument>,
}

/// A named scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDocument {
    /// Scenario name.
    pub name: String,
    /// Report as skipped without running.
    #[serde(default)]
    pub skip: bool,
    /// Retry budget for this scenario's steps, replacing the retry plugin's.
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    /// Hook run after the feature hook.
    #[serde(default)]
    pub before: Option<HookDocument>,
    /// Steps run in order.
    #[serde(default)]
    pub steps: Vec<StepDocument>,
}

/// One request and the checks on its response.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDocument {
    /// Request to send.
    pub request: RequestSpec,
    /// Checks on this step's response only.
    #[serde(default)]
    pub expect: Vec<Assertion>,
}

impl SuiteDocument {
    /// Replaces every schema reference with its definition.
    ///
    /// # Errors
    ///
    /// Returns the unknown or cyclic schema name.
    pub fn resolve_schemas(&mut self) -> Result<(), String> {
        let registry = self.schemas.clone();
        let hooks = self
            .before
            .iter_mut()
            .chain(self.scenarios.iter_mut().filter_map(|s| s.before.as_mut()));
        for hook in hooks {
            resolve_steps(&mut hook.steps, &registry)?;
        }
        for scenario in &mut self.scenarios {
            resolve_steps(&mut scenario.steps, &registry)?;
        }
        Ok(())
    }
}

fn resolve_steps(
    steps: &mut [StepDocument],
    registry: &BTreeMap<String, Schema>,
) -> Result<(), String> {
    for assertion in steps.iter_mut().flat_map(|step| step.expect.iter_mut()) {
        assertion.resolve_schemas(registry)?;
    }
    Ok(())
}

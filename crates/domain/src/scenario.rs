//! Scenario lifecycle and run results.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Lifecycle state of one scenario.
///
/// `Pending -> Running -> {Passed, Failed}`, or `Pending -> Skipped`.
/// Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Registered, not yet selected.
    #[default]
    Pending,
    /// Hooks or body executing.
    Running,
    /// Body completed without failure.
    Passed,
    /// A hook or step failed.
    Failed,
    /// Not executed.
    Skipped,
}

impl ScenarioStatus {
    /// Returns true for `Passed`, `Failed` and `Skipped`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }

    /// Moves to `next` if the lifecycle allows it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` for any other move,
    /// including every move out of a terminal state.
    pub fn transition(self, next: Self) -> DomainResult<Self> {
        let allowed = matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Skipped)
                | (Self::Running, Self::Passed | Self::Failed)
        );
        if allowed {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Returns the status as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scenario, as handed to reporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub scenario_name: String,
    /// Name of the feature the scenario belongs to.
    pub feature_name: String,
    /// Terminal status.
    pub status: ScenarioStatus,
    /// Failure reason, for failed scenarios.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    /// Wall-clock time spent, hooks included.
    pub duration_ms: u64,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No scenario failed.
    Passed,
    /// At least one scenario failed.
    Failed,
}

/// Results of every scenario in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// Suite name from configuration.
    pub name: String,
    /// Per-scenario outcomes in execution order.
    pub scenarios: Vec<ScenarioReport>,
    /// Total scenarios.
    pub total: usize,
    /// Scenarios that passed.
    pub passed: usize,
    /// Scenarios that failed.
    pub failed: usize,
    /// Scenarios that were skipped.
    pub skipped: usize,
    /// Failed if any scenario failed.
    pub status: RunStatus,
    /// Execution time in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Builds a report, computing totals and the aggregate status.
    #[must_use]
    pub fn new(name: impl Into<String>, scenarios: Vec<ScenarioReport>, duration_ms: u64) -> Self {
        let count = |status| scenarios.iter().filter(|s| s.status == status).count();
        let passed = count(ScenarioStatus::Passed);
        let failed = count(ScenarioStatus::Failed);
        let skipped = count(ScenarioStatus::Skipped);
        Self {
            run_id: Uuid::now_v7(),
            name: name.into(),
            total: scenarios.len(),
            passed,
            failed,
            skipped,
            status: if failed == 0 {
                RunStatus::Passed
            } else {
                RunStatus::Failed
            },
            scenarios,
            duration_ms,
        }
    }

    /// Check if no scenario failed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        matches!(self.status, RunStatus::Passed)
    }
}

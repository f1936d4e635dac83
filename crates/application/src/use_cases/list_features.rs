//! List features use case.

use crate::error::ApplicationResult;
use crate::ports::FeatureSource;

/// One feature and the names of its scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSummary {
    /// Feature name.
    pub name: String,
    /// Scenario names, with a flag for skipped ones.
    pub scenarios: Vec<(String, bool)>,
}

/// Lists the features matched by a tests pattern without running them.
pub struct ListFeatures<S: FeatureSource> {
    source: S,
}

impl<S: FeatureSource> ListFeatures<S> {
    /// Creates a new `ListFeatures` use case.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Loads and summarizes every feature matching `pattern`.
    ///
    /// # Errors
    /// Returns an error if scenario files cannot be loaded.
    pub async fn execute(&self, pattern: &str) -> ApplicationResult<Vec<FeatureSummary>> {
        let features = self.source.load(pattern).await?;
        Ok(features
            .iter()
            .map(|feature| FeatureSummary {
                name: feature.name().to_string(),
                scenarios: feature
                    .scenarios()
                    .iter()
                    .map(|s| (s.name().to_string(), s.is_skipped()))
                    .collect(),
            })
            .collect())
    }
}

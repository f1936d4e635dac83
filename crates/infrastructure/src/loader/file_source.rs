//! Scenario files on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use probe_application::ports::{FeatureSource, LoadError};
use probe_application::{Feature, Scenario, Session};
use probe_domain::StepResult;

use super::document::{HookDocument, StepDocument, SuiteDocument};

/// Loads YAML or JSON scenario files matched by a glob pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFeatureSource;

impl FileFeatureSource {
    /// Creates a new file source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FeatureSource for FileFeatureSource {
    async fn load(&self, pattern: &str) -> Result<Vec<Feature>, LoadError> {
        load_features(pattern).await
    }
}

/// Expands `pattern`, then parses every matching file in path order.
///
/// # Errors
///
/// Returns the first pattern, read, parse or schema-reference error.
pub async fn load_features(pattern: &str) -> Result<Vec<Feature>, LoadError> {
    let paths = expand(pattern)?;
    if paths.is_empty() {
        tracing::warn!(pattern, "no scenario files matched");
    }

    let mut features = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
        features.push(parse_feature(&path, &content)?);
        tracing::debug!(path = %path.display(), "loaded scenario file");
    }
    Ok(features)
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let entries = glob::glob(pattern).map_err(|e| LoadError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LoadError::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parses one scenario file into a runnable feature.
///
/// `.json` files are read as JSON, everything else as YAML.
///
/// # Errors
///
/// Returns `LoadError::Parse` for malformed documents and
/// `LoadError::UnknownSchema` for dangling schema references.
pub fn parse_feature(path: &Path, content: &str) -> Result<Feature, LoadError> {
    parse_document(path, content).map(into_feature)
}

/// Parses and resolves one scenario file without building runnable steps.
///
/// YAML checks use the single-key map form (`status_code: 404`), the same
/// shape JSON files use.
///
/// # Errors
///
/// See [`parse_feature`].
pub fn parse_document(path: &Path, content: &str) -> Result<SuiteDocument, LoadError> {
    let parse_error = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let mut document: SuiteDocument = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
    } else {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(
            content,
        ))
        .map_err(|e| parse_error(e.to_string()))?
    };

    document
        .resolve_schemas()
        .map_err(|name| LoadError::UnknownSchema {
            path: path.to_path_buf(),
            name,
        })?;

    Ok(document)
}

fn into_feature(document: SuiteDocument) -> Feature {
    let mut feature = Feature::new(document.feature);

    if let Some(hook) = document.before {
        let hook = Arc::new(hook);
        feature = feature.before(move |i| {
            let hook = hook.clone();
            Box::pin(async move { run_hook(i, &hook).await })
        });
    }

    for doc in document.scenarios {
        let steps = Arc::new(doc.steps);
        let mut scenario = Scenario::new(doc.name, move |i| {
            let steps = steps.clone();
            Box::pin(async move { run_steps(i, &steps).await })
        })
        .skipped(doc.skip);

        if let Some(policy) = doc.retry {
            scenario = scenario.with_retry(policy);
        }

        if let Some(hook) = doc.before {
            let hook = Arc::new(hook);
            scenario = scenario.with_before(move |i| {
                let hook = hook.clone();
                Box::pin(async move { run_hook(i, &hook).await })
            });
        }
        feature = feature.scenario(scenario);
    }
    feature
}

async fn run_hook(session: &mut Session, hook: &HookDocument) -> StepResult {
    session.have_request_headers(
        hook.headers
            .iter()
            .map(|h| (h.name.clone(), h.value.clone())),
    );
    run_steps(session, &hook.steps).await
}

async fn run_steps(session: &Session, steps: &[StepDocument]) -> StepResult {
    for (index, step) in steps.iter().enumerate() {
        let response = session.send(&step.request).await?;
        for assertion in &step.expect {
            assertion.evaluate(&response)?;
            tracing::debug!(step = index + 1, check = %assertion.description(), "ok");
        }
    }
    Ok(())
}

//! Loads the scenario files and configuration shipped at the workspace root.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use probe_application::HarnessConfig;
use probe_domain::ResponseSpec;
use probe_infrastructure::{load_features, parse_document};
use serde_json::json;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

#[tokio::test]
async fn test_bundled_scenarios_parse() {
    let pattern = workspace_root().join("scenarios/*.yaml");
    let features = load_features(&pattern.to_string_lossy()).await.unwrap();

    let summary: Vec<_> = features
        .iter()
        .map(|f| (f.name().to_string(), f.scenarios().len()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GitHub API".to_string(), 5),
            ("JSONPlaceholder API".to_string(), 10),
            ("REST Countries API".to_string(), 9),
            ("YouTube Website".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn test_bundled_config_loads() {
    let root = workspace_root();
    let config = HarnessConfig::from_path(&root.join("probe.yaml")).await.unwrap();

    assert_eq!(config.name, "codeceptjs-api-tests");
    assert!(config.retry_enabled());
    assert!(!config.plugins.screenshot_on_fail.enabled);
    assert_eq!(config.default_headers.len(), 2);
    assert!(config.tests.ends_with("scenarios/*.yaml"));
}

fn country_checks(name: &str) -> Vec<probe_domain::Assertion> {
    let path = workspace_root().join("scenarios/restcountries.yaml");
    let content = std::fs::read_to_string(&path).unwrap();
    let document = parse_document(&path, &content).unwrap();
    let scenario = document
        .scenarios
        .into_iter()
        .find(|s| s.name == name)
        .unwrap();
    scenario.steps.into_iter().flat_map(|step| step.expect).collect()
}

fn passes(checks: &[probe_domain::Assertion], response: &ResponseSpec) -> bool {
    checks.iter().all(|check| check.evaluate(response).is_ok())
}

#[test]
fn test_country_name_checks_tie_code_to_name() {
    let checks = country_checks("get country by name - United States");
    let found = ResponseSpec::json(
        200,
        json!([
            {"cca2": "UM", "name": {"common": "United States Minor Outlying Islands"}},
            {"cca2": "US", "name": {"common": "United States"}}
        ]),
    );
    assert!(passes(&checks, &found));

    let mismatched = ResponseSpec::json(
        200,
        json!([
            {"cca2": "US", "name": {"common": "Somewhere Else"}},
            {"cca2": "UM", "name": {"common": "United States"}}
        ]),
    );
    assert!(!passes(&checks, &mismatched));
}

#[test]
fn test_partial_name_search_checks_names() {
    let checks = country_checks("test partial country name search");
    let found = ResponseSpec::json(
        200,
        json!([
            {"cca2": "TZ", "name": {"common": "Tanzania"}},
            {"cca2": "GB", "name": {"common": "United Kingdom"}}
        ]),
    );
    assert!(passes(&checks, &found));

    let unrelated = ResponseSpec::json(
        200,
        json!([
            {"cca2": "US", "name": {"common": "America"}},
            {"cca2": "GB", "name": {"common": "Britain"}}
        ]),
    );
    assert!(!passes(&checks, &unrelated));
}

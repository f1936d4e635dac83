//! Serializable assertions, as written in scenario files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::AssertionError;
use super::json_path::ComparisonOperator;
use crate::response::ResponseSpec;
use crate::schema::Schema;

/// A check to run against a response.
///
/// Mirrors the methods of [`super::Expect`], except callbacks, which only
/// exist in code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Assertion {
    /// Status equals a code.
    StatusCode(u16),
    /// Status is 2xx.
    StatusSuccessful,
    /// Status matches an exact code, range, or set.
    StatusIn(StatusExpectation),
    /// Keys are present in the body.
    ContainsKeys(Vec<String>),
    /// Body contains a JSON subset.
    ContainsJson(serde_json::Value),
    /// Body satisfies a schema.
    MatchesSchema(Schema),
    /// Header is present.
    HeaderExists(String),
    /// Header value contains text.
    HeaderContains {
        /// Header name (case-insensitive).
        name: String,
        /// Text to search for.
        text: String,
    },
    /// Check JSON path exists and optionally its value.
    JsonPath {
        /// JSONPath expression (e.g., "$.data.id").
        path: String,
        /// Expected value (as JSON).
        #[serde(default)]
        expected: Option<serde_json::Value>,
    },
    /// Check JSON path value matches condition.
    JsonPathMatches {
        /// JSONPath expression.
        path: String,
        /// Comparison operator.
        operator: ComparisonOperator,
        /// Value to compare against.
        value: serde_json::Value,
    },
    /// Check the length of the array, object or string at a path.
    Length {
        /// JSONPath expression; defaults to the whole body.
        #[serde(default = "root_path")]
        path: String,
        /// Comparison operator.
        operator: ComparisonOperator,
        /// Length to compare against.
        value: usize,
    },
    /// Check response time.
    ResponseTime {
        /// Maximum allowed time in milliseconds.
        max_ms: u64,
    },
}

fn root_path() -> String {
    "$".to_string()
}

impl Assertion {
    /// Runs this assertion against `response`.
    ///
    /// # Errors
    ///
    /// Returns the failing check's [`AssertionError`].
    pub fn evaluate(&self, response: &ResponseSpec) -> Result<(), AssertionError> {
        let expect = response.expect();
        let outcome = match self {
            Self::StatusCode(code) => expect.status_code(*code),
            Self::StatusSuccessful => expect.status_successful(),
            Self::StatusIn(expected) => expect.status_in(expected),
            Self::ContainsKeys(keys) => expect.contains_keys(keys),
            Self::ContainsJson(subset) => expect.contains_json(subset),
            Self::MatchesSchema(schema) => expect.matches_schema(schema),
            Self::HeaderExists(name) => expect.header_exists(name),
            Self::HeaderContains { name, text } => expect.header_contains(name, text),
            Self::JsonPath { path, expected } => expect.json_path(path, expected.as_ref()),
            Self::JsonPathMatches {
                path,
                operator,
                value,
            } => expect.json_path_matches(path, *operator, value),
            Self::Length {
                path,
                operator,
                value,
            } => expect.length(path, *operator, *value),
            Self::ResponseTime { max_ms } => expect.response_time(*max_ms),
        };
        outcome.map(|_| ())
    }

    /// Replaces schema references with definitions from `registry`.
    ///
    /// # Errors
    ///
    /// Returns the name of an unknown or cyclic reference.
    pub fn resolve_schemas(&mut self, registry: &BTreeMap<String, Schema>) -> Result<(), String> {
        if let Self::MatchesSchema(schema) = self {
            *schema = schema.resolve(registry)?;
        }
        Ok(())
    }

    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::StatusCode(code) => format!("Status code = {code}"),
            Self::StatusSuccessful => "Status code is successful".to_string(),
            Self::StatusIn(expected) => format!("Status code {}", expected.description()),
            Self::ContainsKeys(keys) => format!("Body contains keys [{}]", keys.join(", ")),
            Self::ContainsJson(subset) => format!("Body contains {subset}"),
            Self::MatchesSchema(schema) => format!("Body matches {} schema", schema.type_name()),
            Self::HeaderExists(name) => format!("Header '{name}' exists"),
            Self::HeaderContains { name, text } => format!("Header '{name}' contains '{text}'"),
            Self::JsonPath {
                path,
                expected: Some(v),
            } => format!("JSON {path} equals {v}"),
            Self::JsonPath {
                path,
                expected: None,
            } => format!("JSON {path} exists"),
            Self::JsonPathMatches {
                path,
                operator,
                value,
            } => format!("JSON {path} {} {value}", operator.symbol()),
            Self::Length {
                path,
                operator,
                value,
            } => format!("Length of {path} {} {value}", operator.symbol()),
            Self::ResponseTime { max_ms } => format!("Response time < {max_ms}ms"),
        }
    }
}

/// Expected status code value or range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StatusExpectation {
    /// Exact status code.
    Exact(u16),
    /// Range of status codes (e.g., 200-299).
    Range {
        /// Minimum status code (inclusive).
        min: u16,
        /// Maximum status code (inclusive).
        max: u16,
    },
    /// One of multiple status codes.
    OneOf(Vec<u16>),
}

impl StatusExpectation {
    /// Check if a status code matches this expectation.
    #[must_use]
    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(expected) => status == *expected,
            Self::Range { min, max } => status >= *min && status <= *max,
            Self::OneOf(codes) => codes.contains(&status),
        }
    }

    /// Get description of the expectation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Exact(code) => format!("= {code}"),
            Self::Range { min, max } => format!("in {min}-{max}"),
            Self::OneOf(codes) => {
                let codes_str: Vec<_> = codes.iter().map(ToString::to_string).collect();
                format!("in [{}]", codes_str.join(", "))
            }
        }
    }

    /// Create a "success" expectation (200-299).
    #[must_use]
    pub const fn success() -> Self {
        Self::Range { min: 200, max: 299 }
    }

    /// Create an exact status expectation.
    #[must_use]
    pub const fn exact(code: u16) -> Self {
        Self::Exact(code)
    }
}

impl Default for StatusExpectation {
    fn default() -> Self {
        Self::success()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_expectation_range() {
        let exp = StatusExpectation::success();
        assert!(exp.matches(200));
        assert!(exp.matches(299));
        assert!(!exp.matches(300));
        assert!(!exp.matches(199));
    }

    #[test]
    fn test_status_expectation_one_of() {
        let exp = StatusExpectation::OneOf(vec![200, 201, 204]);
        assert!(exp.matches(204));
        assert!(!exp.matches(202));
        assert_eq!(exp.description(), "in [200, 201, 204]");
    }

    #[test]
    fn test_parse_yaml_assertions() {
        let yaml = r#"
- status_successful
- status_code: 404
- contains_keys: [message, documentation_url]
- contains_json: { login: octocat }
- length: { operator: equals, value: 100 }
- json_path_matches: { path: "$.rate.limit", operator: greater_than_or_equal, value: 60 }
- matches_schema: { type: array, items: { type: ref, name: post } }
"#;
        let assertions: Vec<Assertion> = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(yaml),
        )
        .unwrap();
        assert_eq!(assertions.len(), 7);
        assert_eq!(assertions[0], Assertion::StatusSuccessful);
        assert_eq!(assertions[1], Assertion::StatusCode(404));
        assert_eq!(
            assertions[4],
            Assertion::Length {
                path: "$".to_string(),
                operator: ComparisonOperator::Equals,
                value: 100,
            }
        );
        assert_eq!(
            assertions[6].description(),
            "Body matches array schema"
        );
    }

    #[test]
    fn test_evaluate() {
        let response = ResponseSpec::json(201, json!({"id": 101, "title": "Test Post"}));
        assert!(Assertion::StatusCode(201).evaluate(&response).is_ok());
        assert!(Assertion::StatusCode(200).evaluate(&response).is_err());
        assert!(
            Assertion::ContainsJson(json!({"id": 101}))
                .evaluate(&response)
                .is_ok()
        );
    }

    #[test]
    fn test_resolve_schemas() {
        let mut registry = BTreeMap::new();
        registry.insert(
            "post".to_string(),
            Schema::object([("id", crate::schema::Field::required(Schema::number()))]),
        );

        let mut assertion = Assertion::MatchesSchema(Schema::reference("post"));
        assertion.resolve_schemas(&registry).unwrap();
        let response = ResponseSpec::json(200, json!({"id": 1}));
        assert!(assertion.evaluate(&response).is_ok());

        let mut unknown = Assertion::MatchesSchema(Schema::reference("user"));
        assert_eq!(unknown.resolve_schemas(&registry), Err("user".to_string()));
    }
}

//! Chainable assertions over one response.

use std::fmt;

use serde_json::Value;

use super::error::AssertionError;
use super::json_path::{self, ComparisonOperator};
use super::subset::contains_subset;
use super::StatusExpectation;
use crate::request::Headers;
use crate::response::{ResponseBody, ResponseSpec};
use crate::schema::{Schema, validate};

/// What a validation callback gets to see.
#[derive(Debug, Clone, Copy)]
pub struct ResponseView<'a> {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: &'a Headers,
    /// Body as JSON; text bodies appear as a JSON string.
    pub data: &'a Value,
}

/// Assertions bound to the response of a single step.
///
/// Every check returns `Ok(self)` on success so checks chain with `?`:
///
/// ```
/// # use probe_domain::response::ResponseSpec;
/// # use serde_json::json;
/// let response = ResponseSpec::json(200, json!({"login": "octocat", "type": "User"}));
/// response
///     .expect()
///     .status_successful()?
///     .contains_keys(["login", "type"])?
///     .contains_json(&json!({"type": "User"}))?;
/// # Ok::<(), probe_domain::assertion::AssertionError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Expect<'r> {
    response: &'r ResponseSpec,
}

impl<'r> Expect<'r> {
    /// Binds assertions to `response`.
    #[must_use]
    pub const fn new(response: &'r ResponseSpec) -> Self {
        Self { response }
    }

    /// The response under test.
    #[must_use]
    pub const fn response(&self) -> &'r ResponseSpec {
        self.response
    }

    /// Status must equal `expected`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Status` naming both codes.
    pub fn status_code(self, expected: u16) -> Result<Self, AssertionError> {
        self.status_in(&StatusExpectation::exact(expected))
    }

    /// Status must be in 200..=299.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Status` otherwise.
    pub fn status_successful(self) -> Result<Self, AssertionError> {
        self.status_in(&StatusExpectation::success())
    }

    /// Status must satisfy `expected`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Status` otherwise.
    pub fn status_in(self, expected: &StatusExpectation) -> Result<Self, AssertionError> {
        if expected.matches(self.response.status) {
            Ok(self)
        } else {
            let expected = match expected {
                StatusExpectation::Exact(code) => code.to_string(),
                other => other.description(),
            };
            Err(AssertionError::Status {
                expected,
                actual: self.response.status,
            })
        }
    }

    /// Every key must be present.
    ///
    /// For an object body the keys are looked up at the top level. For an
    /// array body every element must be an object holding all keys, and an
    /// empty array fails.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::MissingKeys` or `AssertionError::BodyShape`.
    pub fn contains_keys<I, S>(self, keys: I) -> Result<Self, AssertionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys.into_iter().map(|k| k.as_ref().to_string()).collect();
        match self.response.body.as_json() {
            Some(Value::Object(map)) => {
                let missing: Vec<String> =
                    keys.iter().filter(|k| !map.contains_key(*k)).cloned().collect();
                if missing.is_empty() {
                    Ok(self)
                } else {
                    Err(AssertionError::MissingKeys {
                        missing,
                        location: String::new(),
                    })
                }
            }
            Some(Value::Array(items)) if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    let missing: Vec<String> = keys
                        .iter()
                        .filter(|k| item.get(k.as_str()).is_none())
                        .cloned()
                        .collect();
                    if !missing.is_empty() {
                        return Err(AssertionError::MissingKeys {
                            missing,
                            location: format!(" in element {index}"),
                        });
                    }
                }
                Ok(self)
            }
            _ => Err(self.shape_error("object or non-empty array")),
        }
    }

    /// Body must contain `expected` as a deep subset.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::JsonMismatch` at the first difference, or
    /// `AssertionError::BodyShape` for a non-JSON body.
    pub fn contains_json(self, expected: &Value) -> Result<Self, AssertionError> {
        let Some(body) = self.response.body.as_json() else {
            return Err(self.shape_error("value"));
        };
        contains_subset(body, expected).map_err(|m| AssertionError::JsonMismatch {
            path: m.path,
            expected: m.expected,
            actual: m.actual,
        })?;
        Ok(self)
    }

    /// Runs a caller-supplied check over `{status, headers, data}`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Callback` carrying the callback's message.
    pub fn valid_by<F, E>(self, check: F) -> Result<Self, AssertionError>
    where
        F: FnOnce(ResponseView<'_>) -> Result<(), E>,
        E: fmt::Display,
    {
        let data = self.response.body.to_json();
        let view = ResponseView {
            status: self.response.status,
            headers: &self.response.headers,
            data: &data,
        };
        check(view).map_err(|e| AssertionError::Callback(e.to_string()))?;
        Ok(self)
    }

    /// Body must satisfy `schema`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Schema` with every violation found.
    pub fn matches_schema(self, schema: &Schema) -> Result<Self, AssertionError> {
        let report = validate(&self.response.body.to_json(), schema);
        if report.is_valid() {
            Ok(self)
        } else {
            Err(AssertionError::Schema(report))
        }
    }

    /// Header must be present (name is case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Header` if absent.
    pub fn header_exists(self, name: &str) -> Result<Self, AssertionError> {
        if self.response.headers.contains(name) {
            Ok(self)
        } else {
            Err(AssertionError::Header(format!("Header '{name}' not found")))
        }
    }

    /// Header value must contain `text`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Header` if absent or different.
    pub fn header_contains(self, name: &str, text: &str) -> Result<Self, AssertionError> {
        match self.response.headers.get(name) {
            Some(value) if value.contains(text) => Ok(self),
            Some(value) => Err(AssertionError::Header(format!(
                "Header '{name}' value '{value}' does not contain '{text}'"
            ))),
            None => Err(AssertionError::Header(format!("Header '{name}' not found"))),
        }
    }

    /// Value at `path` must exist and, if given, equal `expected`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::JsonPath` if missing, different, or the path
    /// is malformed.
    pub fn json_path(self, path: &str, expected: Option<&Value>) -> Result<Self, AssertionError> {
        let value = self.query(path)?;
        match expected {
            Some(expected) if !ComparisonOperator::Equals.compare(&value, expected) => {
                Err(AssertionError::JsonPath(format!(
                    "JSON path '{path}' value mismatch: expected {expected}, got {value}"
                )))
            }
            _ => Ok(self),
        }
    }

    /// Value at `path` must compare true against `expected`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::JsonPath` on failed comparison.
    pub fn json_path_matches(
        self,
        path: &str,
        operator: ComparisonOperator,
        expected: &Value,
    ) -> Result<Self, AssertionError> {
        let value = self.query(path)?;
        if operator.compare(&value, expected) {
            Ok(self)
        } else {
            Err(AssertionError::JsonPath(format!(
                "JSON path '{path}' comparison failed: {value} {} {expected}",
                operator.symbol()
            )))
        }
    }

    /// Length of the array, string or object at `path` must compare true.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::JsonPath` on failed comparison or if the
    /// value has no length.
    pub fn length(
        self,
        path: &str,
        operator: ComparisonOperator,
        expected: usize,
    ) -> Result<Self, AssertionError> {
        let value = self.query(path)?;
        let actual = match &value {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::String(s) => s.chars().count(),
            other => {
                return Err(AssertionError::JsonPath(format!(
                    "JSON path '{path}' has no length: {other}"
                )));
            }
        };
        if operator.compare(&Value::from(actual), &Value::from(expected)) {
            Ok(self)
        } else {
            Err(AssertionError::JsonPath(format!(
                "JSON path '{path}' length {actual} is not {} {expected}",
                operator.symbol()
            )))
        }
    }

    /// Response must have arrived within `max_ms`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::TooSlow` otherwise.
    pub fn response_time(self, max_ms: u64) -> Result<Self, AssertionError> {
        let actual_ms = u64::try_from(self.response.duration.as_millis()).unwrap_or(u64::MAX);
        if actual_ms <= max_ms {
            Ok(self)
        } else {
            Err(AssertionError::TooSlow { actual_ms, max_ms })
        }
    }

    fn query(&self, path: &str) -> Result<Value, AssertionError> {
        let Some(body) = self.response.body.as_json() else {
            return Err(self.shape_error("value"));
        };
        match json_path::query(body, path) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(AssertionError::JsonPath(format!(
                "JSON path '{path}' not found"
            ))),
            Err(e) => Err(AssertionError::JsonPath(format!(
                "Invalid JSON path '{path}': {e}"
            ))),
        }
    }

    fn shape_error(&self, expected: &str) -> AssertionError {
        let preview = self.response.body.preview();
        let actual = match &self.response.body {
            ResponseBody::Json(Value::Array(_)) => format!("array {preview}"),
            ResponseBody::Json(Value::Object(_)) => format!("object {preview}"),
            ResponseBody::Json(_) => format!("scalar {preview}"),
            ResponseBody::Text(_) => format!("text '{preview}'"),
        };
        AssertionError::BodyShape {
            expected: expected.to_string(),
            actual,
        }
    }
}

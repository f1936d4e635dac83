//! Recursive schema validation.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::types::{Field, Schema, StringFormat, UnknownFields};

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// One constraint failure, located by a `$.field[index]` path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Location of the offending value.
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of validating one value against one schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns true if no constraint failed.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations in the order they were found.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl From<Vec<Violation>> for ValidationReport {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "{}", joined.join("; "))
    }
}

/// Validates `value` against `schema`.
///
/// Validation does not stop at the first failure: every violation in the
/// tree is collected.
#[must_use]
pub fn validate(value: &Value, schema: &Schema) -> ValidationReport {
    let mut violations = Vec::new();
    check(value, schema, "$", &mut violations);
    ValidationReport { violations }
}

fn check(value: &Value, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    match schema {
        Schema::Any {} => {}
        Schema::String { format, length } => check_string(value, *format, *length, path, out),
        Schema::Number { minimum, maximum } => check_number(value, *minimum, *maximum, path, out),
        Schema::Boolean {} => {
            if !value.is_boolean() {
                out.push(type_mismatch(path, "boolean", value));
            }
        }
        Schema::Date {} => check_date(value, path, out),
        Schema::Object { fields, unknown } => {
            let Some(object) = value.as_object() else {
                out.push(type_mismatch(path, "object", value));
                return;
            };
            for (name, field) in fields {
                let field_path = format!("{path}.{name}");
                match object.get(name) {
                    None if field.required => {
                        out.push(Violation::new(field_path, "missing required field"));
                    }
                    None => {}
                    Some(child) => check_field(child, field, &field_path, out),
                }
            }
            let policy = unknown.unwrap_or(if fields.is_empty() {
                UnknownFields::Allow
            } else {
                UnknownFields::Reject
            });
            if policy == UnknownFields::Reject {
                for key in object.keys().filter(|k| !fields.contains_key(*k)) {
                    out.push(Violation::new(format!("{path}.{key}"), "field is not allowed"));
                }
            }
        }
        Schema::Array {
            items,
            min_items,
            max_items,
        } => {
            let Some(array) = value.as_array() else {
                out.push(type_mismatch(path, "array", value));
                return;
            };
            if let Some(min) = min_items
                && array.len() < *min
            {
                out.push(Violation::new(
                    path,
                    format!("expected at least {min} items, got {}", array.len()),
                ));
            }
            if let Some(max) = max_items
                && array.len() > *max
            {
                out.push(Violation::new(
                    path,
                    format!("expected at most {max} items, got {}", array.len()),
                ));
            }
            if let Some(items) = items {
                for (index, element) in array.iter().enumerate() {
                    check(element, items, &format!("{path}[{index}]"), out);
                }
            }
        }
        Schema::Ref { name } => {
            out.push(Violation::new(
                path,
                format!("unresolved schema reference '{name}'"),
            ));
        }
    }
}

fn check_field(value: &Value, field: &Field, path: &str, out: &mut Vec<Violation>) {
    if value.is_null() && field.allow_null {
        return;
    }
    if field.allow_empty
        && value.as_str() == Some("")
        && matches!(field.schema, Schema::String { .. })
    {
        return;
    }
    check(value, &field.schema, path, out);
}

fn check_string(
    value: &Value,
    format: Option<StringFormat>,
    length: Option<usize>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    let Some(text) = value.as_str() else {
        out.push(type_mismatch(path, "string", value));
        return;
    };
    if text.is_empty() {
        out.push(Violation::new(path, "empty string is not allowed"));
        return;
    }
    if let Some(expected) = length {
        let actual = text.chars().count();
        if actual != expected {
            out.push(Violation::new(
                path,
                format!("expected length {expected}, got {actual}"),
            ));
        }
    }
    match format {
        Some(StringFormat::Uri) if !is_uri(text) => {
            out.push(Violation::new(path, format!("'{text}' is not a valid URI")));
        }
        Some(StringFormat::Email) if !EMAIL.is_match(text) => {
            out.push(Violation::new(path, format!("'{text}' is not a valid email")));
        }
        _ => {}
    }
}

fn check_number(
    value: &Value,
    minimum: Option<f64>,
    maximum: Option<f64>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    let Some(number) = value.as_f64() else {
        out.push(type_mismatch(path, "number", value));
        return;
    };
    if let Some(min) = minimum
        && number < min
    {
        out.push(Violation::new(path, format!("{number} is less than {min}")));
    }
    if let Some(max) = maximum
        && number > max
    {
        out.push(Violation::new(path, format!("{number} is greater than {max}")));
    }
}

fn check_date(value: &Value, path: &str, out: &mut Vec<Violation>) {
    let valid = match value {
        Value::Number(n) => n.as_i64().is_some(),
        Value::String(s) => is_date(s),
        _ => false,
    };
    if !valid {
        out.push(Violation::new(
            path,
            format!("{} is not a valid date", describe(value)),
        ));
    }
}

fn is_uri(text: &str) -> bool {
    Url::parse(text).is_ok_and(|url| !url.scheme().is_empty())
}

fn is_date(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> Violation {
    Violation::new(
        path,
        format!("expected {expected}, got {}", describe(value)),
    )
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn post_schema() -> Schema {
        Schema::object([
            ("userId", Field::required(Schema::number())),
            ("id", Field::required(Schema::number())),
            ("title", Field::required(Schema::string())),
            ("body", Field::required(Schema::string())),
        ])
    }

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.violations().iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn test_conforming_post_is_valid() {
        let post = json!({"userId": 1, "id": 1, "title": "t", "body": "b"});
        assert!(validate(&post, &post_schema()).is_valid());
    }

    #[test]
    fn test_missing_required_field_reported_once() {
        let post = json!({"userId": 1, "title": "t", "body": "b"});
        let report = validate(&post, &post_schema());
        assert_eq!(paths(&report), vec!["$.id"]);
        assert_eq!(report.violations()[0].message, "missing required field");
    }

    #[test]
    fn test_collects_every_violation() {
        let post = json!({"userId": "one", "id": 1, "title": 5});
        let report = validate(&post, &post_schema());
        assert_eq!(paths(&report), vec!["$.body", "$.title", "$.userId"]);
    }

    #[test]
    fn test_unknown_field_policy() {
        let value = json!({"userId": 1, "id": 1, "title": "t", "body": "b", "extra": true});
        let report = validate(&value, &post_schema());
        assert_eq!(paths(&report), vec!["$.extra"]);

        assert!(validate(&value, &post_schema().allow_unknown()).is_valid());
        let open = Schema::Object {
            fields: std::collections::BTreeMap::new(),
            unknown: None,
        };
        assert!(validate(&value, &open).is_valid());
    }

    #[test]
    fn test_array_items_validated_with_index_paths() {
        let schema = Schema::array_of(post_schema());
        let value = json!([
            {"userId": 1, "id": 1, "title": "t", "body": "b"},
            {"userId": 1, "title": "t", "body": "b"}
        ]);
        let report = validate(&value, &schema);
        assert_eq!(paths(&report), vec!["$[1].id"]);

        let report = validate(&json!({"not": "an array"}), &schema);
        assert_eq!(report.violations()[0].message, "expected array, got object");
    }

    #[test]
    fn test_allow_null() {
        let schema = Schema::object([
            ("language", Field::optional(Schema::string()).nullable()),
            ("description", Field::optional(Schema::string())),
        ]);
        assert!(validate(&json!({"language": null}), &schema).is_valid());
        let report = validate(&json!({"description": null}), &schema);
        assert_eq!(paths(&report), vec!["$.description"]);
    }

    #[test]
    fn test_empty_strings_need_allow_empty() {
        let schema = Schema::object([
            ("title", Field::required(Schema::string())),
            ("blog", Field::optional(Schema::uri()).allow_empty()),
        ]);
        let report = validate(&json!({"title": ""}), &schema);
        assert_eq!(paths(&report), vec!["$.title"]);
        assert_eq!(report.violations()[0].message, "empty string is not allowed");

        assert!(validate(&json!({"title": "t", "blog": ""}), &schema).is_valid());
        assert!(!validate(&json!({"title": "t", "blog": "nope"}), &schema).is_valid());
        assert!(!validate(&json!([""]), &Schema::array_of(Schema::string())).is_valid());
    }

    #[test]
    fn test_string_formats() {
        let schema = Schema::object([
            ("avatar_url", Field::required(Schema::uri())),
            ("email", Field::required(Schema::email())),
            ("cca2", Field::required(Schema::string_of_length(2))),
        ]);
        let ok = json!({
            "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
            "email": "Sincere@april.biz",
            "cca2": "DE"
        });
        assert!(validate(&ok, &schema).is_valid());

        let bad = json!({"avatar_url": "not a uri", "email": "nobody", "cca2": "DEU"});
        assert_eq!(
            paths(&validate(&bad, &schema)),
            vec!["$.avatar_url", "$.cca2", "$.email"]
        );
    }

    #[test]
    fn test_dates() {
        let schema = Schema::date();
        assert!(validate(&json!("2011-01-25T18:44:36Z"), &schema).is_valid());
        assert!(validate(&json!("2024-02-29"), &schema).is_valid());
        assert!(validate(&json!(1_700_000_000_000_i64), &schema).is_valid());
        assert!(!validate(&json!("2023-02-30"), &schema).is_valid());
        assert!(!validate(&json!("yesterday"), &schema).is_valid());
    }

    #[test]
    fn test_unresolved_ref_is_a_violation() {
        let report = validate(&json!({}), &Schema::reference("post"));
        assert_eq!(
            report.to_string(),
            "$: unresolved schema reference 'post'"
        );
    }
}

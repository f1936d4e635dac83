//! A small JSONPath subset and value comparison.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::subset::json_eq;

/// Comparison operators for value assertions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    /// Equal to.
    Equals,
    /// Not equal to.
    NotEquals,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal to.
    GreaterThanOrEqual,
    /// Less than.
    LessThan,
    /// Less than or equal to.
    LessThanOrEqual,
    /// Contains (for strings/arrays).
    Contains,
    /// Matches regex pattern. An array matches if any string element does.
    Matches,
    /// Every element of an array equals the value.
    EachEquals,
}

impl ComparisonOperator {
    /// Get the symbol for this operator.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Contains => "contains",
            Self::Matches => "matches",
            Self::EachEquals => "each ==",
        }
    }

    /// Compares `actual` against `expected`.
    #[must_use]
    pub fn compare(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Self::Equals => json_eq(actual, expected),
            Self::NotEquals => !json_eq(actual, expected),
            Self::GreaterThan => compare_numeric(actual, expected, |a, b| a > b),
            Self::GreaterThanOrEqual => compare_numeric(actual, expected, |a, b| a >= b),
            Self::LessThan => compare_numeric(actual, expected, |a, b| a < b),
            Self::LessThanOrEqual => compare_numeric(actual, expected, |a, b| a <= b),
            Self::Contains => match (actual, expected) {
                (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
                (Value::Array(items), _) => items.iter().any(|item| json_eq(item, expected)),
                _ => false,
            },
            Self::Matches => {
                let Value::String(pattern) = expected else {
                    return false;
                };
                let Ok(re) = Regex::new(pattern) else {
                    return false;
                };
                match actual {
                    Value::String(s) => re.is_match(s),
                    Value::Array(items) => items
                        .iter()
                        .any(|item| item.as_str().is_some_and(|s| re.is_match(s))),
                    _ => false,
                }
            }
            Self::EachEquals => actual
                .as_array()
                .is_some_and(|items| items.iter().all(|item| json_eq(item, expected))),
        }
    }
}

/// Compare numeric values.
fn compare_numeric<F>(actual: &Value, expected: &Value, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

/// Query a JSON value using a simple JSONPath-like syntax.
///
/// Supports: `$`, `$.field`, `$.field.nested`, `$.array[0]`, `$.array[*].field`.
/// A `[*]` segment projects the rest of the path over every element and
/// yields an array of the results.
///
/// # Errors
///
/// Returns an error if the path is malformed.
pub fn query(json: &Value, path: &str) -> Result<Option<Value>, String> {
    let segments = parse(path)?;
    Ok(eval(json, &segments))
}

fn eval(value: &Value, segments: &[Segment]) -> Option<Value> {
    match segments.split_first() {
        None => Some(value.clone()),
        Some((Segment::Key(key), rest)) => value.get(key).and_then(|v| eval(v, rest)),
        Some((Segment::Index(index), rest)) => value.get(*index).and_then(|v| eval(v, rest)),
        Some((Segment::Wildcard, rest)) => value
            .as_array()
            .map(|items| Value::Array(items.iter().filter_map(|v| eval(v, rest)).collect())),
    }
}

fn parse(path: &str) -> Result<Vec<Segment>, String> {
    let path = path.trim();
    let Some(mut rest) = path.strip_prefix('$') else {
        return Err("JSON path must start with '$'".to_string());
    };

    let mut segments = Vec::new();
    while !rest.is_empty() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            let key = &after_dot[..end];
            if key.is_empty() {
                return Err(format!("empty key in path '{path}'"));
            }
            segments.push(Segment::Key(key.to_string()));
            rest = &after_dot[end..];
        } else if let Some(after_bracket) = rest.strip_prefix('[') {
            let end = after_bracket
                .find(']')
                .ok_or_else(|| format!("unclosed '[' in path '{path}'"))?;
            let index = &after_bracket[..end];
            if index == "*" {
                segments.push(Segment::Wildcard);
            } else {
                let index = index
                    .parse()
                    .map_err(|_| format!("Invalid array index: {index}"))?;
                segments.push(Segment::Index(index));
            }
            rest = &after_bracket[end + 1..];
        } else {
            return Err(format!("unexpected '{rest}' in path '{path}'"));
        }
    }
    Ok(segments)
}

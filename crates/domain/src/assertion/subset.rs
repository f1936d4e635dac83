//! Deep JSON subset matching.

use serde_json::Value;

/// First difference found while matching a subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Location of the difference.
    pub path: String,
    /// Expected value (rendered).
    pub expected: String,
    /// Actual value (rendered).
    pub actual: String,
}

/// Checks that every key/value in `expected` is present in `actual`.
///
/// Objects match when each expected key exists and matches recursively;
/// extra keys in `actual` are ignored. Arrays match element-wise and must
/// have the same length. Numbers compare by value, so `1` equals `1.0`.
/// An object subset matched against an array body passes if any element
/// matches.
///
/// # Errors
///
/// Returns the first [`Mismatch`] found.
pub fn contains_subset(actual: &Value, expected: &Value) -> Result<(), Mismatch> {
    if let (Value::Array(items), Value::Object(_)) = (actual, expected) {
        if items.iter().any(|item| matches_at(item, expected, "$").is_ok()) {
            return Ok(());
        }
        return Err(Mismatch {
            path: "$".to_string(),
            expected: expected.to_string(),
            actual: format!("array of {} elements with no matching element", items.len()),
        });
    }
    matches_at(actual, expected, "$")
}

fn matches_at(actual: &Value, expected: &Value, path: &str) -> Result<(), Mismatch> {
    match (actual, expected) {
        (Value::Object(actual_map), Value::Object(expected_map)) => {
            for (key, expected_value) in expected_map {
                let child = format!("{path}.{key}");
                match actual_map.get(key) {
                    Some(actual_value) => matches_at(actual_value, expected_value, &child)?,
                    None => {
                        return Err(Mismatch {
                            path: child,
                            expected: expected_value.to_string(),
                            actual: "nothing".to_string(),
                        });
                    }
                }
            }
            Ok(())
        }
        (Value::Array(actual_items), Value::Array(expected_items)) => {
            if actual_items.len() != expected_items.len() {
                return Err(Mismatch {
                    path: path.to_string(),
                    expected: format!("{} elements", expected_items.len()),
                    actual: format!("{} elements", actual_items.len()),
                });
            }
            for (index, (a, e)) in actual_items.iter().zip(expected_items).enumerate() {
                matches_at(a, e, &format!("{path}[{index}]"))?;
            }
            Ok(())
        }
        _ if json_eq(actual, expected) => Ok(()),
        _ => Err(Mismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
    }
}

/// Equality that treats numerically equal numbers as equal.
///
/// Integers compare exactly; only a float on either side falls back to
/// `f64` comparison.
#[must_use]
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
                    _ => false,
                }
            } else {
                x == y
            }
        }
        _ => a == b,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_subset_with_extra_keys_passes() {
        assert!(contains_subset(&json!({"a": 1, "b": 2}), &json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_different_value_fails() {
        let err = contains_subset(&json!({"a": 2}), &json!({"a": 1})).unwrap_err();
        assert_eq!(
            err,
            Mismatch {
                path: "$.a".to_string(),
                expected: "1".to_string(),
                actual: "2".to_string(),
            }
        );
    }

    #[test]
    fn test_nested_objects() {
        let body = json!({"name": {"common": "Germany", "official": "Federal Republic of Germany"}});
        assert!(contains_subset(&body, &json!({"name": {"common": "Germany"}})).is_ok());
        let err = contains_subset(&body, &json!({"name": {"native": "Deutschland"}})).unwrap_err();
        assert_eq!(err.path, "$.name.native");
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(contains_subset(&json!({"id": 101.0}), &json!({"id": 101})).is_ok());
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let above = json!(9_007_199_254_740_993_u64);
        assert!(!json_eq(&above, &json!(9_007_199_254_740_992_u64)));
        assert!(json_eq(&above, &json!(9_007_199_254_740_993_i64)));
        assert!(json_eq(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!json_eq(&json!(-1), &json!(u64::MAX)));
        assert!(contains_subset(
            &json!({"id": 9_007_199_254_740_993_u64}),
            &json!({"id": 9_007_199_254_740_992_u64})
        )
        .is_err());
    }

    #[test]
    fn test_arrays_match_element_wise() {
        assert!(contains_subset(&json!({"capital": ["London"]}), &json!({"capital": ["London"]})).is_ok());
        assert!(contains_subset(&json!({"capital": ["a", "b"]}), &json!({"capital": ["a"]})).is_err());
    }

    #[test]
    fn test_object_subset_against_array_body() {
        let body = json!([{"cca2": "US"}, {"cca2": "UM"}]);
        assert!(contains_subset(&body, &json!({"cca2": "UM"})).is_ok());
        assert!(contains_subset(&body, &json!({"cca2": "GB"})).is_err());
    }
}

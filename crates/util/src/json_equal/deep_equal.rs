use serde_json::{Number, Value};

/// Performs a deep equality check between two JSON values.
///
/// Arrays compare element by element, objects key by key regardless of key
/// order. Numbers compare by numeric value, so `1` and `1.0` are equal even
/// though `serde_json` stores them with different representations.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use idoc_util::json_equal::deep_equal;
///
/// let a = json!({"messages": [1, 2, 3], "valid": true});
/// let b = json!({"valid": true, "messages": [1.0, 2, 3]});
/// let c = json!({"messages": [1, 2, 4], "valid": true});
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            obj_a.len() == obj_b.len()
                && obj_a
                    .iter()
                    .all(|(key, val_a)| obj_b.get(key).is_some_and(|val_b| deep_equal(val_a, val_b)))
        }
        _ => false,
    }
}

/// Deep equality over optional values, where `None` stands for an absent
/// attribute. An absent attribute never equals a present one, not even `null`.
pub fn deep_equal_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => deep_equal(a, b),
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_primitives() {
        assert!(deep_equal(&json!(null), &json!(null)));
        assert!(deep_equal(&json!(true), &json!(true)));
        assert!(deep_equal(&json!("a"), &json!("a")));
        assert!(deep_equal(&json!(42), &json!(42)));
    }

    #[test]
    fn test_integer_and_float_representation_equal() {
        assert!(deep_equal(&json!(1), &json!(1.0)));
        assert!(!deep_equal(&json!(1), &json!(1.5)));
    }

    #[test]
    fn test_zero_and_null_not_equal() {
        assert!(!deep_equal(&json!(0), &json!(null)));
        assert!(!deep_equal(&json!(""), &json!(null)));
        assert!(!deep_equal(&json!(false), &json!(0)));
    }

    #[test]
    fn test_arrays_are_order_sensitive() {
        assert!(deep_equal(&json!([1, 2]), &json!([1, 2])));
        assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
    }

    #[test]
    fn test_objects_ignore_key_order() {
        let a = json!({"value": "x", "valueLabel": "X"});
        let b = json!({"valueLabel": "X", "value": "x"});
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &json!({"value": "x"})));
    }

    #[test]
    fn test_nested_results() {
        let a = json!({"value": {"results": ["emf:1"], "total": 1}});
        let b = json!({"value": {"results": ["emf:1"], "total": 1}});
        let c = json!({"value": {"results": ["emf:2"], "total": 1}});
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn test_absent_differs_from_null() {
        assert!(deep_equal_opt(None, None));
        assert!(!deep_equal_opt(None, Some(&json!(null))));
        assert!(deep_equal_opt(Some(&json!([1])), Some(&json!([1]))));
    }
}

//! Browser array semantics for JSON sequences.
//!
//! Sequence attributes are edited with the same index conventions the UI
//! uses: negative positions count from the end and out-of-range positions
//! clamp to the array bounds. Default sorting compares the string form of
//! each element.

use std::cmp::Ordering;

use serde_json::Value;

/// Resolves a relative array position against `len`.
///
/// Negative values count back from the end; the result is clamped to
/// `0..=len`.
///
/// # Examples
///
/// ```
/// use idoc_util::js_array::relative_index;
///
/// assert_eq!(relative_index(1, 5), 1);
/// assert_eq!(relative_index(-2, 5), 3);
/// assert_eq!(relative_index(-9, 5), 0);
/// assert_eq!(relative_index(9, 5), 5);
/// ```
pub fn relative_index(position: i64, len: usize) -> usize {
    if position < 0 {
        let back = position.unsigned_abs();
        usize::try_from(back).map_or(0, |back| len.saturating_sub(back))
    } else {
        usize::try_from(position).map_or(len, |pos| pos.min(len))
    }
}

/// Renders a value the way `String(value)` does in the browser.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
                format!("{f:.0}")
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Default ordering of `Array.prototype.sort`: compares UTF-16 code units of
/// the string forms.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::cmp::Ordering;
/// use idoc_util::js_array::default_compare;
///
/// // numbers sort as strings
/// assert_eq!(default_compare(&json!(10), &json!(9)), Ordering::Less);
/// assert_eq!(default_compare(&json!("b"), &json!("a")), Ordering::Greater);
/// ```
pub fn default_compare(a: &Value, b: &Value) -> Ordering {
    let a = js_string(a);
    let b = js_string(b);
    a.encode_utf16().cmp(b.encode_utf16())
}

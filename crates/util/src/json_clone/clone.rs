use serde_json::{Map, Value};

/// Creates a deep clone of a JSON value.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use idoc_util::json_clone::clone;
///
/// let original = json!({"fields": [{"identifier": "title"}]});
/// let cloned = clone(&original);
///
/// assert_eq!(original, cloned);
/// ```
pub fn clone(value: &Value) -> Value {
    match value {
        Value::Array(arr) => Value::Array(arr.iter().map(clone).collect()),
        Value::Object(obj) => Value::Object(clone_map(obj)),
        scalar => scalar.clone(),
    }
}

/// Deep clone of an object map, keeping key order.
pub fn clone_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter().map(|(key, val)| (key.clone(), clone(val))).collect()
}

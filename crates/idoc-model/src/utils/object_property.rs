use serde_json::{json, Map, Value};

use crate::instance::{InstanceModel, InstanceModelProperty, DEFAULT_VALUE, RESULTS, VALUE};

pub const ADD: &str = "add";
pub const REMOVE: &str = "remove";
pub const TOTAL: &str = "total";
pub const HEADERS: &str = "headers";

/// A property holds a relation when it carries `results`, either directly
/// or inside its `value`.
pub fn is_object_property(property: &InstanceModelProperty) -> bool {
    property.has(RESULTS) || property.value().is_some_and(|value| has_results(&value))
}

pub fn empty_object_property_value() -> Value {
    json!({ RESULTS: [], ADD: [], REMOVE: [], TOTAL: 0, HEADERS: {} })
}

/// Related ids of a relation property.
pub fn object_property_value(property: &InstanceModelProperty) -> Option<Vec<Value>> {
    if let Some(Value::Array(results)) = property.get(RESULTS) {
        return Some(results);
    }
    match property.value()? {
        Value::Object(mut value) => match value.remove(RESULTS) {
            Some(Value::Array(results)) => Some(results),
            _ => None,
        },
        _ => None,
    }
}

/// Appends `ids` to the relation `name` of `model`, skipping ids already
/// related, and records the new ones in `add`.
///
/// Returns `false` and leaves the model alone when it has no such property.
pub fn update_object_property(model: &InstanceModel, name: &str, ids: &[&str]) -> bool {
    let Some(property) = model.get(name) else {
        return false;
    };
    let mut value = match property.value() {
        Some(Value::Object(value)) => value,
        _ => Map::new(),
    };
    let mut results = take_array(&mut value, RESULTS);
    let mut added = take_array(&mut value, ADD);
    for id in ids {
        let id = Value::String(id.to_string());
        if !results.contains(&id) {
            results.push(id.clone());
            added.push(id);
        }
    }
    let remove = take_array(&mut value, REMOVE);
    let headers = value.remove(HEADERS).unwrap_or_else(|| json!({}));
    let total = results.len();
    value.insert(RESULTS.to_string(), Value::Array(results));
    value.insert(ADD.to_string(), Value::Array(added));
    value.insert(REMOVE.to_string(), Value::Array(remove));
    value.insert(TOTAL.to_string(), json!(total));
    value.insert(HEADERS.to_string(), headers);
    property.set(VALUE, Value::Object(value));

    if !property.default_value().is_some_and(|default| has_results(&default)) {
        property.set(DEFAULT_VALUE, empty_object_property_value());
    }
    tracing::trace!(property = name, ids = ?ids, "updated relation");
    true
}

/// Stores a rendered header of the related instance `id` under
/// `value.headers[id][header_type]`.
pub fn set_object_property_header(
    property: &InstanceModelProperty,
    id: &str,
    header: &str,
    header_type: &str,
) -> bool {
    let mut value = match property.value() {
        Some(Value::Object(value)) => value,
        _ => match empty_object_property_value() {
            Value::Object(value) => value,
            _ => Map::new(),
        },
    };
    let headers = value
        .entry(HEADERS)
        .or_insert_with(|| Value::Object(Map::new()));
    if !headers.is_object() {
        *headers = Value::Object(Map::new());
    }
    if let Value::Object(headers) = headers {
        let entry = headers
            .entry(id)
            .or_insert_with(|| json!({ "id": id }));
        if let Value::Object(entry) = entry {
            entry.insert(header_type.to_string(), Value::String(header.to_string()));
        }
    }
    property.set(VALUE, Value::Object(value))
}

/// Marks every related id for removal and empties the relation.
pub fn remove_object_property_values(property: &InstanceModelProperty) -> bool {
    let Some(Value::Object(mut value)) = property.value() else {
        return false;
    };
    let results = take_array(&mut value, RESULTS);
    let mut remove = take_array(&mut value, REMOVE);
    remove.extend(results);
    value.insert(RESULTS.to_string(), Value::Array(Vec::new()));
    value.insert(ADD.to_string(), Value::Array(Vec::new()));
    value.insert(REMOVE.to_string(), Value::Array(remove));
    value.insert(TOTAL.to_string(), json!(0));
    property.set(VALUE, Value::Object(value))
}

fn has_results(value: &Value) -> bool {
    value.get(RESULTS).is_some()
}

fn take_array(value: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match value.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

//! The definition and instance models of one form, handled together.

use idoc_util::{clone, deep_equal_opt};
use serde_json::{json, Map, Value};

use crate::definition::DefinitionModel;
use crate::error::ModelError;
use crate::instance::{
    InstanceModel, InstanceModelProperty, DEFAULT_RICHTEXT_VALUE, DEFAULT_VALUE,
    DEFAULT_VALUE_LABEL, RESULTS, RICHTEXT_VALUE, VALUE, VALUE_LABEL,
};
use crate::utils::{is_richtext, is_truthy, strip_html};

const NUMERIC_TYPES: [&str; 4] = ["int", "long", "float", "double"];

/// Message attached to a mandatory field left empty.
pub const MANDATORY_MESSAGE: &str = "mandatory";

/// Definition (view model) and instance (validation model) of one object.
#[derive(Debug, Clone)]
pub struct FormModels {
    pub definition: DefinitionModel,
    pub instance: InstanceModel,
}

impl FormModels {
    pub fn new(definition: DefinitionModel, instance: InstanceModel) -> Self {
        Self {
            definition,
            instance,
        }
    }

    pub fn serialize(&self) -> Value {
        json!({
            "viewModel": self.definition.serialize(),
            "validationModel": self.instance.serialize(),
        })
    }

    /// Property values that differ from their defaults.
    ///
    /// A cleared value whose default was set is reported as `null`; values
    /// left empty or never set are omitted. Outside drafts, relation
    /// values are reduced to their `add`/`remove` lists and numbers are
    /// compared numerically. Draft changesets carry the markup of richtext
    /// fields.
    pub fn changeset(&self, for_draft: bool) -> Map<String, Value> {
        let mut changes = Map::new();
        for (identifier, property) in self.instance.properties() {
            let view = self.view(identifier);
            let (value, default) = if for_draft {
                (property.value(), property.default_value())
            } else {
                compared_values(view.as_ref(), property)
            };
            let cleared = value.as_ref().map_or(true, is_blank);
            if cleared && default.as_ref().is_some_and(is_truthy) {
                changes.insert(identifier.clone(), Value::Null);
            } else if !cleared && !deep_equal_opt(default.as_ref(), value.as_ref()) {
                let value = if for_draft && view.as_ref().is_some_and(is_richtext) {
                    property.richtext_value()
                } else {
                    value
                };
                changes.insert(identifier.clone(), value.unwrap_or(Value::Null));
            }
        }
        tracing::trace!(changed = changes.len(), for_draft, "built changeset");
        changes
    }

    /// Whether any property value differs from its default.
    pub fn is_changed(&self) -> bool {
        self.instance.properties().iter().any(|(identifier, property)| {
            let (value, default) = compared_values(self.view(identifier).as_ref(), property);
            !deep_equal_opt(default.as_ref(), value.as_ref()) && (!is_nil(&default) || !is_nil(&value))
        })
    }

    /// Puts every value back to its default, along with the label and the
    /// richtext markup where those are present.
    pub fn revert_changes(&self) -> Result<(), ModelError> {
        for property in self.instance.properties().values() {
            assign_default(property, VALUE, DEFAULT_VALUE)?;
            if property.richtext_value().as_ref().is_some_and(is_truthy) {
                assign_default(property, RICHTEXT_VALUE, DEFAULT_RICHTEXT_VALUE)?;
            }
            if property.default_value_label().as_ref().is_some_and(is_truthy) {
                assign_default(property, VALUE_LABEL, DEFAULT_VALUE_LABEL)?;
            }
        }
        Ok(())
    }

    /// Loads freshly fetched values into the instance and makes them the new
    /// defaults. Codelist values given as `{id, text}` are split into value
    /// and label; richtext values keep their markup in `richtextValue`.
    /// Values for unknown properties are added as new properties. Returns the
    /// identifiers added.
    pub fn merge_properties(&mut self, properties: &Map<String, Value>) -> Vec<String> {
        for (identifier, property) in self.instance.properties() {
            if let Some(incoming) = properties.get(identifier) {
                set_incoming_value(self.view(identifier).as_ref(), property, incoming);
            }
            if let Some(value) = property.value() {
                property.set(DEFAULT_VALUE, clone(&value));
            }
            if let Some(label) = property.value_label().filter(is_truthy) {
                property.set(DEFAULT_VALUE_LABEL, label);
            }
            if let Some(markup) = property.richtext_value().filter(is_truthy) {
                property.set(DEFAULT_RICHTEXT_VALUE, markup);
            }
        }

        let mut added = Vec::new();
        for (identifier, value) in properties {
            if self.instance.contains(identifier) {
                continue;
            }
            let property = InstanceModelProperty::from_map(
                Map::from_iter([
                    (VALUE.to_string(), value.clone()),
                    (DEFAULT_VALUE.to_string(), value.clone()),
                ]),
                self.instance.scheduler().clone(),
            );
            self.instance.add_property(identifier, property);
            added.push(identifier.clone());
        }
        tracing::debug!(merged = properties.len(), added = added.len(), "merged properties");
        added
    }

    /// `false` when a rendered mandatory field has no value.
    pub fn check_mandatory(&self) -> bool {
        self.missing_mandatory().is_empty()
    }

    /// Flags every rendered mandatory field without a value as invalid,
    /// clears the flag on the others, and publishes the aggregate validity.
    pub fn validate(&self) -> bool {
        let missing = self.missing_mandatory();
        for node in self.definition.flat_fields() {
            if !node.property().is_mandatory() || !node.property().is_rendered() {
                continue;
            }
            let Some(property) = self.instance.get(node.identifier()) else {
                continue;
            };
            if missing.contains(&node.identifier()) {
                property.set_valid(false);
                property.set_messages(vec![json!({ "id": MANDATORY_MESSAGE })]);
            } else {
                property.set_valid(true);
                property.set_messages(Vec::new());
            }
        }
        let valid = self.instance.compute_validity();
        self.instance.set_is_valid(valid);
        valid
    }

    fn missing_mandatory(&self) -> Vec<&str> {
        self.definition
            .flat_fields()
            .filter(|node| node.property().is_mandatory() && node.property().is_rendered())
            .filter(|node| {
                self.instance
                    .get(node.identifier())
                    .and_then(InstanceModelProperty::value)
                    .map_or(true, |value| is_empty_value(&value))
            })
            .map(|node| node.identifier())
            .collect()
    }

    fn view(&self, identifier: &str) -> Option<Value> {
        self.definition
            .field(identifier)
            .map(|node| Value::Object(node.property().serialize()))
    }
}

/// Value and default as they are compared and sent outside drafts.
fn compared_values(view: Option<&Value>, property: &InstanceModelProperty) -> (Option<Value>, Option<Value>) {
    let value = property.value();
    let default = property.default_value();
    let Some(view) = view else {
        return (value, default);
    };
    if view.get("isDataProperty") == Some(&Value::Bool(false)) {
        (
            Some(relation_delta(value.as_ref())),
            Some(relation_delta(default.as_ref())),
        )
    } else if is_numeric(view) && value.as_ref().is_some_and(is_truthy) {
        (
            Some(parse_number(value.as_ref())),
            Some(parse_number(default.as_ref())),
        )
    } else if is_richtext(view) {
        (property.richtext_value(), property.default_richtext_value())
    } else {
        (value, default)
    }
}

fn relation_delta(raw: Option<&Value>) -> Value {
    let list = |key: &str| {
        raw.and_then(|raw| raw.get(key))
            .filter(|list| is_truthy(list))
            .cloned()
            .unwrap_or_else(|| json!([]))
    };
    json!({ "add": list("add"), "remove": list("remove") })
}

fn is_numeric(view: &Value) -> bool {
    view.get("dataType")
        .and_then(Value::as_str)
        .is_some_and(|data_type| NUMERIC_TYPES.contains(&data_type))
}

/// Leading numeric prefix of a string, or the number itself. `null` when
/// nothing parses.
fn parse_number(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Number(n)) => n.as_f64().map_or(Value::Null, |n| json!(n)),
        Some(Value::String(s)) => {
            let s = s.trim_start();
            let mut seen_point = false;
            let end = s
                .char_indices()
                .take_while(|&(i, c)| match c {
                    '0'..='9' => true,
                    '-' | '+' => i == 0,
                    '.' => !std::mem::replace(&mut seen_point, true),
                    _ => false,
                })
                .map(|(i, c)| i + c.len_utf8())
                .last()
                .unwrap_or(0);
            s[..end].parse::<f64>().map_or(Value::Null, |n| json!(n))
        }
        _ => Value::Null,
    }
}

fn set_incoming_value(view: Option<&Value>, property: &InstanceModelProperty, incoming: &Value) {
    let is_codelist = view
        .and_then(|view| view.get("codelist"))
        .is_some_and(is_truthy);
    if is_codelist {
        match incoming {
            Value::Array(items) => {
                let ids = items.iter().map(|item| item.get("id").cloned().unwrap_or(Value::Null));
                let labels: Vec<&str> = items
                    .iter()
                    .map(|item| item.get("text").and_then(Value::as_str).unwrap_or_default())
                    .collect();
                property.set(VALUE, Value::Array(ids.collect()));
                property.set(VALUE_LABEL, json!(labels.join(", ")));
            }
            Value::Object(item) if item.get("id").is_some_and(is_truthy) => {
                property.set(VALUE, item["id"].clone());
                property.set(VALUE_LABEL, item.get("text").cloned().unwrap_or(Value::Null));
            }
            _ => {
                property.set(VALUE, incoming.clone());
            }
        }
    } else if view.is_some_and(is_richtext) {
        property.set(RICHTEXT_VALUE, incoming.clone());
        let text = incoming.as_str().map(strip_html).unwrap_or_default();
        property.set(VALUE, json!(text));
    } else {
        property.set(VALUE, incoming.clone());
    }
}

/// Array values are emptied and refilled so sequence subscribers see one
/// edit; anything else is replaced by a copy of the default.
fn assign_default(
    property: &InstanceModelProperty,
    key: &str,
    default_key: &str,
) -> Result<(), ModelError> {
    let default = property.get(default_key);
    match (property.get(key), property.sequence_mut(key)) {
        (Some(Value::Array(_)), Ok(sequence)) => {
            let items = match default {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            sequence.splice(0, None, items)?;
        }
        _ => {
            property.set(key, default.as_ref().map_or(Value::Null, clone));
        }
    }
    Ok(())
}

fn is_nil(value: &Option<Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Empty in the sense of a cleared form input: numbers always count as
/// filled.
fn is_blank(value: &Value) -> bool {
    !matches!(value, Value::Number(_)) && !is_truthy(value)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map
            .get(RESULTS)
            .and_then(Value::as_array)
            .is_some_and(Vec::is_empty),
        Value::Null => true,
        Value::Bool(_) | Value::Number(_) => false,
    }
}

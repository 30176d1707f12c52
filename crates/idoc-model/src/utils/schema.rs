use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::definition::{FIELDS, IDENTIFIER};
use crate::instance::InstanceModel;

pub const HEADER_COMPACT: &str = "compact_header";
pub const HEADER_DEFAULT: &str = "default_header";
pub const HEADER_BREADCRUMB: &str = "breadcrumb_header";

/// Controls declared in definitions that have no dedicated rendering; such
/// fields fall back to the control derived from their data type.
pub const UNSUPPORTED_CONTROLS: [&str; 2] = ["RELATED_FIELDS", "DEFAULT_VALUE_PATTERN"];

const RICHTEXT_CONTROL: &str = "RICHTEXT";
const TEXT_TYPES: [&str; 5] = ["text", "int", "long", "float", "double"];
const DEFAULT_MAX_LENGTH: u64 = 40;

/// How a field is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlType {
    Region,
    Text,
    Textarea,
    Datetime,
    Checkbox,
    Password,
    Codelist,
    InstanceHeader,
    /// Control named by the definition itself.
    Custom(String),
}

impl ControlType {
    pub fn as_str(&self) -> &str {
        match self {
            ControlType::Region => "region",
            ControlType::Text => "text",
            ControlType::Textarea => "textarea",
            ControlType::Datetime => "datetime",
            ControlType::Checkbox => "checkbox",
            ControlType::Password => "password",
            ControlType::Codelist => "codelist",
            ControlType::InstanceHeader => "INSTANCE_HEADER",
            ControlType::Custom(name) => name.as_str(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "region" => ControlType::Region,
            "text" => ControlType::Text,
            "textarea" => ControlType::Textarea,
            "datetime" => ControlType::Datetime,
            "checkbox" => ControlType::Checkbox,
            "password" => ControlType::Password,
            "codelist" => ControlType::Codelist,
            "INSTANCE_HEADER" => ControlType::InstanceHeader,
            other => ControlType::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for ControlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ControlType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ControlType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ControlType::from_name(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlTypeOptions {
    /// Text fields allowing more characters than this become text areas.
    pub textarea_min_chars: u64,
}

impl Default for ControlTypeOptions {
    fn default() -> Self {
        Self {
            textarea_min_chars: 60,
        }
    }
}

pub fn is_region(field: &Value) -> bool {
    field.get(FIELDS).is_some_and(Value::is_array)
}

/// First control identifier of a field. `control` may be a bare name, an
/// object with an `identifier` or a list of such objects.
fn control_name(field: &Value) -> Option<&str> {
    match field.get("control")? {
        Value::String(name) => Some(name.as_str()),
        Value::Object(control) => control.get(IDENTIFIER)?.as_str(),
        Value::Array(controls) => controls.first()?.get(IDENTIFIER)?.as_str(),
        _ => None,
    }
}

pub fn is_richtext(field: &Value) -> bool {
    control_name(field) == Some(RICHTEXT_CONTROL)
}

/// Picks the control used to render `field`, or `None` when nothing fits.
pub fn define_control_type(field: Option<&Value>, options: &ControlTypeOptions) -> Option<ControlType> {
    let field = field?.as_object().filter(|field| !field.is_empty())?;
    let field_value = Value::Object(field.clone());
    if is_region(&field_value) {
        return Some(ControlType::Region);
    }
    if let Some(control) = control_name(&field_value) {
        if !UNSUPPORTED_CONTROLS.contains(&control) {
            return Some(ControlType::Custom(control.to_string()));
        }
    }
    let identifier = field.get(IDENTIFIER).and_then(Value::as_str);
    if identifier.is_some_and(|id| [HEADER_COMPACT, HEADER_DEFAULT, HEADER_BREADCRUMB].contains(&id)) {
        return Some(ControlType::InstanceHeader);
    }
    if field.get("codelist").is_some_and(is_truthy) {
        return Some(ControlType::Codelist);
    }
    let data_type = field.get("dataType")?.as_str()?.to_lowercase();
    match data_type.as_str() {
        kind if TEXT_TYPES.contains(&kind) => {
            Some(text_field_type(&field_value, options.textarea_min_chars))
        }
        "date" | "datetime" => Some(ControlType::Datetime),
        "boolean" => Some(ControlType::Checkbox),
        "password" => Some(ControlType::Password),
        "any" if field.get("isDataProperty") == Some(&Value::Bool(false)) => Some(ControlType::Text),
        _ => None,
    }
}

pub fn text_field_type(field: &Value, textarea_min_chars: u64) -> ControlType {
    match field.get("maxLength").and_then(Value::as_u64) {
        Some(max) if max > textarea_min_chars => ControlType::Textarea,
        _ => ControlType::Text,
    }
}

/// Removes from `validation_model` every field of `fields` the predicate
/// rejects. A region survives only when it passes and keeps at least one
/// child; dropping a region drops everything under it. Returns the removed
/// identifiers.
pub fn filter_fields<F>(fields: &[Value], validation_model: &mut InstanceModel, mut predicate: F) -> Vec<String>
where
    F: FnMut(&Value) -> bool,
{
    let mut removed = Vec::new();
    for field in fields {
        filter_field(field, validation_model, &mut predicate, &mut removed);
    }
    removed
}

fn filter_field<F>(field: &Value, model: &mut InstanceModel, predicate: &mut F, removed: &mut Vec<String>) -> bool
where
    F: FnMut(&Value) -> bool,
{
    let keep = match field.get(FIELDS).and_then(Value::as_array) {
        Some(children) => {
            let passes = predicate(field);
            let mut kept = 0;
            for child in children {
                if passes {
                    if filter_field(child, model, predicate, removed) {
                        kept += 1;
                    }
                } else {
                    remove_all(child, model, removed);
                }
            }
            passes && kept > 0
        }
        None => predicate(field),
    };
    if !keep {
        remove(field, model, removed);
    }
    keep
}

fn remove_all(field: &Value, model: &mut InstanceModel, removed: &mut Vec<String>) {
    if let Some(children) = field.get(FIELDS).and_then(Value::as_array) {
        for child in children {
            remove_all(child, model, removed);
        }
    }
    remove(field, model, removed);
}

fn remove(field: &Value, model: &mut InstanceModel, removed: &mut Vec<String>) {
    if let Some(identifier) = field.get(IDENTIFIER).and_then(Value::as_str) {
        if model.remove_property(identifier).is_some() {
            removed.push(identifier.to_string());
        }
    }
}

/// Pre-order walk over `fields`, calling `visitor` for every node that has
/// a property in `validation_model`. Region contents are always descended
/// into.
pub fn walk_model_tree<F>(fields: &[Value], validation_model: &InstanceModel, mut visitor: F)
where
    F: FnMut(&Value),
{
    fn walk<F: FnMut(&Value)>(fields: &[Value], model: &InstanceModel, visitor: &mut F) {
        for field in fields {
            if field
                .get(IDENTIFIER)
                .and_then(Value::as_str)
                .is_some_and(|id| model.contains(id))
            {
                visitor(field);
            }
            if let Some(children) = field.get(FIELDS).and_then(Value::as_array) {
                walk(children, model, visitor);
            }
        }
    }
    walk(fields, validation_model, &mut visitor);
}

/// Builds field payloads.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Map<String, Value>,
}

impl FieldBuilder {
    pub fn new(identifier: &str) -> Self {
        let mut field = Map::new();
        field.insert(IDENTIFIER.to_string(), json!(identifier));
        field.insert("previewEmpty".to_string(), json!(true));
        field.insert("disabled".to_string(), json!(false));
        field.insert("displayType".to_string(), json!("EDITABLE"));
        field.insert("validators".to_string(), json!([]));
        field.insert("dataType".to_string(), json!("text"));
        field.insert("label".to_string(), json!(""));
        field.insert("isMandatory".to_string(), json!(false));
        field.insert("maxLength".to_string(), json!(DEFAULT_MAX_LENGTH));
        field.insert("rendered".to_string(), json!(true));
        field.insert("isDataProperty".to_string(), json!(true));
        Self { field }
    }

    /// A region holding `fields`.
    pub fn region(identifier: &str, label: &str, fields: Vec<Value>) -> Value {
        json!({
            IDENTIFIER: identifier,
            "label": label,
            "displayType": "EDITABLE",
            "rendered": true,
            FIELDS: fields,
        })
    }

    pub fn attribute(mut self, name: &str, value: Value) -> Self {
        self.field.insert(name.to_string(), value);
        self
    }

    pub fn display_type(self, display_type: &str) -> Self {
        self.attribute("displayType", json!(display_type))
    }

    pub fn data_type(self, data_type: &str) -> Self {
        self.attribute("dataType", json!(data_type))
    }

    pub fn label(self, label: &str) -> Self {
        self.attribute("label", json!(label))
    }

    pub fn mandatory(self, mandatory: bool) -> Self {
        self.attribute("isMandatory", json!(mandatory))
    }

    pub fn rendered(self, rendered: bool) -> Self {
        self.attribute("rendered", json!(rendered))
    }

    pub fn max_length(self, max_length: u64) -> Self {
        self.attribute("maxLength", json!(max_length))
    }

    pub fn control(self, control: &str) -> Self {
        self.attribute("control", json!({ IDENTIFIER: control }))
    }

    pub fn codelist(self, codelist: u64) -> Self {
        self.attribute("codelist", json!(codelist))
    }

    pub fn data_property(self, is_data_property: bool) -> Self {
        self.attribute("isDataProperty", json!(is_data_property))
    }

    pub fn build(self) -> Value {
        Value::Object(self.field)
    }
}

/// Property payload with a value, a validity flag and no messages.
pub fn create_property(value: Value, valid: bool) -> Value {
    json!({ "messages": [], "value": value, "valid": valid })
}

/// Placeholder filling a grid cell.
pub fn build_empty_cell(identifier: &str) -> Value {
    json!({
        IDENTIFIER: identifier,
        "displayType": "EDITABLE",
        "previewEmpty": true,
        "control": { IDENTIFIER: "EMPTY_CELL" },
    })
}

pub fn build_preview_text_field(identifier: &str) -> Value {
    json!({
        IDENTIFIER: identifier,
        "displayType": "READ_ONLY",
        "previewEmpty": true,
        "dataType": "text",
        "label": "",
        "maxLength": DEFAULT_MAX_LENGTH,
        "isMandatory": false,
        "rendered": true,
        "validators": [],
    })
}

/// Drops markup tags, keeping the text between them.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use idoc_util::{clone, clone_map, deep_equal_opt};
use serde_json::{Map, Value};

use crate::emitter::{change_payload, EventEmitter, Subscription, PROPERTY_CHANGED};
use crate::error::ModelError;

/// Observable attribute bag of one schema field or region.
///
/// Only attributes present in the source payload or named in the
/// predefined list can be written; a predefined attribute that was absent
/// reads as `None` until it is assigned. The nested `fields` of a region are
/// structural and live in the owning [`DefinitionModel`](super::DefinitionModel).
pub struct DefinitionModelProperty {
    data: RefCell<Map<String, Value>>,
    predefined: Rc<[String]>,
    emitter: EventEmitter,
}

impl DefinitionModelProperty {
    pub(crate) fn new(data: Map<String, Value>, predefined: Rc<[String]>) -> Self {
        Self {
            data: RefCell::new(data),
            predefined,
            emitter: EventEmitter::new(),
        }
    }

    pub fn get(&self, attribute: &str) -> Option<Value> {
        self.data.borrow().get(attribute).cloned()
    }

    pub fn has(&self, attribute: &str) -> bool {
        self.data.borrow().contains_key(attribute)
    }

    /// Whether `attribute` has an accessor on this node.
    pub fn accepts(&self, attribute: &str) -> bool {
        self.has(attribute) || self.predefined.iter().any(|name| name == attribute)
    }

    pub fn attributes(&self) -> Vec<String> {
        self.data.borrow().keys().cloned().collect()
    }

    /// Replaces `attribute` and publishes `{ attribute: value }` when the new
    /// value differs deeply. Returns whether anything changed.
    pub fn set(&self, attribute: &str, value: Value) -> Result<bool, ModelError> {
        if !self.accepts(attribute) {
            return Err(ModelError::UnknownAttribute(attribute.to_string()));
        }
        {
            let mut data = self.data.borrow_mut();
            if deep_equal_opt(data.get(attribute), Some(&value)) {
                return Ok(false);
            }
            data.insert(attribute.to_string(), value.clone());
        }
        self.emitter
            .publish(PROPERTY_CHANGED, &change_payload(attribute, value));
        Ok(true)
    }

    pub fn identifier(&self) -> Option<String> {
        self.get_str("identifier")
    }

    pub fn label(&self) -> Option<String> {
        self.get_str("label")
    }

    pub fn display_type(&self) -> Option<String> {
        self.get_str("displayType")
    }

    pub fn data_type(&self) -> Option<String> {
        self.get_str("dataType")
    }

    pub fn is_mandatory(&self) -> bool {
        self.get_bool("isMandatory").unwrap_or(false)
    }

    /// Fields render unless explicitly flagged otherwise.
    pub fn is_rendered(&self) -> bool {
        self.get_bool("rendered").unwrap_or(true)
    }

    pub fn max_length(&self) -> Option<u64> {
        self.get("maxLength").and_then(|v| v.as_u64())
    }

    fn get_str(&self, attribute: &str) -> Option<String> {
        self.data
            .borrow()
            .get(attribute)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn get_bool(&self, attribute: &str) -> Option<bool> {
        self.data.borrow().get(attribute).and_then(Value::as_bool)
    }

    pub fn serialize(&self) -> Map<String, Value> {
        self.data.borrow().clone()
    }

    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.emitter.subscribe(topic, handler)
    }
}

impl Clone for DefinitionModelProperty {
    fn clone(&self) -> Self {
        Self::new(clone_map(&self.data.borrow()), Rc::clone(&self.predefined))
    }
}

impl std::fmt::Debug for DefinitionModelProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DefinitionModelProperty")
            .field(&self.data.borrow())
            .finish()
    }
}

/// Single top-level attribute of a definition, observable on its own.
pub struct DefinitionAttribute {
    name: String,
    value: RefCell<Option<Value>>,
    emitter: EventEmitter,
}

impl DefinitionAttribute {
    pub(crate) fn new(name: &str, value: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: RefCell::new(value),
            emitter: EventEmitter::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    pub fn is_defined(&self) -> bool {
        self.value.borrow().is_some()
    }

    pub fn set(&self, value: Value) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if deep_equal_opt(current.as_ref(), Some(&value)) {
                return false;
            }
            *current = Some(value.clone());
        }
        self.emitter
            .publish(PROPERTY_CHANGED, &change_payload(&self.name, value));
        true
    }

    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.emitter.subscribe(topic, handler)
    }
}

impl Clone for DefinitionAttribute {
    fn clone(&self) -> Self {
        Self::new(&self.name, self.value.borrow().as_ref().map(clone))
    }
}

impl std::fmt::Debug for DefinitionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionAttribute")
            .field("name", &self.name)
            .field("value", &self.value.borrow())
            .finish()
    }
}

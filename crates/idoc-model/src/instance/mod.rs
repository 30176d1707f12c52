//! Runtime values of a form: one [`InstanceModelProperty`] per field plus the
//! aggregate validity of the whole set.

use std::cell::Cell;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::emitter::{EventEmitter, Subscription, MODEL_VALIDATED};
use crate::error::ModelError;
use crate::scheduler::Scheduler;

mod property;
mod sequence;

pub use property::{
    InstanceModelProperty, DATA_TYPE, DEFAULT_RICHTEXT_VALUE, DEFAULT_VALUE, DEFAULT_VALUE_LABEL,
    MESSAGES, RESULTS, RICHTEXT_VALUE, VALID, VALIDATORS, VALUE, VALUE_LABEL,
};
pub use sequence::SequenceMut;

/// Field identifier to property mapping for one business object.
pub struct InstanceModel {
    properties: IndexMap<String, InstanceModelProperty>,
    is_valid: Cell<bool>,
    emitter: EventEmitter,
    scheduler: Scheduler,
}

impl InstanceModel {
    pub fn new(payload: Value) -> Result<Self, ModelError> {
        Self::with_scheduler(payload, Scheduler::new())
    }

    /// Wraps every entry of `payload` in a property driven by `scheduler`.
    ///
    /// Each entry must be an object. The aggregate validity starts out
    /// `true` whatever the entries carry; only
    /// [`set_is_valid`](Self::set_is_valid) changes it.
    pub fn with_scheduler(payload: Value, scheduler: Scheduler) -> Result<Self, ModelError> {
        let Value::Object(entries) = payload else {
            return Err(ModelError::NotObject("instance model".to_string()));
        };
        let mut properties = IndexMap::with_capacity(entries.len());
        for (identifier, data) in entries {
            let Value::Object(data) = data else {
                return Err(ModelError::NotObject(identifier));
            };
            properties.insert(identifier, InstanceModelProperty::from_map(data, scheduler.clone()));
        }
        Ok(Self {
            properties,
            is_valid: Cell::new(true),
            emitter: EventEmitter::new(),
            scheduler,
        })
    }

    pub fn get(&self, identifier: &str) -> Option<&InstanceModelProperty> {
        self.properties.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.properties.contains_key(identifier)
    }

    pub fn properties(&self) -> &IndexMap<String, InstanceModelProperty> {
        &self.properties
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid.get()
    }

    /// Assigns the aggregate validity and always publishes
    /// [`MODEL_VALIDATED`], even when the value is unchanged.
    pub fn set_is_valid(&self, valid: bool) {
        self.is_valid.set(valid);
        self.emitter.publish(MODEL_VALIDATED, &Value::Bool(valid));
    }

    /// True when no property is explicitly invalid. Does not assign
    /// [`is_valid`](Self::is_valid).
    pub fn compute_validity(&self) -> bool {
        self.properties.values().all(|p| p.valid() != Some(false))
    }

    /// Adds a single property unless the identifier is taken.
    pub fn add_property(&mut self, identifier: &str, property: InstanceModelProperty) -> bool {
        if self.properties.contains_key(identifier) {
            return false;
        }
        self.properties.insert(identifier.to_string(), property);
        true
    }

    pub fn remove_property(&mut self, identifier: &str) -> Option<InstanceModelProperty> {
        self.properties.shift_remove(identifier)
    }

    /// Moves in the properties of `additional` whose identifiers are not
    /// present yet. Existing properties are never overwritten. Returns the
    /// identifiers that were added.
    pub fn add_properties_to_model(&mut self, additional: InstanceModel) -> Vec<String> {
        let mut added = Vec::new();
        for (identifier, property) in additional.properties {
            if self.add_property(&identifier, property) {
                added.push(identifier);
            }
        }
        if !added.is_empty() {
            tracing::debug!(added = ?added, "merged instance properties");
        }
        added
    }

    pub fn serialize(&self) -> Value {
        let entries: Map<String, Value> = self
            .properties
            .iter()
            .map(|(id, property)| (id.clone(), property.serialize()))
            .collect();
        Value::Object(entries)
    }

    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.emitter.subscribe(topic, handler)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

/// Independent deep copy. Neither the model subscriptions nor those of its
/// properties are carried over.
impl Clone for InstanceModel {
    fn clone(&self) -> Self {
        Self {
            properties: self
                .properties
                .iter()
                .map(|(id, property)| (id.clone(), property.clone()))
                .collect(),
            is_valid: Cell::new(self.is_valid.get()),
            emitter: EventEmitter::new(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl std::fmt::Debug for InstanceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceModel")
            .field("properties", &self.properties)
            .field("is_valid", &self.is_valid.get())
            .finish()
    }
}

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use idoc_util::{clone_map, deep_equal_opt};
use serde_json::{Map, Value};

use super::sequence::SequenceMut;
use crate::emitter::{change_payload, EventEmitter, Subscription, PROPERTY_CHANGED};
use crate::error::ModelError;
use crate::scheduler::Scheduler;

pub const VALUE: &str = "value";
pub const DEFAULT_VALUE: &str = "defaultValue";
pub const VALUE_LABEL: &str = "valueLabel";
pub const DEFAULT_VALUE_LABEL: &str = "defaultValueLabel";
pub const VALIDATORS: &str = "validators";
pub const MESSAGES: &str = "messages";
pub const VALID: &str = "valid";
pub const RICHTEXT_VALUE: &str = "richtextValue";
pub const DEFAULT_RICHTEXT_VALUE: &str = "defaultRichTextValue";
pub const DATA_TYPE: &str = "dataType";

/// Key of the sequence inside multi-valued relation values.
pub const RESULTS: &str = "results";

struct PropertyCell {
    data: RefCell<Map<String, Value>>,
    emitter: EventEmitter,
    pending: RefCell<BTreeSet<String>>,
}

/// Observable runtime value of one form field.
///
/// Attributes are read with [`get`](Self::get) and written with
/// [`set`](Self::set), which publishes [`PROPERTY_CHANGED`] when the new value
/// differs deeply from the old one. Sequence attributes (an array, or an
/// object carrying a `results` array) are edited in place through
/// [`sequence_mut`](Self::sequence_mut); those edits are coalesced into one
/// publish per attribute on the next scheduler turn.
pub struct InstanceModelProperty {
    cell: Rc<PropertyCell>,
    scheduler: Scheduler,
}

impl InstanceModelProperty {
    pub fn new(data: Value) -> Result<Self, ModelError> {
        Self::with_scheduler(data, Scheduler::new())
    }

    pub fn with_scheduler(data: Value, scheduler: Scheduler) -> Result<Self, ModelError> {
        match data {
            Value::Object(map) => Ok(Self::from_map(map, scheduler)),
            _ => Err(ModelError::NotObject("property".to_string())),
        }
    }

    pub fn from_map(data: Map<String, Value>, scheduler: Scheduler) -> Self {
        Self {
            cell: Rc::new(PropertyCell {
                data: RefCell::new(data),
                emitter: EventEmitter::new(),
                pending: RefCell::new(BTreeSet::new()),
            }),
            scheduler,
        }
    }

    pub fn get(&self, attribute: &str) -> Option<Value> {
        self.cell.data.borrow().get(attribute).cloned()
    }

    pub fn has(&self, attribute: &str) -> bool {
        self.cell.data.borrow().contains_key(attribute)
    }

    pub fn attributes(&self) -> Vec<String> {
        self.cell.data.borrow().keys().cloned().collect()
    }

    /// Replaces `attribute` and publishes `{ attribute: value }`.
    ///
    /// Returns `false` without publishing when the current value is deeply
    /// equal to `value`.
    pub fn set(&self, attribute: &str, value: Value) -> bool {
        {
            let mut data = self.cell.data.borrow_mut();
            if deep_equal_opt(data.get(attribute), Some(&value)) {
                return false;
            }
            data.insert(attribute.to_string(), value.clone());
        }
        self.cell
            .emitter
            .publish(PROPERTY_CHANGED, &change_payload(attribute, value));
        true
    }

    pub fn is_sequence(&self, attribute: &str) -> bool {
        sequence_slot(&mut self.cell.data.borrow_mut(), attribute).is_some()
    }

    /// Mutation handle for a sequence attribute.
    pub fn sequence_mut(&self, attribute: &str) -> Result<SequenceMut<'_>, ModelError> {
        if !self.is_sequence(attribute) {
            return Err(ModelError::NotSequence(attribute.to_string()));
        }
        Ok(SequenceMut::new(self, attribute))
    }

    pub(crate) fn read_sequence(&self, attribute: &str) -> Result<Vec<Value>, ModelError> {
        sequence_slot(&mut self.cell.data.borrow_mut(), attribute)
            .map(|items| items.clone())
            .ok_or_else(|| ModelError::NotSequence(attribute.to_string()))
    }

    pub(crate) fn mutate_sequence<R, F>(&self, attribute: &str, mutate: F) -> Result<R, ModelError>
    where
        F: FnOnce(&mut Vec<Value>) -> R,
    {
        let out = {
            let mut data = self.cell.data.borrow_mut();
            let items = sequence_slot(&mut data, attribute)
                .ok_or_else(|| ModelError::NotSequence(attribute.to_string()))?;
            mutate(items)
        };
        self.schedule_change(attribute);
        Ok(out)
    }

    fn schedule_change(&self, attribute: &str) {
        if !self.cell.pending.borrow_mut().insert(attribute.to_string()) {
            return;
        }
        let cell = Rc::downgrade(&self.cell);
        let attribute = attribute.to_string();
        self.scheduler.defer(move || {
            let Some(cell) = cell.upgrade() else {
                return;
            };
            cell.pending.borrow_mut().remove(&attribute);
            let value = cell
                .data
                .borrow()
                .get(&attribute)
                .cloned()
                .unwrap_or(Value::Null);
            cell.emitter
                .publish(PROPERTY_CHANGED, &change_payload(&attribute, value));
        });
    }

    pub fn has_pending_change(&self, attribute: &str) -> bool {
        self.cell.pending.borrow().contains(attribute)
    }

    /// Plain attribute object, as sent back to the server.
    pub fn serialize(&self) -> Value {
        Value::Object(self.cell.data.borrow().clone())
    }

    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.cell.emitter.subscribe(topic, handler)
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.cell.emitter
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn value(&self) -> Option<Value> {
        self.get(VALUE)
    }

    pub fn set_value(&self, value: Value) -> bool {
        self.set(VALUE, value)
    }

    pub fn default_value(&self) -> Option<Value> {
        self.get(DEFAULT_VALUE)
    }

    pub fn value_label(&self) -> Option<Value> {
        self.get(VALUE_LABEL)
    }

    pub fn default_value_label(&self) -> Option<Value> {
        self.get(DEFAULT_VALUE_LABEL)
    }

    pub fn richtext_value(&self) -> Option<Value> {
        self.get(RICHTEXT_VALUE)
    }

    pub fn default_richtext_value(&self) -> Option<Value> {
        self.get(DEFAULT_RICHTEXT_VALUE)
    }

    pub fn data_type(&self) -> Option<String> {
        self.get(DATA_TYPE)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Tri-state validity: `None` until a validator has run.
    pub fn valid(&self) -> Option<bool> {
        self.get(VALID).and_then(|v| v.as_bool())
    }

    pub fn set_valid(&self, valid: bool) -> bool {
        self.set(VALID, Value::Bool(valid))
    }

    pub fn messages(&self) -> Vec<Value> {
        match self.get(MESSAGES) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    pub fn set_messages(&self, messages: Vec<Value>) -> bool {
        self.set(MESSAGES, Value::Array(messages))
    }

    pub fn validators(&self) -> Vec<Value> {
        match self.get(VALIDATORS) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}

/// Independent deep copy sharing the scheduler. Subscriptions are not
/// carried over.
impl Clone for InstanceModelProperty {
    fn clone(&self) -> Self {
        Self::from_map(clone_map(&self.cell.data.borrow()), self.scheduler.clone())
    }
}

impl std::fmt::Debug for InstanceModelProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceModelProperty")
            .field("data", &self.cell.data.borrow())
            .finish()
    }
}

fn sequence_slot<'a>(data: &'a mut Map<String, Value>, attribute: &str) -> Option<&'a mut Vec<Value>> {
    match data.get_mut(attribute)? {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get_mut(RESULTS)?.as_array_mut(),
        _ => None,
    }
}

//! Topic based publish/subscribe.
//!
//! Every observable wrapper owns one [`EventEmitter`]. Dispatch is
//! synchronous and follows registration order. Handlers may publish again
//! from inside a publish, including on the emitter that is calling them; the
//! nested publish completes before the outer one moves on. A handler that
//! panics unwinds out of [`EventEmitter::publish`], so handlers registered
//! after it do not see that publish.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

/// Topic published when an attribute of a wrapper changes. The payload is a
/// single-key object naming the attribute and carrying its new value.
pub const PROPERTY_CHANGED: &str = "propertyChanged";

/// Topic published when the aggregate validity of an instance model is
/// assigned. The payload is a boolean.
pub const MODEL_VALIDATED: &str = "modelValidated";

type Handler = Rc<dyn Fn(&Value)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: BTreeMap<String, Vec<(u64, Handler)>>,
}

#[derive(Default)]
pub struct EventEmitter {
    registry: Rc<RefCell<Registry>>,
}

/// Registration handle returned by [`EventEmitter::subscribe`].
///
/// Dropping the handle keeps the handler registered; only
/// [`Subscription::unsubscribe`] removes it.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    topic: String,
    id: u64,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic`. Handlers keep their own state behind
    /// a `Cell` or `RefCell` since they can be re-entered.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id = registry.next_id.saturating_add(1);
        let id = registry.next_id;
        registry
            .topics
            .entry(topic.to_string())
            .or_default()
            .push((id, Rc::new(handler)));
        tracing::trace!(topic, id, "subscribe");
        Subscription {
            registry: Rc::downgrade(&self.registry),
            topic: topic.to_string(),
            id,
        }
    }

    /// Invokes the handlers currently registered for `topic`.
    ///
    /// The handler list is snapshotted first: handlers subscribed during
    /// this publish are not called until the next one. No registry borrow is
    /// held while a handler runs.
    pub fn publish(&self, topic: &str, payload: &Value) {
        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .topics
            .get(topic)
            .map(|entries| entries.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();
        tracing::trace!(topic, listeners = handlers.len(), "publish");
        for handler in handlers {
            handler(payload);
        }
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.registry
            .borrow()
            .topics
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        let mut map = f.debug_map();
        for (topic, handlers) in &registry.topics {
            map.entry(topic, &handlers.len());
        }
        map.finish()
    }
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Removes exactly this registration. Returns `false` when the emitter
    /// is gone or the registration was already removed.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        let Some(entries) = registry.topics.get_mut(&self.topic) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(id, _)| *id != self.id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            registry.topics.remove(&self.topic);
        }
        tracing::trace!(topic = %self.topic, id = self.id, removed, "unsubscribe");
        removed
    }
}

/// Builds the `{ attribute: value }` payload of a [`PROPERTY_CHANGED`] publish.
pub(crate) fn change_payload(attribute: &str, value: Value) -> Value {
    let mut payload = serde_json::Map::new();
    payload.insert(attribute.to_string(), value);
    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn Fn(&Value)>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = Rc::clone(&seen);
        let make = move |name: &'static str| {
            let seen = Rc::clone(&seen2);
            Box::new(move |payload: &Value| seen.borrow_mut().push(format!("{name}:{payload}")))
                as Box<dyn Fn(&Value)>
        };
        (seen, make)
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let emitter = EventEmitter::new();
        let (seen, make) = recorder();
        emitter.subscribe("topic", make("a"));
        emitter.subscribe("topic", make("b"));
        emitter.publish("topic", &json!(1));
        assert_eq!(*seen.borrow(), vec!["a:1", "b:1"]);
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let emitter = EventEmitter::new();
        emitter.publish("nobody", &json!(null));
        assert_eq!(emitter.listener_count("nobody"), 0);
    }

    #[test]
    fn topics_do_not_leak_into_each_other() {
        let emitter = EventEmitter::new();
        let (seen, make) = recorder();
        emitter.subscribe(PROPERTY_CHANGED, make("p"));
        emitter.subscribe(MODEL_VALIDATED, make("m"));
        emitter.publish(MODEL_VALIDATED, &json!(true));
        assert_eq!(*seen.borrow(), vec!["m:true"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_registration() {
        let emitter = EventEmitter::new();
        let (seen, make) = recorder();
        let first = emitter.subscribe("topic", make("a"));
        emitter.subscribe("topic", make("b"));
        assert!(first.unsubscribe());
        emitter.publish("topic", &json!(2));
        assert_eq!(*seen.borrow(), vec!["b:2"]);
        assert_eq!(emitter.listener_count("topic"), 1);
    }

    #[test]
    fn unsubscribe_after_emitter_dropped() {
        let emitter = EventEmitter::new();
        let sub = emitter.subscribe("topic", |_| {});
        drop(emitter);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn handler_may_subscribe_during_publish() {
        let emitter = Rc::new(EventEmitter::new());
        let count = Rc::new(RefCell::new(0));
        let inner_emitter = Rc::clone(&emitter);
        let inner_count = Rc::clone(&count);
        emitter.subscribe("topic", move |_| {
            let c = Rc::clone(&inner_count);
            inner_emitter.subscribe("topic", move |_| *c.borrow_mut() += 1);
        });
        emitter.publish("topic", &json!(null));
        assert_eq!(*count.borrow(), 0);
        emitter.publish("topic", &json!(null));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn handler_may_publish_into_its_own_emitter() {
        let emitter = Rc::new(EventEmitter::new());
        let (seen, make) = recorder();
        let inner = Rc::clone(&emitter);
        emitter.subscribe("topic", move |payload| {
            if payload == &json!("outer") {
                inner.publish("topic", &json!("inner"));
            }
        });
        emitter.subscribe("topic", make("b"));
        emitter.publish("topic", &json!("outer"));
        assert_eq!(*seen.borrow(), vec!["b:\"inner\"", "b:\"outer\""]);
    }

    #[test]
    #[should_panic(expected = "handler failure")]
    fn panicking_handler_propagates() {
        let emitter = EventEmitter::new();
        emitter.subscribe("topic", |_| panic!("handler failure"));
        emitter.publish("topic", &json!(null));
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use idoc_model::instance::VALUE;
use idoc_model::{DefinitionModel, InstanceModel, Scheduler, PROPERTY_CHANGED};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z ]{0,12}".prop_map(Value::String),
    ]
}

fn instance_payload() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map("[a-z]{1,8}", (scalar(), scalar()), 0..12).prop_map(|entries| {
        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(id, (value, default))| (id, json!({"value": value, "defaultValue": default})))
            .collect();
        Value::Object(map)
    })
}

/// Top-level layout: `None` is a plain field, `Some(n)` a region with `n`
/// plain children.
fn layout() -> impl Strategy<Value = Vec<Option<usize>>> {
    proptest::collection::vec(proptest::option::of(0..5usize), 0..10)
}

fn definition_payload(layout: &[Option<usize>]) -> Value {
    let fields: Vec<Value> = layout
        .iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            None => json!({"identifier": format!("f{i}")}),
            Some(children) => json!({
                "identifier": format!("r{i}"),
                "fields": (0..*children)
                    .map(|c| json!({"identifier": format!("r{i}_{c}")}))
                    .collect::<Vec<_>>()
            }),
        })
        .collect();
    json!({ "fields": fields })
}

proptest! {
    #[test]
    fn instance_serialize_round_trips(payload in instance_payload()) {
        let model = InstanceModel::new(payload.clone()).expect("model");
        prop_assert_eq!(model.serialize(), payload.clone());
        prop_assert_eq!(model.clone().serialize(), payload);
    }

    #[test]
    fn definition_serialize_round_trips(layout in layout()) {
        let payload = definition_payload(&layout);
        let model = DefinitionModel::new(&payload).expect("definition");
        prop_assert_eq!(model.serialize(), payload);
    }

    #[test]
    fn flat_index_counts_plain_fields(layout in layout()) {
        let model = DefinitionModel::new(&definition_payload(&layout)).expect("definition");
        let expected: usize = layout.iter().map(|entry| entry.unwrap_or(1)).sum();
        prop_assert_eq!(model.flat_index().len(), expected);
        prop_assert_eq!(model.flat_sequence().len(), expected);
        prop_assert!(model.flat_fields().all(|node| !node.is_region()));
    }

    #[test]
    fn pushes_within_a_turn_publish_once(values in proptest::collection::vec(any::<i32>(), 1..40)) {
        let scheduler = Scheduler::new();
        let model = InstanceModel::with_scheduler(json!({"tags": {"value": []}}), scheduler.clone())
            .expect("model");
        let tags = model.get("tags").expect("tags");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        tags.subscribe(PROPERTY_CHANGED, move |payload| sink.borrow_mut().push(payload.clone()));

        let sequence = tags.sequence_mut(VALUE).expect("sequence");
        for value in &values {
            sequence.push(json!(value)).expect("push");
        }
        prop_assert_eq!(scheduler.run_pending(), 1);
        let expected: Vec<Value> = values.iter().map(|v| json!(v)).collect();
        prop_assert_eq!(seen.borrow().clone(), vec![json!({ "value": expected })]);
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use idoc_model::instance::{RICHTEXT_VALUE, VALUE};
use idoc_model::utils::{update_object_property, FieldBuilder};
use idoc_model::{DefinitionModel, FormModels, InstanceModel, MODEL_VALIDATED, PROPERTY_CHANGED};
use serde_json::{json, Map, Value};

fn definition() -> DefinitionModel {
    DefinitionModel::new(&json!({
        "identifier": "document",
        "fields": [
            FieldBuilder::new("title").label("Title").mandatory(true).build(),
            FieldBuilder::region("details", "Details", vec![
                FieldBuilder::new("pages").data_type("int").build(),
                FieldBuilder::new("description").control("RICHTEXT").build(),
            ]),
            FieldBuilder::new("status").codelist(1).build(),
            FieldBuilder::new("references").data_type("any").data_property(false).build(),
            FieldBuilder::new("secret").mandatory(true).rendered(false).build(),
        ]
    }))
    .expect("definition")
}

fn instance() -> InstanceModel {
    InstanceModel::new(json!({
        "title": {"value": "Report", "defaultValue": "Report"},
        "pages": {"value": "12", "defaultValue": "12"},
        "description": {
            "value": "Hi",
            "defaultValue": "Hi",
            "richtextValue": "<b>Hi</b>",
            "defaultRichTextValue": "<b>Hi</b>"
        },
        "status": {"value": "DRAFT", "defaultValue": "DRAFT", "valueLabel": "Draft", "defaultValueLabel": "Draft"},
        "references": {
            "value": {"results": ["emf:1"], "add": [], "remove": []},
            "defaultValue": {"results": ["emf:1"], "add": [], "remove": []}
        }
    }))
    .expect("instance")
}

fn models() -> FormModels {
    FormModels::new(definition(), instance())
}

fn value(models: &FormModels, identifier: &str, attribute: &str) -> Option<Value> {
    models.instance.get(identifier).expect("property").get(attribute)
}

#[test]
fn unchanged_models_have_no_changeset() {
    let models = models();
    assert!(!models.is_changed());
    assert!(models.changeset(false).is_empty());
    assert!(models.changeset(true).is_empty());
}

#[test]
fn cleared_values_with_a_default_become_null() {
    let models = models();
    models.instance.get("title").expect("title").set_value(json!(""));
    assert!(models.is_changed());
    assert_eq!(models.changeset(false).get("title"), Some(&Value::Null));
}

#[test]
fn values_never_set_are_omitted_when_cleared() {
    let models = FormModels::new(
        definition(),
        InstanceModel::new(json!({"note": {"value": "x"}})).expect("instance"),
    );
    assert_eq!(models.changeset(false).get("note"), Some(&json!("x")));
    models.instance.get("note").expect("note").set_value(json!(""));
    assert!(models.changeset(false).is_empty());
}

#[test]
fn numbers_compare_numerically_outside_drafts() {
    let models = models();
    models.instance.get("pages").expect("pages").set_value(json!("12.0"));
    assert!(models.changeset(false).is_empty());
    assert_eq!(models.changeset(true).get("pages"), Some(&json!("12.0")));

    models.instance.get("pages").expect("pages").set_value(json!("13"));
    assert_eq!(models.changeset(false).get("pages"), Some(&json!(13.0)));

    // Parsing stops at the second decimal point.
    models.instance.get("pages").expect("pages").set_value(json!("12.0.5"));
    assert!(models.changeset(false).is_empty());
    models.instance.get("pages").expect("pages").set_value(json!("13.5.1"));
    assert_eq!(models.changeset(false).get("pages"), Some(&json!(13.5)));
}

#[test]
fn richtext_changes_carry_markup() {
    let models = models();
    let description = models.instance.get("description").expect("description");
    description.set(RICHTEXT_VALUE, json!("<i>Bye</i>"));
    description.set_value(json!("Bye"));

    assert_eq!(models.changeset(false).get("description"), Some(&json!("<i>Bye</i>")));
    assert_eq!(models.changeset(true).get("description"), Some(&json!("<i>Bye</i>")));
}

#[test]
fn relation_changes_are_sent_as_deltas() {
    let models = models();
    assert!(update_object_property(&models.instance, "references", &["emf:2"]));
    assert_eq!(
        models.changeset(false).get("references"),
        Some(&json!({"add": ["emf:2"], "remove": []}))
    );
}

#[test]
fn revert_refills_array_values_in_place() {
    let definition = DefinitionModel::new(&json!({
        "identifier": "document",
        "fields": [FieldBuilder::new("keywords").build()]
    }))
    .expect("definition");
    let instance = InstanceModel::new(json!({
        "keywords": {"value": ["draft", "internal"], "defaultValue": ["draft"]}
    }))
    .expect("instance");
    let models = FormModels::new(definition, instance);
    let keywords = models.instance.get("keywords").expect("keywords");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    keywords.subscribe(PROPERTY_CHANGED, move |payload| sink.borrow_mut().push(payload.clone()));

    models.revert_changes().expect("revert");
    assert_eq!(keywords.value(), Some(json!(["draft"])));
    assert!(seen.borrow().is_empty());

    keywords.scheduler().run_pending();
    assert_eq!(*seen.borrow(), vec![json!({"value": ["draft"]})]);
}

#[test]
fn revert_restores_defaults() {
    let models = models();
    models.instance.get("title").expect("title").set_value(json!("Other"));
    let status = models.instance.get("status").expect("status");
    status.set_value(json!("DONE"));
    status.set("valueLabel", json!("Done"));
    let description = models.instance.get("description").expect("description");
    description.set(RICHTEXT_VALUE, json!("<i>Bye</i>"));

    models.revert_changes().expect("revert");

    assert!(!models.is_changed());
    assert_eq!(value(&models, "title", VALUE), Some(json!("Report")));
    assert_eq!(value(&models, "status", "valueLabel"), Some(json!("Draft")));
    assert_eq!(value(&models, "description", RICHTEXT_VALUE), Some(json!("<b>Hi</b>")));
}

#[test]
fn merged_properties_become_the_new_defaults() {
    let mut models = models();
    let incoming: Map<String, Value> = serde_json::from_value(json!({
        "status": [{"id": "A", "text": "Alpha"}, {"id": "B", "text": "Beta"}],
        "description": "<p>New</p>",
        "extra": 5
    }))
    .expect("properties");

    let added = models.merge_properties(&incoming);

    assert_eq!(added, vec!["extra".to_string()]);
    assert_eq!(value(&models, "status", VALUE), Some(json!(["A", "B"])));
    assert_eq!(value(&models, "status", "valueLabel"), Some(json!("Alpha, Beta")));
    assert_eq!(value(&models, "status", "defaultValueLabel"), Some(json!("Alpha, Beta")));
    assert_eq!(value(&models, "description", VALUE), Some(json!("New")));
    assert_eq!(value(&models, "description", "defaultRichTextValue"), Some(json!("<p>New</p>")));
    assert_eq!(value(&models, "extra", "defaultValue"), Some(json!(5)));
    assert!(!models.is_changed());
    assert!(models.changeset(false).is_empty());
}

#[test]
fn mandatory_checks_ignore_hidden_fields() {
    let models = models();
    assert!(models.check_mandatory());
    models.instance.get("title").expect("title").set_value(json!("  "));
    assert!(!models.check_mandatory());
}

#[test]
fn validate_flags_empty_mandatory_fields() {
    let models = models();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    models
        .instance
        .subscribe(MODEL_VALIDATED, move |payload| sink.borrow_mut().push(payload.clone()));

    let title = models.instance.get("title").expect("title");
    title.set_value(Value::Null);
    assert!(!models.validate());
    assert_eq!(title.valid(), Some(false));
    assert_eq!(title.messages(), vec![json!({"id": "mandatory"})]);
    assert!(!models.instance.is_valid());

    title.set_value(json!("Report"));
    assert!(models.validate());
    assert_eq!(title.valid(), Some(true));
    assert!(title.messages().is_empty());
    assert_eq!(*seen.borrow(), vec![json!(false), json!(true)]);
}

#[test]
fn serialize_pairs_both_models() {
    let models = models();
    let out = models.serialize();
    assert_eq!(out["viewModel"], definition().serialize());
    assert_eq!(out["validationModel"], instance().serialize());

    let copy = models.clone();
    copy.instance.get("title").expect("title").set_value(json!("Copy"));
    assert_eq!(value(&models, "title", VALUE), Some(json!("Report")));
}

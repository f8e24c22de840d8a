//! Mutation API and state machine of a single business object.

mod common;

use bo_persist::domain::schema::{ObjectRule, ReadWriteRule};
use bo_persist::{
    BusinessObject, ClassDefRegistry, ClassDefinition, PersistError, PropDefinition, PropType,
    PropValue,
};
use std::sync::Arc;

fn invoice_line() -> BusinessObject {
    let registry = common::registry();
    BusinessObject::new(registry.class_def("InvoiceLine").unwrap())
}

#[test]
fn new_object_is_new_and_editing() {
    let line = invoice_line();
    let state = line.state();
    assert!(state.is_new());
    assert!(state.is_editing());
    assert!(!state.is_deleted());
    assert!(!state.is_dirty());
    assert_eq!(line.get_i64("Quantity").unwrap(), Some(1));
}

#[test]
fn invoice_line_without_value_is_invalid_until_set() {
    let mut line = invoice_line();
    line.set_property_value("InvoiceID", uuid::Uuid::new_v4()).unwrap();

    assert!(!line.is_valid());
    assert!(line
        .is_valid_message()
        .contains("'Value' is a compulsory field and has no value"));

    line.set_property_value("Value", 12.5).unwrap();
    assert!(line.is_valid(), "{}", line.is_valid_message());
    assert!(line.is_dirty());
    assert!(line.state().is_new());
}

#[test]
fn object_id_key_is_exempt_while_new() {
    let mut line = invoice_line();
    line.set_property_value("InvoiceID", uuid::Uuid::new_v4()).unwrap();
    line.set_property_value("Value", 1.0).unwrap();
    assert!(line.get_property_value("LineID").unwrap().is_null());
    assert!(line.is_valid(), "{}", line.is_valid_message());
}

#[test]
fn setting_back_to_persisted_value_clears_dirty() {
    let registry = common::registry();
    let class_def = registry.class_def("Customer").unwrap();
    let mut values = indexmap::IndexMap::new();
    values.insert("Code".to_string(), PropValue::from("C001"));
    values.insert("Name".to_string(), PropValue::from("Acme"));
    let mut customer = BusinessObject::from_persisted(class_def, values);

    assert!(!customer.state().is_new());
    assert!(!customer.state().is_editing());

    customer.set_property_value("Name", "Acme Ltd").unwrap();
    assert!(customer.is_dirty());
    assert!(customer.state().is_editing());

    customer.set_property_value("Name", "Acme").unwrap();
    assert!(!customer.is_dirty());
}

#[test]
fn invalid_value_is_kept_and_reported() {
    let mut line = invoice_line();
    let long = "x".repeat(41);
    line.set_property_value("Description", long.as_str()).unwrap();
    assert_eq!(line.get_string("Description").unwrap(), Some(long));
    assert!(line
        .is_valid_message()
        .contains("'Description' cannot be longer than 40 characters"));
}

#[test]
fn type_and_name_errors_are_rejected() {
    let mut line = invoice_line();
    let err = line.set_property_value("Quantity", "lots").unwrap_err();
    assert!(matches!(err, PersistError::TypeMismatch { .. }), "{err}");

    let err = line.set_property_value("Colour", "red").unwrap_err();
    assert!(matches!(err, PersistError::UnknownProperty { .. }), "{err}");

    let err = line.set_property_value("Value", f64::NAN).unwrap_err();
    assert!(matches!(err, PersistError::TypeMismatch { .. }), "{err}");
    let err = line.set_property_value("Value", "NaN").unwrap_err();
    assert!(matches!(err, PersistError::TypeMismatch { .. }), "{err}");
    assert!(!line.is_dirty());

    // integers widen into decimal properties
    line.set_property_value("Value", 3).unwrap();
    assert_eq!(line.get_f64("Value").unwrap(), Some(3.0));
}

#[test]
fn cancel_edits_restores_persisted_state() {
    let registry = common::registry();
    let class_def = registry.class_def("Customer").unwrap();
    let mut values = indexmap::IndexMap::new();
    values.insert("Code".to_string(), PropValue::from("C001"));
    values.insert("Name".to_string(), PropValue::from("Acme"));
    let mut customer = BusinessObject::from_persisted(class_def, values);

    customer.set_property_value("Name", "Other").unwrap();
    customer.mark_for_delete();
    assert!(customer.state().is_deleted());

    customer.cancel_edits();
    let state = customer.state();
    assert!(!state.is_deleted());
    assert!(!state.is_dirty());
    assert!(!state.is_editing());
    assert_eq!(customer.get_string("Name").unwrap().as_deref(), Some("Acme"));
}

#[test]
fn read_write_rules_are_enforced() {
    let code = PropDefinition::new("Code", PropType::String)
        .compulsory()
        .read_write(ReadWriteRule::WriteNew);
    let registry = ClassDefRegistry::from_definitions(vec![ClassDefinition::new("Account")
        .natural_key(["Code"])
        .prop(code)
        .prop(PropDefinition::new("Balance", PropType::Decimal).read_write(ReadWriteRule::ReadOnly))])
    .unwrap();
    let class_def = registry.class_def("Account").unwrap();

    let mut account = BusinessObject::new(class_def.clone());
    account.set_property_value("Code", "A1").unwrap();
    let err = account.set_property_value("Balance", 10.0).unwrap_err();
    assert!(matches!(err, PersistError::ReadWriteRule { .. }), "{err}");

    let mut values = indexmap::IndexMap::new();
    values.insert("Code".to_string(), PropValue::from("A1"));
    let mut loaded = BusinessObject::from_persisted(class_def, values);
    let err = loaded.set_property_value("Code", "A2").unwrap_err();
    assert!(matches!(err, PersistError::ReadWriteRule { .. }), "{err}");
}

#[derive(Debug)]
struct NonNegativeTotal;

impl ObjectRule for NonNegativeTotal {
    fn name(&self) -> &str {
        "non_negative_total"
    }

    fn check(&self, bo: &BusinessObject) -> Option<String> {
        match bo.get_f64("Total") {
            Ok(Some(total)) if total < 0.0 => Some("Total cannot be negative".to_string()),
            _ => None,
        }
    }
}

#[test]
fn class_rules_join_property_failures() {
    let mut builder = ClassDefRegistry::builder();
    for def in common::definitions() {
        builder = builder.define(def);
    }
    let registry = builder
        .object_rule("Invoice", Arc::new(NonNegativeTotal))
        .build()
        .unwrap();
    let mut invoice = BusinessObject::new(registry.class_def("Invoice").unwrap());
    invoice.set_property_value("Total", -5.0).unwrap();

    let reasons = invoice.invalid_reasons();
    assert_eq!(
        reasons,
        vec![
            "'Invoice Number' is a compulsory field and has no value".to_string(),
            "Total cannot be negative".to_string(),
        ]
    );
    assert_eq!(invoice.is_valid_message(), reasons.join("\n"));
}

#[test]
fn registry_loads_json_definitions() {
    let json = r#"[
        {
            "class_name": "Vehicle",
            "table_name": "vehicle",
            "primary_key": { "props": ["VehicleID"] },
            "properties": [
                { "name": "VehicleID", "prop_type": "guid" },
                { "name": "Registration", "prop_type": "string", "compulsory": true,
                  "rules": [{ "kind": "length", "max": 8 }] }
            ]
        },
        {
            "class_name": "Truck",
            "table_name": "truck",
            "super_class": "Vehicle",
            "properties": [{ "name": "Axles", "prop_type": "integer",
                             "default": { "type": "integer", "value": 2 } }]
        }
    ]"#;
    let registry = ClassDefRegistry::from_json(json).unwrap();
    let truck = registry.class_def("Truck").unwrap();
    assert!(truck.is_a("Vehicle"));
    assert_eq!(truck.table_levels().len(), 2);
    assert!(registry.list_classes().contains(&"BOSequenceNumber".to_string()));

    let bo = BusinessObject::new(truck);
    assert_eq!(bo.get_i64("Axles").unwrap(), Some(2));
}

#[test]
fn registry_rejects_broken_schemas() {
    let cycle = ClassDefRegistry::from_definitions(vec![
        ClassDefinition::new("A").inherits("B"),
        ClassDefinition::new("B").inherits("A"),
    ]);
    assert!(matches!(cycle, Err(PersistError::SchemaMismatch(_))));

    let unknown_key = ClassDefRegistry::from_definitions(vec![ClassDefinition::new("A")
        .natural_key(["Missing"])
        .prop(PropDefinition::new("Name", PropType::String))]);
    assert!(matches!(unknown_key, Err(PersistError::SchemaMismatch(_))));

    let non_guid_id = ClassDefRegistry::from_definitions(vec![ClassDefinition::new("A")
        .object_id("ID")
        .prop(PropDefinition::new("ID", PropType::Integer))]);
    assert!(matches!(non_guid_id, Err(PersistError::SchemaMismatch(_))));
}

//! Shared fixtures: an invoicing schema plus a three-level party hierarchy.
#![allow(dead_code)]

use bo_persist::domain::schema::{ClassDefinition, PropDefinition, RuleDefinition};
use bo_persist::{ClassDefRegistry, DataAccessor, InMemoryStore, PropType};
use std::sync::Arc;

pub fn definitions() -> Vec<ClassDefinition> {
    vec![
        ClassDefinition::new("Invoice")
            .table("invoice")
            .object_id("InvoiceID")
            .prop(PropDefinition::new("InvoiceID", PropType::Guid))
            .prop(PropDefinition::new("InvoiceNumber", PropType::String).compulsory())
            .prop(PropDefinition::new("Total", PropType::Decimal).default_value(0.0))
            .prop(PropDefinition::new("Modified", PropType::Date))
            .alternate_key(["InvoiceNumber"])
            .audit_property("Modified"),
        ClassDefinition::new("InvoiceLine")
            .table("invoice_line")
            .object_id("LineID")
            .prop(PropDefinition::new("LineID", PropType::Guid))
            .prop(PropDefinition::new("InvoiceID", PropType::Guid).compulsory())
            .prop(
                PropDefinition::new("Description", PropType::String).rule(RuleDefinition::Length {
                    min: None,
                    max: Some(40),
                    message: None,
                }),
            )
            .prop(PropDefinition::new("Quantity", PropType::Integer).default_value(1i64))
            .prop(PropDefinition::new("Value", PropType::Decimal).compulsory()),
        ClassDefinition::new("Party")
            .table("party")
            .object_id("PartyID")
            .prop(PropDefinition::new("PartyID", PropType::Guid))
            .prop(PropDefinition::new("Name", PropType::String).compulsory()),
        ClassDefinition::new("Organisation")
            .table("organisation")
            .inherits("Party")
            .prop(PropDefinition::new("TaxNumber", PropType::String)),
        ClassDefinition::new("Company")
            .table("company")
            .inherits("Organisation")
            .super_class_id_column("CompanyID")
            .prop(PropDefinition::new("StockCode", PropType::String)),
        ClassDefinition::new("Customer")
            .table("customer")
            .natural_key(["Code"])
            .prop(PropDefinition::new("Code", PropType::String).compulsory())
            .prop(PropDefinition::new("Name", PropType::String)),
    ]
}

pub fn registry() -> ClassDefRegistry {
    ClassDefRegistry::from_definitions(definitions()).expect("fixture schema resolves")
}

/// Accessor over a fresh in-memory store; the returned store handle shares
/// its tables so tests can inspect rows and inject failures.
pub async fn memory_accessor() -> (DataAccessor, InMemoryStore) {
    let store = InMemoryStore::new();
    let accessor = DataAccessor::new(Arc::new(store.clone()), registry())
        .await
        .expect("in-memory schema");
    (accessor, store)
}

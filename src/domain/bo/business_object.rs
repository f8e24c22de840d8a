//! The business-object state machine.
//!
//! An object is created New+Editing, becomes Dirty when a property moves away
//! from its persisted value, and only returns to a clean persisted state via
//! [`after_save`](BusinessObject::after_save), which the committer calls once
//! the store has accepted the batch.

use crate::domain::bo::prop::BOProp;
use crate::domain::bo::state::BOState;
use crate::domain::schema::{ClassDef, ReadWriteRule};
use crate::domain::value::PropValue;
use crate::error::{PersistError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Handle staged into committers and collections.
pub type SharedBo = Arc<Mutex<BusinessObject>>;

/// Locks a shared object. A poisoned lock still yields the object: its state
/// is only ever replaced wholesale, so a panic elsewhere cannot leave it torn.
pub fn lock(bo: &SharedBo) -> MutexGuard<'_, BusinessObject> {
    bo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
pub struct BusinessObject {
    class_def: Arc<ClassDef>,
    props: IndexMap<String, BOProp>,
    is_new: bool,
    is_deleted: bool,
    is_editing: bool,
}

/// Full copy of an object's state taken before a commit attempt.
#[derive(Debug, Clone)]
pub struct BOSnapshot(BusinessObject);

impl BusinessObject {
    /// Creates a new, unsaved object with every property at its default.
    pub fn new(class_def: Arc<ClassDef>) -> Self {
        let props = class_def
            .all_props()
            .map(|def| {
                let default = def.default_value().clone();
                (
                    def.name().to_string(),
                    BOProp::new(def.clone(), default.clone(), default),
                )
            })
            .collect();
        let mut bo = Self {
            class_def,
            props,
            is_new: true,
            is_deleted: false,
            is_editing: true,
        };
        bo.validate_all();
        bo
    }

    /// Rebuilds an object from stored values. Missing properties are `Null`.
    pub fn from_persisted(class_def: Arc<ClassDef>, mut values: IndexMap<String, PropValue>) -> Self {
        let props = class_def
            .all_props()
            .map(|def| {
                let value = values.shift_remove(def.name()).unwrap_or_default();
                (
                    def.name().to_string(),
                    BOProp::new(def.clone(), value.clone(), value),
                )
            })
            .collect();
        let mut bo = Self {
            class_def,
            props,
            is_new: false,
            is_deleted: false,
            is_editing: false,
        };
        bo.validate_all();
        bo
    }

    pub fn into_shared(self) -> SharedBo {
        Arc::new(Mutex::new(self))
    }

    pub fn class_def(&self) -> &Arc<ClassDef> {
        &self.class_def
    }

    pub fn class_name(&self) -> &str {
        self.class_def.class_name()
    }

    pub fn prop(&self, name: &str) -> Option<&BOProp> {
        self.props.get(name)
    }

    pub fn props(&self) -> impl Iterator<Item = &BOProp> {
        self.props.values()
    }

    pub fn get_property_value(&self, name: &str) -> Result<&PropValue> {
        self.props
            .get(name)
            .map(|p| p.value())
            .ok_or_else(|| self.unknown(name))
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.get_property_value(name)?.as_i64())
    }

    pub fn get_f64(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.get_property_value(name)?.as_f64())
    }

    pub fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get_property_value(name)?.as_str().map(str::to_string))
    }

    pub fn get_guid(&self, name: &str) -> Result<Option<Uuid>> {
        Ok(self.get_property_value(name)?.as_guid())
    }

    pub fn get_date(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.get_property_value(name)?.as_date())
    }

    /// Sets a property.
    ///
    /// A value that breaks a validation rule is still stored; the failure is
    /// reported through [`is_valid_message`](Self::is_valid_message). Only a
    /// value of an incompatible type, an unknown property or a read/write rule
    /// violation is an error.
    pub fn set_property_value(&mut self, name: &str, value: impl Into<PropValue>) -> Result<()> {
        let is_new = self.is_new;
        let exempt = self.is_exempt_key(name);
        let unknown = self.unknown(name);
        let prop = self.props.get_mut(name).ok_or(unknown)?;
        let def = prop.def();

        let value = value.into();
        let found = value.type_name();
        let value = def
            .prop_type()
            .coerce(value)
            .ok_or_else(|| PersistError::TypeMismatch {
                property: name.to_string(),
                expected: def.prop_type(),
                found: found.to_string(),
            })?;

        if *prop.value() == value {
            return Ok(());
        }

        let rule = def.read_write_rule();
        let allowed = match rule {
            ReadWriteRule::ReadWrite => true,
            ReadWriteRule::ReadOnly => false,
            ReadWriteRule::WriteOnce => prop.persisted_value().is_null(),
            ReadWriteRule::WriteNew => is_new,
            ReadWriteRule::WriteNotNew => !is_new,
        };
        if !allowed {
            return Err(PersistError::ReadWriteRule {
                property: name.to_string(),
                rule: rule.to_string(),
            });
        }

        prop.set(value);
        prop.validate(exempt);
        self.is_editing = true;
        Ok(())
    }

    pub fn state(&self) -> BOState {
        BOState {
            is_new: self.is_new,
            is_dirty: self.is_dirty(),
            is_deleted: self.is_deleted,
            is_editing: self.is_editing,
            is_valid: self.is_valid(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.props.values().any(|p| p.is_dirty())
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_reasons().is_empty()
    }

    /// Every property failure followed by every class-rule failure.
    pub fn invalid_reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self
            .props
            .values()
            .filter(|p| !p.is_valid())
            .map(|p| p.invalid_message())
            .collect();
        reasons.extend(
            self.class_def
                .object_rules()
                .iter()
                .filter_map(|rule| rule.check(self)),
        );
        reasons
    }

    pub fn is_valid_message(&self) -> String {
        self.invalid_reasons().join("\n")
    }

    /// True when a commit would write something for this object.
    pub fn has_pending_changes(&self) -> bool {
        if self.is_deleted {
            !self.is_new
        } else {
            self.is_new || self.is_dirty()
        }
    }

    pub fn mark_for_delete(&mut self) {
        if !self.is_deleted {
            self.is_deleted = true;
            self.is_editing = true;
        }
    }

    /// Restores every property to its persisted value and clears the
    /// Dirty, Editing and Deleted flags.
    pub fn cancel_edits(&mut self) {
        for prop in self.props.values_mut() {
            prop.restore();
        }
        self.is_deleted = false;
        self.is_editing = false;
        self.validate_all();
    }

    /// Current key values, in primary-key order.
    pub fn key_values(&self) -> Vec<(String, PropValue)> {
        self.collect_key(|p| p.value())
    }

    /// Key values as last persisted; used to address existing rows.
    pub fn persisted_key_values(&self) -> Vec<(String, PropValue)> {
        self.collect_key(|p| p.persisted_value())
    }

    /// Assigns the surrogate key when unset and stamps the audit property.
    pub fn update_object_before_persisting(&mut self, now: DateTime<Utc>) {
        let pk = self.class_def.primary_key();
        if pk.is_object_id {
            if let Some(prop) = self.props.get_mut(&pk.props[0]) {
                if prop.value().is_null() {
                    prop.set(PropValue::Guid(Uuid::new_v4()));
                    prop.validate(false);
                }
            }
        }
        if self.is_deleted {
            return;
        }
        let stamp = self.is_new || self.is_dirty();
        if let Some(audit) = self.class_def.audit_property().map(str::to_string) {
            if let (true, Some(prop)) = (stamp, self.props.get_mut(&audit)) {
                prop.set(PropValue::Date(now));
                prop.validate(false);
            }
        }
    }

    /// Finalizes state after the store accepted the commit.
    ///
    /// A deleted object no longer has a row, so it goes back to New and stays
    /// Deleted; anything else becomes a clean persisted object.
    pub fn after_save(&mut self) {
        for prop in self.props.values_mut() {
            prop.mark_persisted();
        }
        self.is_new = self.is_deleted;
        self.is_editing = false;
    }

    pub fn snapshot(&self) -> BOSnapshot {
        BOSnapshot(self.clone())
    }

    pub fn restore(&mut self, snapshot: BOSnapshot) {
        *self = snapshot.0;
    }

    fn collect_key(&self, pick: impl Fn(&BOProp) -> &PropValue) -> Vec<(String, PropValue)> {
        self.class_def
            .primary_key()
            .props
            .iter()
            .map(|name| {
                let value = self.props.get(name).map(&pick).cloned().unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }

    fn is_exempt_key(&self, name: &str) -> bool {
        let pk = self.class_def.primary_key();
        self.is_new && pk.is_object_id && pk.contains(name)
    }

    fn validate_all(&mut self) {
        let names: Vec<String> = self.props.keys().cloned().collect();
        for name in names {
            let exempt = self.is_exempt_key(&name);
            if let Some(prop) = self.props.get_mut(&name) {
                prop.validate(exempt);
            }
        }
    }

    fn unknown(&self, name: &str) -> PersistError {
        PersistError::UnknownProperty {
            class: self.class_name().to_string(),
            property: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{ClassDefRegistry, ClassDefinition, PropDefinition};
    use crate::domain::value::PropType;

    fn line_class() -> Arc<ClassDef> {
        let registry = ClassDefRegistry::from_definitions(vec![ClassDefinition::new("InvoiceLine")
            .object_id("InvoiceLineID")
            .prop(PropDefinition::new("InvoiceLineID", PropType::Guid))
            .prop(PropDefinition::new("Description", PropType::String))
            .prop(PropDefinition::new("Value", PropType::Decimal).compulsory())])
        .unwrap();
        registry.get("InvoiceLine").unwrap()
    }

    #[test]
    fn new_object_is_new_and_editing_but_not_dirty() {
        let bo = BusinessObject::new(line_class());
        let state = bo.state();
        assert!(state.is_new());
        assert!(state.is_editing());
        assert!(!state.is_dirty());
        assert!(!state.is_deleted());
    }

    #[test]
    fn object_id_key_is_exempt_from_compulsory_check_while_new() {
        let mut bo = BusinessObject::new(line_class());
        bo.set_property_value("Value", 1.0).unwrap();
        assert!(bo.is_valid(), "{}", bo.is_valid_message());
    }

    #[test]
    fn unknown_property_is_an_error() {
        let mut bo = BusinessObject::new(line_class());
        let err = bo.set_property_value("Nope", 1).unwrap_err();
        assert!(matches!(err, PersistError::UnknownProperty { .. }));
    }

    #[test]
    fn before_persisting_assigns_surrogate_key_once() {
        let mut bo = BusinessObject::new(line_class());
        bo.update_object_before_persisting(Utc::now());
        let first = bo.get_guid("InvoiceLineID").unwrap();
        assert!(first.is_some());
        bo.update_object_before_persisting(Utc::now());
        assert_eq!(bo.get_guid("InvoiceLineID").unwrap(), first);
    }

    #[test]
    fn committed_delete_leaves_nothing_pending() {
        let mut bo = BusinessObject::new(line_class());
        bo.after_save();
        assert!(!bo.has_pending_changes());
        bo.mark_for_delete();
        assert!(bo.has_pending_changes());
        bo.after_save();
        assert!(bo.state().is_deleted());
        assert!(!bo.has_pending_changes());
    }
}

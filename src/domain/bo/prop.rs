use crate::domain::schema::PropDef;
use crate::domain::value::PropValue;

/// One property value holder on a business object.
#[derive(Debug, Clone)]
pub struct BOProp {
    def: PropDef,
    value: PropValue,
    persisted: PropValue,
    invalid_messages: Vec<String>,
}

impl BOProp {
    pub(crate) fn new(def: PropDef, value: PropValue, persisted: PropValue) -> Self {
        Self {
            def,
            value,
            persisted,
            invalid_messages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn def(&self) -> &PropDef {
        &self.def
    }

    pub fn value(&self) -> &PropValue {
        &self.value
    }

    /// Value as of the last successful load or commit.
    pub fn persisted_value(&self) -> &PropValue {
        &self.persisted
    }

    pub fn is_dirty(&self) -> bool {
        self.value != self.persisted
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_messages.is_empty()
    }

    pub fn invalid_message(&self) -> String {
        self.invalid_messages.join("\n")
    }

    pub(crate) fn set(&mut self, value: PropValue) {
        self.value = value;
    }

    /// Re-evaluates validity. `exempt_when_null` skips the compulsory check,
    /// used for surrogate keys that are assigned just before persisting.
    pub(crate) fn validate(&mut self, exempt_when_null: bool) {
        self.invalid_messages = if exempt_when_null && self.value.is_null() {
            Vec::new()
        } else {
            self.def.validate(&self.value)
        };
    }

    pub(crate) fn restore(&mut self) {
        self.value = self.persisted.clone();
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = self.value.clone();
    }
}

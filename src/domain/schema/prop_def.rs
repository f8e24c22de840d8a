//! Property definitions: type, column mapping, access rule and validation.

use crate::domain::schema::rules::PropRule;
use crate::domain::value::{PropType, PropValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Controls when a property may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadWriteRule {
    #[default]
    ReadWrite,
    ReadOnly,
    /// Writable until it first holds a persisted value.
    WriteOnce,
    /// Writable only while the object is new.
    WriteNew,
    /// Writable only once the object has been persisted.
    WriteNotNew,
}

impl fmt::Display for ReadWriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReadWriteRule::ReadWrite => "read-write",
            ReadWriteRule::ReadOnly => "read-only",
            ReadWriteRule::WriteOnce => "write-once",
            ReadWriteRule::WriteNew => "write-new",
            ReadWriteRule::WriteNotNew => "write-not-new",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct PropDef {
    name: String,
    column_name: String,
    prop_type: PropType,
    compulsory: bool,
    read_write_rule: ReadWriteRule,
    default: PropValue,
    display_name: String,
    rules: Vec<Arc<dyn PropRule>>,
}

impl PropDef {
    pub fn new(name: impl Into<String>, prop_type: PropType) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            display_name: display_name_for(&name),
            name,
            prop_type,
            compulsory: false,
            read_write_rule: ReadWriteRule::ReadWrite,
            default: PropValue::Null,
            rules: Vec::new(),
        }
    }

    pub fn compulsory(mut self) -> Self {
        self.compulsory = true;
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_name = column.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<PropValue>) -> Self {
        self.default = value.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_read_write_rule(mut self, rule: ReadWriteRule) -> Self {
        self.read_write_rule = rule;
        self
    }

    pub fn with_rule(mut self, rule: Arc<dyn PropRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub(crate) fn push_rule(&mut self, rule: Arc<dyn PropRule>) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn prop_type(&self) -> PropType {
        self.prop_type
    }

    pub fn is_compulsory(&self) -> bool {
        self.compulsory
    }

    pub fn read_write_rule(&self) -> ReadWriteRule {
        self.read_write_rule
    }

    pub fn default_value(&self) -> &PropValue {
        &self.default
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn rules(&self) -> &[Arc<dyn PropRule>] {
        &self.rules
    }

    /// Checks `value` against the compulsory flag and every attached rule.
    ///
    /// Returns every failure message; an empty vector means the value is valid.
    pub fn validate(&self, value: &PropValue) -> Vec<String> {
        if value.is_null() {
            if self.compulsory {
                return vec![format!(
                    "'{}' is a compulsory field and has no value",
                    self.display_name
                )];
            }
            return Vec::new();
        }
        self.rules
            .iter()
            .filter(|rule| !rule.is_valid(value))
            .map(|rule| rule.message(&self.display_name, value))
            .collect()
    }
}

/// Splits a property name on camel-case humps and underscores:
/// `InvoiceNumber` becomes `Invoice Number`.
pub fn display_name_for(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            continue;
        }
        if i > 0 && c.is_uppercase() && !out.ends_with(' ') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

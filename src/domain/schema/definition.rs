//! Serializable class definitions, as produced by a schema provider.
//!
//! These are the raw inputs the registry resolves into [`ClassDef`]s.
//!
//! [`ClassDef`]: crate::domain::schema::ClassDef

use crate::domain::schema::prop_def::{PropDef, ReadWriteRule};
use crate::domain::schema::rules::RuleDefinition;
use crate::domain::value::{PropType, PropValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub class_name: String,
    /// Defaults to the class name.
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub super_class: Option<String>,
    /// Name of the key column in this class's table when it differs from the
    /// superclass's key column. Only meaningful for single-property keys.
    #[serde(default)]
    pub super_class_id_column: Option<String>,
    /// Inherited from the superclass when absent.
    #[serde(default)]
    pub primary_key: Option<PrimaryKeyDefinition>,
    #[serde(default)]
    pub properties: Vec<PropDefinition>,
    #[serde(default)]
    pub alternate_keys: Vec<Vec<String>>,
    /// Date property stamped with the commit time whenever the object is written.
    #[serde(default)]
    pub audit_property: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryKeyDefinition {
    #[serde(default = "default_true")]
    pub is_object_id: bool,
    pub props: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropDefinition {
    pub name: String,
    pub prop_type: PropType,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub compulsory: bool,
    #[serde(default)]
    pub read_write_rule: ReadWriteRule,
    #[serde(default)]
    pub default: Option<PropValue>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl PropDefinition {
    pub fn new(name: impl Into<String>, prop_type: PropType) -> Self {
        Self {
            name: name.into(),
            prop_type,
            column_name: None,
            compulsory: false,
            read_write_rule: ReadWriteRule::ReadWrite,
            default: None,
            display_name: None,
            rules: Vec::new(),
        }
    }

    pub fn compulsory(mut self) -> Self {
        self.compulsory = true;
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<PropValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn read_write(mut self, rule: ReadWriteRule) -> Self {
        self.read_write_rule = rule;
        self
    }

    pub fn rule(mut self, rule: RuleDefinition) -> Self {
        self.rules.push(rule);
        self
    }

    pub(crate) fn into_prop_def(self) -> PropDef {
        let mut def = PropDef::new(self.name, self.prop_type)
            .with_read_write_rule(self.read_write_rule);
        if self.compulsory {
            def = def.compulsory();
        }
        if let Some(column) = self.column_name {
            def = def.with_column(column);
        }
        if let Some(default) = self.default {
            def = def.with_default(default);
        }
        if let Some(display_name) = self.display_name {
            def = def.with_display_name(display_name);
        }
        for rule in self.rules {
            def = def.with_rule(rule.into_rule());
        }
        def
    }
}

impl ClassDefinition {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            table_name: None,
            super_class: None,
            super_class_id_column: None,
            primary_key: None,
            properties: Vec::new(),
            alternate_keys: Vec::new(),
            audit_property: None,
        }
    }

    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn inherits(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn super_class_id_column(mut self, column: impl Into<String>) -> Self {
        self.super_class_id_column = Some(column.into());
        self
    }

    pub fn object_id(mut self, prop: impl Into<String>) -> Self {
        self.primary_key = Some(PrimaryKeyDefinition {
            is_object_id: true,
            props: vec![prop.into()],
        });
        self
    }

    pub fn natural_key<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(PrimaryKeyDefinition {
            is_object_id: false,
            props: props.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn prop(mut self, prop: PropDefinition) -> Self {
        self.properties.push(prop);
        self
    }

    pub fn alternate_key<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_keys
            .push(props.into_iter().map(Into::into).collect());
        self
    }

    pub fn audit_property(mut self, prop: impl Into<String>) -> Self {
        self.audit_property = Some(prop.into());
        self
    }
}

//! ClassDefRegistry for mapping class names to resolved class definitions.

use crate::domain::number::BOSequenceNumber;
use crate::domain::schema::class_def::{ClassDef, PrimaryKeyDef};
use crate::domain::schema::definition::ClassDefinition;
use crate::domain::schema::rules::{ObjectRule, PropRule};
use crate::domain::value::PropType;
use crate::error::{PersistError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// A registry that maps class names to their resolved [`ClassDef`]s.
///
/// Built once per application/session and handed to the accessor, committer
/// and loader. It is a plain value, not a process-wide singleton.
#[derive(Debug, Default)]
pub struct ClassDefRegistry {
    classes: IndexMap<String, Arc<ClassDef>>,
}

impl ClassDefRegistry {
    pub fn builder() -> ClassDefRegistryBuilder {
        ClassDefRegistryBuilder::default()
    }

    /// Resolves a set of definitions with no programmatic rules attached.
    pub fn from_definitions(definitions: Vec<ClassDefinition>) -> Result<Self> {
        let mut builder = Self::builder();
        for def in definitions {
            builder = builder.define(def);
        }
        builder.build()
    }

    /// Parses a JSON array of class definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<ClassDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Retrieves a class definition by name.
    /// Returns None if the class is not registered.
    pub fn get(&self, class_name: &str) -> Option<Arc<ClassDef>> {
        self.classes.get(class_name).cloned()
    }

    /// Like [`get`](Self::get), but an absent class is a schema mismatch.
    pub fn class_def(&self, class_name: &str) -> Result<Arc<ClassDef>> {
        self.get(class_name).ok_or_else(|| {
            PersistError::SchemaMismatch(format!(
                "class '{}' is not in the loaded schema",
                class_name
            ))
        })
    }

    /// True when `class_def` is the exact definition registered under its name.
    pub fn contains(&self, class_def: &Arc<ClassDef>) -> bool {
        self.classes
            .get(class_def.class_name())
            .is_some_and(|registered| Arc::ptr_eq(registered, class_def))
    }

    /// Returns all registered class names, in registration order.
    pub fn list_classes(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ClassDef>> {
        self.classes.values()
    }

    /// Returns the CREATE TABLE statements for every table in the schema.
    /// Tables shared through inheritance are emitted once, superclass tables first.
    pub fn get_all_create_table_sql(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for class in self.classes.values() {
            for (level, sql) in class.table_levels().iter().zip(class.create_table_sql()) {
                if seen.insert(level.table_name.clone()) {
                    out.push(sql);
                }
            }
        }
        out
    }
}

/// Collects definitions and programmatic rules, then resolves them into a registry.
#[derive(Debug, Default)]
pub struct ClassDefRegistryBuilder {
    definitions: Vec<ClassDefinition>,
    prop_rules: Vec<(String, String, Arc<dyn PropRule>)>,
    object_rules: Vec<(String, Arc<dyn ObjectRule>)>,
}

impl ClassDefRegistryBuilder {
    pub fn define(mut self, definition: ClassDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn prop_rule(
        mut self,
        class_name: impl Into<String>,
        prop: impl Into<String>,
        rule: Arc<dyn PropRule>,
    ) -> Self {
        self.prop_rules.push((class_name.into(), prop.into(), rule));
        self
    }

    pub fn object_rule(mut self, class_name: impl Into<String>, rule: Arc<dyn ObjectRule>) -> Self {
        self.object_rules.push((class_name.into(), rule));
        self
    }

    /// Resolves superclass references into table-level chains.
    ///
    /// Fails with `SchemaMismatch` on duplicate class names, unknown
    /// superclasses, inheritance cycles, missing primary keys and key or rule
    /// references to properties the class does not have.
    pub fn build(self) -> Result<ClassDefRegistry> {
        let mut definitions: IndexMap<String, ClassDefinition> = IndexMap::new();
        for def in self.definitions {
            if definitions.contains_key(&def.class_name) {
                return Err(PersistError::SchemaMismatch(format!(
                    "class '{}' is defined twice",
                    def.class_name
                )));
            }
            definitions.insert(def.class_name.clone(), def);
        }
        let builtin = BOSequenceNumber::class_definition();
        definitions
            .entry(builtin.class_name.clone())
            .or_insert(builtin);

        let mut resolved: IndexMap<String, Arc<ClassDef>> = IndexMap::new();
        let names: Vec<String> = definitions.keys().cloned().collect();
        for name in names {
            let mut visiting = Vec::new();
            resolve(
                &name,
                &definitions,
                &self.prop_rules,
                &self.object_rules,
                &mut resolved,
                &mut visiting,
            )?;
        }

        for (class_name, prop, _) in &self.prop_rules {
            let class = resolved.get(class_name).ok_or_else(|| {
                PersistError::SchemaMismatch(format!("rule targets unknown class '{}'", class_name))
            })?;
            if class.own_props().iter().all(|p| p.name() != prop) {
                return Err(PersistError::SchemaMismatch(format!(
                    "rule targets unknown property '{}.{}'",
                    class_name, prop
                )));
            }
        }

        log::debug!("schema registry resolved {} classes", resolved.len());
        Ok(ClassDefRegistry { classes: resolved })
    }
}

fn resolve(
    name: &str,
    definitions: &IndexMap<String, ClassDefinition>,
    prop_rules: &[(String, String, Arc<dyn PropRule>)],
    object_rules: &[(String, Arc<dyn ObjectRule>)],
    resolved: &mut IndexMap<String, Arc<ClassDef>>,
    visiting: &mut Vec<String>,
) -> Result<Arc<ClassDef>> {
    if let Some(done) = resolved.get(name) {
        return Ok(done.clone());
    }
    if visiting.iter().any(|v| v == name) {
        return Err(PersistError::SchemaMismatch(format!(
            "inheritance cycle: {} -> {}",
            visiting.join(" -> "),
            name
        )));
    }
    let def = definitions.get(name).ok_or_else(|| {
        PersistError::SchemaMismatch(format!("unknown class '{}'", name))
    })?;
    visiting.push(name.to_string());

    let super_class = match &def.super_class {
        Some(parent) => {
            if !definitions.contains_key(parent) {
                return Err(PersistError::SchemaMismatch(format!(
                    "class '{}' inherits from unknown class '{}'",
                    name, parent
                )));
            }
            Some(resolve(
                parent,
                definitions,
                prop_rules,
                object_rules,
                resolved,
                visiting,
            )?)
        }
        None => None,
    };

    let primary_key = match (&def.primary_key, &super_class) {
        (Some(pk), _) => PrimaryKeyDef {
            is_object_id: pk.is_object_id,
            props: pk.props.clone(),
        },
        (None, Some(parent)) => parent.primary_key().clone(),
        (None, None) => {
            return Err(PersistError::SchemaMismatch(format!(
                "class '{}' has no primary key",
                name
            )))
        }
    };

    let mut own_props: Vec<_> = def
        .properties
        .iter()
        .cloned()
        .map(|p| p.into_prop_def())
        .collect();
    for (_, prop, rule) in prop_rules.iter().filter(|(c, _, _)| c == name) {
        if let Some(p) = own_props.iter_mut().find(|p| p.name() == prop) {
            p.push_rule(rule.clone());
        }
    }

    let known = |prop: &str| {
        own_props.iter().any(|p| p.name() == prop)
            || super_class
                .as_ref()
                .is_some_and(|s| s.prop_def(prop).is_some())
    };
    if primary_key.props.is_empty() {
        return Err(PersistError::SchemaMismatch(format!(
            "class '{}' has an empty primary key",
            name
        )));
    }
    for prop in primary_key
        .props
        .iter()
        .chain(def.alternate_keys.iter().flatten())
        .chain(def.audit_property.iter())
    {
        if !known(prop) {
            return Err(PersistError::SchemaMismatch(format!(
                "class '{}' references unknown property '{}'",
                name, prop
            )));
        }
    }
    if primary_key.is_object_id && primary_key.props.len() != 1 {
        return Err(PersistError::SchemaMismatch(format!(
            "class '{}' has an object-ID key spanning {} properties",
            name,
            primary_key.props.len()
        )));
    }
    if primary_key.is_object_id {
        let key_prop = &primary_key.props[0];
        let key_type = own_props
            .iter()
            .find(|p| p.name() == key_prop)
            .map(|p| p.prop_type())
            .or_else(|| {
                super_class
                    .as_ref()
                    .and_then(|s| s.prop_def(key_prop).map(|p| p.prop_type()))
            });
        if key_type != Some(PropType::Guid) {
            return Err(PersistError::SchemaMismatch(format!(
                "object-ID key '{}.{}' must be a guid property",
                name, key_prop
            )));
        }
    }

    let rules: Vec<Arc<dyn ObjectRule>> = object_rules
        .iter()
        .filter(|(c, _)| c == name)
        .map(|(_, r)| r.clone())
        .collect();

    let class = Arc::new(ClassDef::new(
        def.class_name.clone(),
        def.table_name.clone().unwrap_or_else(|| def.class_name.clone()),
        own_props,
        primary_key,
        super_class,
        def.super_class_id_column.clone(),
        def.alternate_keys.clone(),
        def.audit_property.clone(),
        rules,
    ));

    visiting.pop();
    resolved.insert(name.to_string(), class.clone());
    Ok(class)
}

//! Reads persisted objects back out of a store.

use crate::domain::bo::{BusinessObject, SharedBo};
use crate::domain::schema::{ClassDef, TableLevel};
use crate::domain::value::{PropType, PropValue};
use crate::error::{PersistError, Result};
use crate::storage::{RowQuery, Store};
use indexmap::IndexMap;
use std::sync::Arc;

/// Assembles business objects from their table-level rows.
#[derive(Clone)]
pub struct BusinessObjectLoader {
    store: Arc<dyn Store>,
}

impl BusinessObjectLoader {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Loads the object of `class_def` whose primary key equals `key`
    /// (property name to value). Returns `None` when the root row is absent.
    ///
    /// Every table level must have a row; a missing subclass row means the
    /// stored object is of another class in the hierarchy.
    pub async fn load(
        &self,
        class_def: &Arc<ClassDef>,
        key: &[(String, PropValue)],
    ) -> Result<Option<SharedBo>> {
        let pk = class_def.primary_key();
        for prop in &pk.props {
            if !key.iter().any(|(name, _)| name == prop) {
                return Err(PersistError::SchemaMismatch(format!(
                    "key for '{}' is missing '{}'",
                    class_def.class_name(),
                    prop
                )));
            }
        }

        let mut values: IndexMap<String, PropValue> = IndexMap::new();
        for (depth, level) in class_def.table_levels().iter().enumerate() {
            let query = level_query(class_def, level, key);
            let Some(row) = self.store.find_row(&query).await? else {
                if depth > 0 {
                    log::debug!(
                        "{} row found in '{}' but not in '{}'",
                        class_def.class_name(),
                        class_def.table_levels()[0].table_name,
                        level.table_name
                    );
                }
                return Ok(None);
            };
            for (prop, column) in level.insert_columns() {
                if let Some(value) = row.get(column) {
                    values.entry(prop.to_string()).or_insert_with(|| value.clone());
                }
            }
        }

        Ok(Some(
            BusinessObject::from_persisted(class_def.clone(), values).into_shared(),
        ))
    }

    /// Convenience for single-property keys.
    pub async fn load_by_id(
        &self,
        class_def: &Arc<ClassDef>,
        id: impl Into<PropValue>,
    ) -> Result<Option<SharedBo>> {
        let pk = class_def.primary_key();
        if pk.props.len() != 1 {
            return Err(PersistError::SchemaMismatch(format!(
                "class '{}' has a composite key",
                class_def.class_name()
            )));
        }
        self.load(class_def, &[(pk.props[0].clone(), id.into())])
            .await
    }
}

fn level_query(class_def: &ClassDef, level: &TableLevel, key: &[(String, PropValue)]) -> RowQuery {
    let columns = level
        .insert_columns()
        .into_iter()
        .map(|(prop, column)| {
            let prop_type = class_def
                .prop_def(prop)
                .map(|p| p.prop_type())
                .unwrap_or(PropType::String);
            (column.to_string(), prop_type)
        })
        .collect();
    let criteria = level
        .key
        .iter()
        .map(|k| {
            let value = key
                .iter()
                .find(|(name, _)| *name == k.prop)
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            (k.column.clone(), value)
        })
        .collect();
    RowQuery {
        table: level.table_name.clone(),
        columns,
        criteria,
    }
}

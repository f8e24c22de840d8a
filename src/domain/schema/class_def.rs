//! Class definitions and the resolved class-table-inheritance chain.

use crate::domain::schema::prop_def::PropDef;
use crate::domain::schema::rules::ObjectRule;
use std::sync::Arc;

/// Primary key of a class: either a surrogate object ID or a natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyDef {
    /// True when the key is a single surrogate Guid independent of business data.
    pub is_object_id: bool,
    pub props: Vec<String>,
}

impl PrimaryKeyDef {
    pub fn object_id(prop: impl Into<String>) -> Self {
        Self {
            is_object_id: true,
            props: vec![prop.into()],
        }
    }

    pub fn natural<I, S>(props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_object_id: false,
            props: props.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, prop: &str) -> bool {
        self.props.iter().any(|p| p == prop)
    }
}

/// Maps a key property onto the column that holds it in one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub prop: String,
    pub column: String,
}

/// One table in the inheritance chain and the columns it owns.
#[derive(Debug, Clone)]
pub struct TableLevel {
    pub class_name: String,
    pub table_name: String,
    /// Properties declared by this level's class.
    pub props: Vec<PropDef>,
    /// Key columns for this table. A subclass table may name them differently.
    pub key: Vec<KeyColumn>,
    /// Alternate (unique) keys, as column names.
    pub alternate_keys: Vec<Vec<String>>,
}

impl TableLevel {
    pub fn owns(&self, prop: &str) -> bool {
        self.props.iter().any(|p| p.name() == prop)
    }

    /// Columns written by an INSERT into this table: key columns the level does
    /// not declare itself, followed by its own properties.
    pub fn insert_columns(&self) -> Vec<(&str, &str)> {
        let mut cols: Vec<(&str, &str)> = self
            .key
            .iter()
            .filter(|k| !self.owns(&k.prop))
            .map(|k| (k.prop.as_str(), k.column.as_str()))
            .collect();
        for p in &self.props {
            let column = self
                .key
                .iter()
                .find(|k| k.prop == p.name())
                .map(|k| k.column.as_str())
                .unwrap_or(p.column_name());
            cols.push((p.name(), column));
        }
        cols
    }
}

/// Static description of one business-object type.
#[derive(Debug)]
pub struct ClassDef {
    class_name: String,
    table_name: String,
    own_props: Vec<PropDef>,
    primary_key: PrimaryKeyDef,
    super_class: Option<Arc<ClassDef>>,
    audit_property: Option<String>,
    object_rules: Vec<Arc<dyn ObjectRule>>,
    /// Root first, this class last.
    levels: Vec<TableLevel>,
}

impl ClassDef {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        class_name: String,
        table_name: String,
        own_props: Vec<PropDef>,
        primary_key: PrimaryKeyDef,
        super_class: Option<Arc<ClassDef>>,
        super_class_id_column: Option<String>,
        alternate_keys: Vec<Vec<String>>,
        audit_property: Option<String>,
        object_rules: Vec<Arc<dyn ObjectRule>>,
    ) -> Self {
        let mut levels = super_class
            .as_ref()
            .map(|s| s.levels.clone())
            .unwrap_or_default();

        let all_props: Vec<&PropDef> = levels
            .iter()
            .flat_map(|l| l.props.iter())
            .chain(own_props.iter())
            .collect();
        let column_of = |prop: &str| {
            all_props
                .iter()
                .find(|p| p.name() == prop)
                .map(|p| p.column_name().to_string())
                .unwrap_or_else(|| prop.to_string())
        };

        let key = primary_key
            .props
            .iter()
            .map(|prop| {
                let column = match (&super_class, &super_class_id_column) {
                    (Some(_), Some(renamed)) if primary_key.props.len() == 1 => renamed.clone(),
                    _ => column_of(prop),
                };
                KeyColumn {
                    prop: prop.clone(),
                    column,
                }
            })
            .collect();

        let alternate_keys = alternate_keys
            .iter()
            .map(|props| props.iter().map(|p| column_of(p)).collect())
            .collect();

        levels.push(TableLevel {
            class_name: class_name.clone(),
            table_name: table_name.clone(),
            props: own_props.clone(),
            key,
            alternate_keys,
        });

        Self {
            class_name,
            table_name,
            own_props,
            primary_key,
            super_class,
            audit_property,
            object_rules,
            levels,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn own_props(&self) -> &[PropDef] {
        &self.own_props
    }

    pub fn primary_key(&self) -> &PrimaryKeyDef {
        &self.primary_key
    }

    pub fn super_class(&self) -> Option<&Arc<ClassDef>> {
        self.super_class.as_ref()
    }

    pub fn audit_property(&self) -> Option<&str> {
        self.audit_property.as_deref()
    }

    pub fn object_rules(&self) -> &[Arc<dyn ObjectRule>] {
        &self.object_rules
    }

    /// The inheritance chain as table levels, root first.
    pub fn table_levels(&self) -> &[TableLevel] {
        &self.levels
    }

    /// Every property across the chain, root level first.
    pub fn all_props(&self) -> impl Iterator<Item = &PropDef> {
        self.levels.iter().flat_map(|l| l.props.iter())
    }

    pub fn prop_def(&self, name: &str) -> Option<&PropDef> {
        self.all_props().find(|p| p.name() == name)
    }

    /// True when `self` is `other` or inherits from it.
    pub fn is_a(&self, other: &str) -> bool {
        self.levels.iter().any(|l| l.class_name == other)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for each table level, root first.
    pub fn create_table_sql(&self) -> Vec<String> {
        self.levels
            .iter()
            .map(|level| {
                let mut lines: Vec<String> = level
                    .insert_columns()
                    .into_iter()
                    .map(|(prop, column)| {
                        let def = self.prop_def(prop);
                        let sql_type = def.map(|d| d.prop_type().sql_type()).unwrap_or("text");
                        let not_null = def.map_or(true, |d| d.is_compulsory())
                            || level.key.iter().any(|k| k.prop == prop);
                        format!(
                            "\"{}\" {}{}",
                            column,
                            sql_type,
                            if not_null { " NOT NULL" } else { "" }
                        )
                    })
                    .collect();
                let key_cols: Vec<String> =
                    level.key.iter().map(|k| format!("\"{}\"", k.column)).collect();
                lines.push(format!("PRIMARY KEY ({})", key_cols.join(", ")));
                for alt in &level.alternate_keys {
                    let cols: Vec<String> = alt.iter().map(|c| format!("\"{}\"", c)).collect();
                    lines.push(format!("UNIQUE ({})", cols.join(", ")));
                }
                format!(
                    "CREATE TABLE IF NOT EXISTS \"{}\" (\n    {}\n)",
                    level.table_name,
                    lines.join(",\n    ")
                )
            })
            .collect()
    }
}

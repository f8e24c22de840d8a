//! INSERT/UPDATE/DELETE generation under class-table inheritance.
//!
//! Inserts and updates walk the table levels root first, so parent rows exist
//! before child rows reference them. Deletes walk the other way.

use crate::domain::bo::BusinessObject;
use crate::domain::schema::TableLevel;
use crate::domain::sql::formatter::SqlFormatter;
use crate::domain::sql::statement::{
    ColumnValue, SqlStatement, SqlStatementCollection, StatementKind,
};
use crate::domain::value::{PropType, PropValue};
use crate::error::{PersistError, Result};

#[derive(Debug, Clone, Default)]
pub struct StatementGenerator {
    formatter: SqlFormatter,
}

impl StatementGenerator {
    pub fn new(formatter: SqlFormatter) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &SqlFormatter {
        &self.formatter
    }

    /// Statements that bring the store in line with the object's current state.
    ///
    /// Deleted objects get deletes, new objects inserts, dirty objects updates.
    /// A new object that was deleted before ever being saved, or a clean
    /// persisted one, yields an empty collection.
    pub fn persist_statements(&self, bo: &BusinessObject) -> Result<SqlStatementCollection> {
        let state = bo.state();
        if state.is_deleted() {
            if state.is_new() {
                return Ok(SqlStatementCollection::new());
            }
            return Ok(self.delete_statements(bo));
        }
        if state.is_new() {
            return Ok(self.insert_statements(bo));
        }
        self.update_statements(bo)
    }

    /// One INSERT per table level with every column of that level.
    pub fn insert_statements(&self, bo: &BusinessObject) -> SqlStatementCollection {
        bo.class_def()
            .table_levels()
            .iter()
            .map(|level| {
                let columns: Vec<ColumnValue> = level
                    .insert_columns()
                    .into_iter()
                    .map(|(prop, column)| current(bo, prop, column))
                    .collect();
                self.build_insert(&level.table_name, columns)
            })
            .collect()
    }

    /// One UPDATE per table level that has dirty columns; clean levels are skipped.
    pub fn update_statements(&self, bo: &BusinessObject) -> Result<SqlStatementCollection> {
        let pk = bo.class_def().primary_key();
        let mut statements = SqlStatementCollection::new();
        for level in bo.class_def().table_levels() {
            let set: Vec<ColumnValue> = level
                .insert_columns()
                .into_iter()
                .filter(|(prop, _)| !(pk.is_object_id && pk.contains(prop)))
                .filter(|(prop, _)| bo.prop(prop).is_some_and(|p| p.is_dirty()))
                .map(|(prop, column)| current(bo, prop, column))
                .collect();
            if set.is_empty() {
                continue;
            }
            statements.push(self.build_update(
                &level.table_name,
                set,
                persisted_key(bo, level),
            )?);
        }
        Ok(statements)
    }

    /// One DELETE per table level, most derived table first.
    pub fn delete_statements(&self, bo: &BusinessObject) -> SqlStatementCollection {
        bo.class_def()
            .table_levels()
            .iter()
            .rev()
            .map(|level| self.build_delete(&level.table_name, persisted_key(bo, level)))
            .collect()
    }

    fn build_insert(&self, table: &str, columns: Vec<ColumnValue>) -> SqlStatement {
        let names: Vec<String> = columns
            .iter()
            .map(|c| self.formatter.quote(&c.column))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len())
            .map(|i| self.formatter.placeholder(i))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.formatter.quote(table),
            names.join(", "),
            placeholders.join(", ")
        );
        SqlStatement::new(StatementKind::Insert, table.to_string(), columns, Vec::new(), sql)
    }

    /// Builds an UPDATE; refuses an empty SET list rather than emitting
    /// `UPDATE t SET WHERE ...`.
    fn build_update(
        &self,
        table: &str,
        set: Vec<ColumnValue>,
        key: Vec<ColumnValue>,
    ) -> Result<SqlStatement> {
        if set.is_empty() {
            return Err(PersistError::EmptyUpdate {
                table: table.to_string(),
            });
        }
        let assignments: Vec<String> = set
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "{} = {}",
                    self.formatter.quote(&c.column),
                    self.formatter.placeholder(i + 1)
                )
            })
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.formatter.quote(table),
            assignments.join(", "),
            self.where_clause(&key, set.len())
        );
        Ok(SqlStatement::new(
            StatementKind::Update,
            table.to_string(),
            set,
            key,
            sql,
        ))
    }

    fn build_delete(&self, table: &str, key: Vec<ColumnValue>) -> SqlStatement {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.formatter.quote(table),
            self.where_clause(&key, 0)
        );
        SqlStatement::new(StatementKind::Delete, table.to_string(), Vec::new(), key, sql)
    }

    fn where_clause(&self, key: &[ColumnValue], offset: usize) -> String {
        key.iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "{} = {}",
                    self.formatter.quote(&c.column),
                    self.formatter.placeholder(offset + i + 1)
                )
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

fn current(bo: &BusinessObject, prop: &str, column: &str) -> ColumnValue {
    let (prop_type, value) = bo
        .prop(prop)
        .map(|p| (p.def().prop_type(), p.value().clone()))
        .unwrap_or((PropType::String, PropValue::Null));
    ColumnValue::new(column, prop_type, value)
}

/// Key columns of `level` paired with the persisted key values.
fn persisted_key(bo: &BusinessObject, level: &TableLevel) -> Vec<ColumnValue> {
    level
        .key
        .iter()
        .map(|k| {
            let (prop_type, value) = bo
                .prop(&k.prop)
                .map(|p| (p.def().prop_type(), p.persisted_value().clone()))
                .unwrap_or((PropType::String, PropValue::Null));
            ColumnValue::new(k.column.clone(), prop_type, value)
        })
        .collect()
}

use crate::domain::value::{PropType, PropValue};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
}

/// A column bound to a value, with the column's declared type so stores can
/// bind typed NULLs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnValue {
    pub column: String,
    pub prop_type: PropType,
    pub value: PropValue,
}

impl ColumnValue {
    pub fn new(column: impl Into<String>, prop_type: PropType, value: PropValue) -> Self {
        Self {
            column: column.into(),
            prop_type,
            value,
        }
    }
}

/// One generated SQL statement with its bound parameters.
///
/// Besides the SQL text, the statement keeps the table, the written columns and
/// the key columns so stores that do not speak SQL can apply it. Parameters
/// hold the written column values first, then the key values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlStatement {
    kind: StatementKind,
    table: String,
    columns: Vec<String>,
    key_columns: Vec<String>,
    sql: String,
    params: Vec<PropValue>,
    param_types: Vec<PropType>,
}

impl SqlStatement {
    pub(crate) fn new(
        kind: StatementKind,
        table: String,
        columns: Vec<ColumnValue>,
        key: Vec<ColumnValue>,
        sql: String,
    ) -> Self {
        let column_names = columns.iter().map(|c| c.column.clone()).collect();
        let key_columns = key.iter().map(|c| c.column.clone()).collect();
        let (params, param_types) = columns
            .into_iter()
            .chain(key)
            .map(|c| (c.value, c.prop_type))
            .unzip();
        Self {
            kind,
            table,
            columns: column_names,
            key_columns,
            sql,
            params,
            param_types,
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[PropValue] {
        &self.params
    }

    /// Declared type of each parameter, aligned with [`params`](Self::params).
    pub fn param_types(&self) -> &[PropType] {
        &self.param_types
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Written columns paired with their values.
    pub fn column_values(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.params[..self.columns.len()].iter())
    }

    /// Key columns paired with the values that address the row.
    pub fn key_values(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.key_columns
            .iter()
            .map(String::as_str)
            .zip(self.params[self.columns.len()..].iter())
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
            write!(f, " -- [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Ordered statements for one or more objects' persistence operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SqlStatementCollection {
    statements: Vec<SqlStatement>,
}

impl SqlStatementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: SqlStatement) {
        self.statements.push(statement);
    }

    pub fn append(&mut self, other: SqlStatementCollection) {
        self.statements.extend(other.statements);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SqlStatement> {
        self.statements.iter()
    }

    /// Table names in statement order.
    pub fn tables(&self) -> Vec<&str> {
        self.statements.iter().map(|s| s.table()).collect()
    }
}

impl<'a> IntoIterator for &'a SqlStatementCollection {
    type Item = &'a SqlStatement;
    type IntoIter = std::slice::Iter<'a, SqlStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

impl IntoIterator for SqlStatementCollection {
    type Item = SqlStatement;
    type IntoIter = std::vec::IntoIter<SqlStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl FromIterator<SqlStatement> for SqlStatementCollection {
    fn from_iter<T: IntoIterator<Item = SqlStatement>>(iter: T) -> Self {
        Self {
            statements: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for SqlStatementCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{};", statement)?;
        }
        Ok(())
    }
}

//! In-memory store with the same transactional contract as the database.
//!
//! Tables are plain row vectors. A transaction works on a private copy and
//! records what it executed; commit replays that log against the live tables
//! under one lock, so a failed replay leaves the live tables untouched.

use crate::domain::schema::ClassDefRegistry;
use crate::domain::sql::{SqlStatement, StatementKind};
use crate::domain::value::PropValue;
use crate::error::StoreError;
use crate::storage::{Row, RowQuery, Store, StoreTransaction};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    key_columns: Vec<String>,
    unique_keys: Vec<Vec<String>>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    failing_tables: HashSet<String>,
    committed_statements: u64,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every statement touching `table` fails until [`clear_failures`](Self::clear_failures).
    pub fn fail_on_table(&self, table: impl Into<String>) {
        self.lock().failing_tables.insert(table.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failing_tables.clear();
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.rows.len())
    }

    /// Number of statements applied by committed transactions.
    pub fn committed_statements(&self) -> u64 {
        self.lock().committed_statements
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let state = self.lock();
        Ok(Box::new(MemoryTransaction {
            store: self.state.clone(),
            working: state.tables.clone(),
            failing_tables: state.failing_tables.clone(),
            log: Vec::new(),
        }))
    }

    async fn find_row(&self, query: &RowQuery) -> Result<Option<Row>, StoreError> {
        let state = self.lock();
        let Some(table) = state.tables.get(&query.table) else {
            return Ok(None);
        };
        let found = table.rows.iter().find(|row| {
            query
                .criteria
                .iter()
                .all(|(column, value)| row.get(column).unwrap_or(&PropValue::Null) == value)
        });
        Ok(found.map(|row| {
            query
                .columns
                .iter()
                .map(|(column, _)| {
                    (
                        column.clone(),
                        row.get(column).cloned().unwrap_or_default(),
                    )
                })
                .collect()
        }))
    }

    async fn ensure_schema(&self, registry: &ClassDefRegistry) -> Result<(), StoreError> {
        let mut state = self.lock();
        for class in registry.iter() {
            for level in class.table_levels() {
                let table = state.tables.entry(level.table_name.clone()).or_default();
                table.key_columns = level.key.iter().map(|k| k.column.clone()).collect();
                table.unique_keys = level.alternate_keys.clone();
            }
        }
        Ok(())
    }
}

struct MemoryTransaction {
    store: Arc<Mutex<MemoryState>>,
    working: HashMap<String, MemoryTable>,
    failing_tables: HashSet<String>,
    log: Vec<SqlStatement>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn execute(&mut self, statement: &SqlStatement) -> Result<u64, StoreError> {
        if self.failing_tables.contains(statement.table()) {
            return Err(StoreError::Injected {
                table: statement.table().to_string(),
            });
        }
        let affected = apply(&mut self.working, statement)?;
        self.log.push(statement.clone());
        Ok(affected)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut state = self
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut tables = state.tables.clone();
        for statement in &self.log {
            apply(&mut tables, statement)?;
        }
        state.tables = tables;
        state.committed_statements += self.log.len() as u64;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

fn apply(tables: &mut HashMap<String, MemoryTable>, statement: &SqlStatement) -> Result<u64, StoreError> {
    let table = tables.entry(statement.table().to_string()).or_default();
    let matches = |row: &Row| {
        statement
            .key_values()
            .all(|(column, value)| row.get(column).unwrap_or(&PropValue::Null) == value)
    };

    match statement.kind() {
        StatementKind::Insert => {
            let row: Row = statement
                .column_values()
                .map(|(c, v)| (c.to_string(), v.clone()))
                .collect();
            check_unique(statement.table(), table, &row, None)?;
            table.rows.push(row);
            Ok(1)
        }
        StatementKind::Update => {
            let positions: Vec<usize> = table
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| matches(*row))
                .map(|(i, _)| i)
                .collect();
            if positions.is_empty() {
                return Err(StoreError::RowNotFound {
                    table: statement.table().to_string(),
                });
            }
            for &i in &positions {
                let mut updated = table.rows[i].clone();
                for (column, value) in statement.column_values() {
                    updated.insert(column.to_string(), value.clone());
                }
                check_unique(statement.table(), table, &updated, Some(i))?;
                table.rows[i] = updated;
            }
            Ok(positions.len() as u64)
        }
        StatementKind::Delete => {
            let before = table.rows.len();
            table.rows.retain(|row| !matches(row));
            let removed = before - table.rows.len();
            if removed == 0 {
                return Err(StoreError::RowNotFound {
                    table: statement.table().to_string(),
                });
            }
            Ok(removed as u64)
        }
    }
}

/// Rejects `row` when it collides with another row on the primary key or any
/// alternate key. Keys containing a NULL never collide.
fn check_unique(
    table_name: &str,
    table: &MemoryTable,
    row: &Row,
    skip: Option<usize>,
) -> Result<(), StoreError> {
    let keys = std::iter::once(&table.key_columns)
        .chain(table.unique_keys.iter())
        .filter(|k| !k.is_empty());
    for key in keys {
        let values: Vec<&PropValue> = key
            .iter()
            .map(|c| row.get(c).unwrap_or(&PropValue::Null))
            .collect();
        if values.iter().any(|v| v.is_null()) {
            continue;
        }
        let collides = table.rows.iter().enumerate().any(|(i, other)| {
            Some(i) != skip
                && key
                    .iter()
                    .zip(&values)
                    .all(|(c, v)| other.get(c).unwrap_or(&PropValue::Null) == *v)
        });
        if collides {
            return Err(StoreError::DuplicateKey {
                table: table_name.to_string(),
                columns: key.join(", "),
            });
        }
    }
    Ok(())
}

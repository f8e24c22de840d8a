//! Backing stores.
//!
//! One [`Store`] contract with two implementations: [`InMemoryStore`] for
//! tests and [`PgStore`] for a real Postgres database. Which one a process
//! uses is decided by configuration ([`connect`]).

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use crate::domain::schema::ClassDefRegistry;
use crate::domain::sql::{SqlStatement, SqlStatementCollection};
use crate::domain::value::{PropType, PropValue};
use crate::error::StoreError;
use crate::infra::config::{StoreConfig, StoreKind};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

/// A stored row: column name to value.
pub type Row = IndexMap<String, PropValue>;

/// Single-row lookup by equality on a set of columns.
#[derive(Debug, Clone)]
pub struct RowQuery {
    pub table: String,
    /// Columns to return, with the type to decode them as.
    pub columns: Vec<(String, PropType)>,
    pub criteria: Vec<(String, PropValue)>,
}

/// Contract for a relational backing store.
#[async_trait]
pub trait Store: Send + Sync {
    fn name(&self) -> &'static str;

    /// Starts a transaction. Nothing executed in it is visible until commit.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    async fn find_row(&self, query: &RowQuery) -> Result<Option<Row>, StoreError>;

    /// Creates the tables (and key constraints) the schema needs.
    async fn ensure_schema(&self, registry: &ClassDefRegistry) -> Result<(), StoreError>;

    /// Executes every statement inside one transaction. Either all are applied
    /// or, on the first failure, the transaction is rolled back and the error
    /// returned.
    async fn execute_batch(&self, statements: &SqlStatementCollection) -> Result<u64, StoreError> {
        let mut tx = self.begin().await?;
        let mut affected = 0;
        for statement in statements {
            match tx.execute(statement).await {
                Ok(n) => affected += n,
                Err(e) => {
                    log::warn!(
                        "{}: statement failed, rolling back batch of {}: {}",
                        self.name(),
                        statements.len(),
                        e
                    );
                    if let Err(rollback_err) = tx.rollback().await {
                        log::warn!("{}: rollback failed: {}", self.name(), rollback_err);
                    }
                    return Err(e);
                }
            }
        }
        tx.commit().await?;
        Ok(affected)
    }
}

/// An open store transaction.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Executes one statement, returning the number of rows it touched.
    /// An UPDATE or DELETE that touches no row fails with `RowNotFound`.
    async fn execute(&mut self, statement: &SqlStatement) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Builds the store selected by `config`.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn Store>, StoreError> {
    match &config.kind {
        StoreKind::Memory => {
            log::info!("using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreKind::Postgres { database_url } => {
            let store = PgStore::connect(database_url, config.max_connections).await?;
            log::info!(
                "connected to postgres (max_connections={})",
                config.max_connections
            );
            Ok(Arc::new(store))
        }
    }
}

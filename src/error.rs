//! Error types for the persistence core.

use crate::domain::value::PropType;
use thiserror::Error;

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate key in table '{table}' on ({columns})")]
    DuplicateKey { table: String, columns: String },

    #[error("no row in table '{table}' matches the statement key")]
    RowNotFound { table: String },

    #[error("injected failure on table '{table}'")]
    Injected { table: String },

    #[error("cannot decode column '{column}': {reason}")]
    Decode { column: String, reason: String },
}

/// Errors surfaced to callers of the mutation, generation and commit APIs.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Objects are not committable; the message aggregates every failure.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The store rejected the batch. Nothing was applied.
    #[error("persistence failed: {source}")]
    Persistence {
        #[source]
        source: StoreError,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("type mismatch on '{property}': expected {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: PropType,
        found: String,
    },

    #[error("class '{class}' has no property '{property}'")]
    UnknownProperty { class: String, property: String },

    #[error("property '{property}' is {rule} and cannot be set now")]
    ReadWriteRule { property: String, rule: String },

    #[error("update for table '{table}' has no columns to set")]
    EmptyUpdate { table: String },

    #[error("sequence '{number_type}' cannot go past {current}")]
    SequenceExhausted { number_type: String, current: i64 },

    #[error("schema file error: {0}")]
    SchemaFile(#[from] std::io::Error),

    #[error("schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),
}

impl From<StoreError> for PersistError {
    fn from(source: StoreError) -> Self {
        PersistError::Persistence { source }
    }
}

pub type Result<T, E = PersistError> = std::result::Result<T, E>;

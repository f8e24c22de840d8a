//! Store implementation using PostgreSQL.

use crate::domain::schema::ClassDefRegistry;
use crate::domain::sql::{SqlFormatter, SqlStatement, StatementKind};
use crate::domain::value::{PropType, PropValue};
use crate::error::StoreError;
use crate::storage::{Row, RowQuery, Store, StoreTransaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _, Transaction};
use uuid::Uuid;

/// A store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn find_row(&self, query: &RowQuery) -> Result<Option<Row>, StoreError> {
        let formatter = SqlFormatter::postgres();
        let columns: Vec<String> = query
            .columns
            .iter()
            .map(|(c, _)| formatter.quote(c))
            .collect();
        let criteria: Vec<String> = query
            .criteria
            .iter()
            .enumerate()
            .map(|(i, (c, _))| format!("{} = {}", formatter.quote(c), formatter.placeholder(i + 1)))
            .collect();
        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            formatter.quote(&query.table)
        );
        if !criteria.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&criteria.join(" AND "));
        }
        sql.push_str(" LIMIT 1");

        let mut q = sqlx::query(&sql);
        for (_, value) in &query.criteria {
            q = bind_value(q, value, None);
        }
        let Some(row) = q.fetch_optional(&self.pool).await? else {
            return Ok(None);
        };

        let mut out = Row::new();
        for (i, (column, prop_type)) in query.columns.iter().enumerate() {
            out.insert(column.clone(), decode(&row, i, column, *prop_type)?);
        }
        Ok(Some(out))
    }

    async fn ensure_schema(&self, registry: &ClassDefRegistry) -> Result<(), StoreError> {
        for sql in registry.get_all_create_table_sql() {
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        log::info!("postgres schema ensured for {} classes", registry.list_classes().len());
        Ok(())
    }
}

struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn execute(&mut self, statement: &SqlStatement) -> Result<u64, StoreError> {
        let mut query = sqlx::query(statement.sql());
        for (value, prop_type) in statement.params().iter().zip(statement.param_types()) {
            query = bind_value(query, value, Some(*prop_type));
        }
        let result = query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_db_error(e, statement.table()))?;
        let affected = result.rows_affected();
        if affected == 0 && statement.kind() != StatementKind::Insert {
            return Err(StoreError::RowNotFound {
                table: statement.table().to_string(),
            });
        }
        Ok(affected)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.tx.rollback().await?;
        Ok(())
    }
}

/// Binds one value. NULLs are bound with the column's declared type so
/// Postgres does not have to guess it.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &PropValue,
    null_type: Option<PropType>,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        PropValue::Null => match null_type.unwrap_or(PropType::String) {
            PropType::Integer => query.bind::<Option<i64>>(None),
            PropType::Decimal => query.bind::<Option<f64>>(None),
            PropType::String => query.bind::<Option<String>>(None),
            PropType::Boolean => query.bind::<Option<bool>>(None),
            PropType::Date => query.bind::<Option<DateTime<Utc>>>(None),
            PropType::Guid => query.bind::<Option<Uuid>>(None),
            PropType::Bytes => query.bind::<Option<Vec<u8>>>(None),
        },
        PropValue::Integer(i) => query.bind(*i),
        PropValue::Decimal(d) => query.bind(*d),
        PropValue::String(s) => query.bind(s.clone()),
        PropValue::Boolean(b) => query.bind(*b),
        PropValue::Date(d) => query.bind(*d),
        PropValue::Guid(g) => query.bind(*g),
        PropValue::Bytes(b) => query.bind(b.clone()),
    }
}

fn decode(row: &PgRow, index: usize, column: &str, prop_type: PropType) -> Result<PropValue, StoreError> {
    let decoded = match prop_type {
        PropType::Integer => row.try_get::<Option<i64>, _>(index).map(PropValue::from),
        PropType::Decimal => row.try_get::<Option<f64>, _>(index).map(PropValue::from),
        PropType::String => row.try_get::<Option<String>, _>(index).map(PropValue::from),
        PropType::Boolean => row.try_get::<Option<bool>, _>(index).map(PropValue::from),
        PropType::Date => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(PropValue::from),
        PropType::Guid => row.try_get::<Option<Uuid>, _>(index).map(PropValue::from),
        PropType::Bytes => row.try_get::<Option<Vec<u8>>, _>(index).map(PropValue::from),
    };
    decoded.map_err(|e| StoreError::Decode {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

/// Unique violations surface as `DuplicateKey`, like the in-memory store.
fn map_db_error(error: sqlx::Error, table: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.code().as_deref() == Some("23505") {
            return StoreError::DuplicateKey {
                table: table.to_string(),
                columns: db.constraint().unwrap_or("unknown constraint").to_string(),
            };
        }
    }
    StoreError::Database(error)
}

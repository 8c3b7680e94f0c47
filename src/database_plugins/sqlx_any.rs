// ABOUTME: Production database handle over a sqlx Any pool (PostgreSQL or SQLite)
// ABOUTME: Binds SqlValue arguments, decodes AnyRow columns, and wraps sqlx transactions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use larder_core::errors::{DatabaseError, DatabaseResult};
use sqlx::any::{install_default_drivers, AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::database::{
    BufferedRows, DatabaseHandle, ExecResult, Querier, ResultIterator, Row, SqlQuery, SqlValue,
    Transaction,
};
use crate::errors::AppResult;

/// Pooled database handle backed by sqlx
#[derive(Clone)]
pub struct SqlxDatabase {
    pool: AnyPool,
}

impl SqlxDatabase {
    /// Connect a pool for `config`
    ///
    /// Each in-memory SQLite connection opens its own empty database, so the
    /// pool is pinned to one long-lived connection for `sqlite::memory:`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        install_default_drivers();

        let url = &config.url;
        let connection_string = if url.is_sqlite() && !url.is_memory() {
            // Ensure SQLite creates the database file if it doesn't exist
            format!("{}?mode=rwc", url.to_connection_string())
        } else {
            url.to_connection_string()
        };

        let mut options = AnyPoolOptions::new()
            .max_connections(config.pool.max_connections)
            .min_connections(config.pool.min_connections)
            .acquire_timeout(Duration::from_secs(config.pool.acquire_timeout_secs));
        if url.is_memory() {
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options
            .connect(&connection_string)
            .await
            .map_err(DatabaseError::from)?;
        info!(
            backend = if url.is_postgresql() { "postgresql" } else { "sqlite" },
            max_connections = config.pool.max_connections,
            "database pool connected"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("database pool closed");
    }
}

impl Debug for SqlxDatabase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlxDatabase")
            .field("size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl DatabaseHandle for SqlxDatabase {
    fn querier(&self) -> Box<dyn Querier> {
        Box::new(PoolQuerier {
            pool: self.pool.clone(),
        })
    }

    async fn begin(&self) -> DatabaseResult<Box<dyn Transaction>> {
        let transaction = self.pool.begin().await?;
        Ok(Box::new(SqlxTransaction { transaction }))
    }
}

/// Runs each statement on whichever pooled connection is free
struct PoolQuerier {
    pool: AnyPool,
}

#[async_trait]
impl Querier for PoolQuerier {
    async fn exec(&mut self, query: &SqlQuery) -> DatabaseResult<ExecResult> {
        let result = bind_args(query).execute(&self.pool).await?;
        Ok(exec_result(result.rows_affected(), result.last_insert_id()))
    }

    async fn query(&mut self, query: &SqlQuery) -> DatabaseResult<Box<dyn ResultIterator>> {
        let rows = bind_args(query).fetch_all(&self.pool).await?;
        buffered(&rows)
    }
}

/// An open sqlx transaction on a dedicated connection
struct SqlxTransaction {
    transaction: sqlx::Transaction<'static, Any>,
}

#[async_trait]
impl Querier for SqlxTransaction {
    async fn exec(&mut self, query: &SqlQuery) -> DatabaseResult<ExecResult> {
        let result = bind_args(query).execute(&mut *self.transaction).await?;
        Ok(exec_result(result.rows_affected(), result.last_insert_id()))
    }

    async fn query(&mut self, query: &SqlQuery) -> DatabaseResult<Box<dyn ResultIterator>> {
        let rows = bind_args(query).fetch_all(&mut *self.transaction).await?;
        buffered(&rows)
    }
}

#[async_trait]
impl Transaction for SqlxTransaction {
    fn as_querier(&mut self) -> &mut dyn Querier {
        self
    }

    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        self.transaction.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        self.transaction.rollback().await?;
        Ok(())
    }
}

fn exec_result(rows_affected: u64, last_insert_id: Option<i64>) -> ExecResult {
    ExecResult {
        rows_affected,
        last_insert_id: last_insert_id.and_then(|id| u64::try_from(id).ok()),
    }
}

fn bind_args(query: &SqlQuery) -> Query<'_, Any, AnyArguments<'_>> {
    query
        .args
        .iter()
        .fold(sqlx::query(&query.sql), |bound, arg| match arg {
            SqlValue::Null => bound.bind(None::<i64>),
            SqlValue::Bool(value) => bound.bind(*value),
            SqlValue::Int(value) => bound.bind(*value),
            SqlValue::Float(value) => bound.bind(*value),
            SqlValue::Text(value) => bound.bind(value.clone()),
            SqlValue::Bytes(value) => bound.bind(value.clone()),
        })
}

fn buffered(rows: &[AnyRow]) -> DatabaseResult<Box<dyn ResultIterator>> {
    let decoded = rows.iter().map(decode_row).collect::<DatabaseResult<Vec<_>>>()?;
    Ok(Box::new(BufferedRows::new(decoded)))
}

fn decode_row(row: &AnyRow) -> DatabaseResult<Row> {
    (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<DatabaseResult<Vec<_>>>()
        .map(Row::new)
}

/// Decode one column by the type of the value actually stored
///
/// SQLite reports expression columns (`COUNT(*)`, literals) without a declared
/// type, so the value's own type is used rather than the column's.
fn decode_value(row: &AnyRow, index: usize) -> DatabaseResult<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_owned();

    let value = match type_name.as_str() {
        "BOOLEAN" => SqlValue::Bool(row.try_get(index)?),
        "SMALLINT" => SqlValue::Int(i64::from(row.try_get::<i16, _>(index)?)),
        "INTEGER" => SqlValue::Int(i64::from(row.try_get::<i32, _>(index)?)),
        "BIGINT" => SqlValue::Int(row.try_get(index)?),
        "REAL" => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => SqlValue::Float(row.try_get(index)?),
        "BLOB" => SqlValue::Bytes(row.try_get(index)?),
        "TEXT" => SqlValue::Text(row.try_get(index)?),
        other => {
            return Err(DatabaseError::scan(format!(
                "column {index} has unsupported type {other}"
            )))
        }
    };
    Ok(value)
}

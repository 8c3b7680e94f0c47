// ABOUTME: Database access capabilities shared by pool handles and transactions
// ABOUTME: Defines the Querier/Transaction/DatabaseHandle traits plus SQL query and value types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database capabilities
//!
//! A [`Querier`] is the capability set `{exec, query}`. Both a bare pool handle
//! and an in-progress [`Transaction`] satisfy it, so the executor functions in
//! [`executor`] never need to know which one they were handed. Backends live in
//! `database_plugins`.

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;

/// Low-level query execution helpers over any querier
pub mod executor;
/// Decoded rows, row readers, and result iterators
pub mod rows;
/// RAII transaction guard with rollback-on-error helpers
pub mod transactions;

pub use executor::{
    check_rows_for_error_and_close, get_one_row, get_rows, perform_boolean_query,
    perform_count_query, perform_write_query, perform_write_query_ignoring_return,
};
pub use rows::{BufferedRows, OneRow, ResultIterator, Row, RowReader};
pub use transactions::TransactionGuard;

/// A bound SQL argument
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Text
    Text(String),
    /// Binary
    Bytes(Vec<u8>),
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        // Saturates; ids and unix times stay far below i64::MAX
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u8> for SqlValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// SQL text plus its positional arguments, as produced by a query builder
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    /// Statement text
    pub sql: String,
    /// Positional arguments
    pub args: Vec<SqlValue>,
}

impl SqlQuery {
    /// Statement with arguments
    pub fn new(sql: impl Into<String>, args: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Statement without arguments
    pub fn unparameterized(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows inserted, updated, or deleted
    pub rows_affected: u64,
    /// Id of the last inserted row, when the driver reports one
    pub last_insert_id: Option<u64>,
}

/// The `{exec, query}` capability set shared by pool handles and transactions
#[async_trait]
pub trait Querier: Send {
    /// Run a statement that returns no rows
    async fn exec(&mut self, query: &SqlQuery) -> DatabaseResult<ExecResult>;

    /// Run a statement and iterate its rows
    async fn query(&mut self, query: &SqlQuery) -> DatabaseResult<Box<dyn ResultIterator>>;
}

/// An in-progress transaction
#[async_trait]
pub trait Transaction: Querier {
    /// View this transaction as a plain querier
    fn as_querier(&mut self) -> &mut dyn Querier;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> DatabaseResult<()>;

    /// Roll the transaction back
    async fn rollback(self: Box<Self>) -> DatabaseResult<()>;
}

/// A shareable database handle (connection pool)
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Querier running statements on pooled connections outside any transaction
    fn querier(&self) -> Box<dyn Querier>;

    /// Begin a transaction on a dedicated connection
    async fn begin(&self) -> DatabaseResult<Box<dyn Transaction>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_values_saturate_instead_of_wrapping() {
        assert_eq!(SqlValue::from(42_u64), SqlValue::Int(42));
        assert_eq!(SqlValue::from(u64::MAX), SqlValue::Int(i64::MAX));
    }

    #[test]
    fn missing_optionals_bind_null() {
        assert_eq!(SqlValue::from(None::<u64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("basil")), SqlValue::Text("basil".to_owned()));
    }
}

// ABOUTME: Low-level query execution over any querier (pool handle or transaction)
// ABOUTME: One-row, read, boolean, count, write-returning-id, and write-ignoring-return helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Executor helpers
//!
//! Each helper runs under the caller's [`QueryContext`] and takes a label that
//! is only used for logging. None of them wrap errors: wrapping happens once,
//! at the operation boundary, through `observability::prepare_error`.

use larder_core::errors::{DatabaseError, DatabaseResult};
use tracing::trace;

use super::{OneRow, Querier, ResultIterator, SqlQuery};
use crate::config::IdStrategy;
use crate::context::QueryContext;

/// Run a query expected to yield one row; failures surface at `scan`
pub async fn get_one_row(
    ctx: &QueryContext,
    querier: &mut dyn Querier,
    label: &str,
    query: &SqlQuery,
) -> OneRow {
    trace!(label, "fetching one row");
    OneRow::from_outcome(ctx.run(querier.query(query)).await)
}

/// Run a read query and return its rows
///
/// # Errors
///
/// Returns the execute error, [`DatabaseError::NoRows`] if the driver reports
/// one, or [`DatabaseError::Cancelled`]
pub async fn get_rows(
    ctx: &QueryContext,
    querier: &mut dyn Querier,
    label: &str,
    query: &SqlQuery,
) -> DatabaseResult<Box<dyn ResultIterator>> {
    trace!(label, "fetching rows");
    ctx.run(querier.query(query)).await
}

/// Run a query selecting one boolean; no rows means `false`
///
/// # Errors
///
/// Returns any error other than no-rows
pub async fn perform_boolean_query(
    ctx: &QueryContext,
    querier: &mut dyn Querier,
    query: &SqlQuery,
) -> DatabaseResult<bool> {
    match get_one_row(ctx, querier, "boolean query", query).await.scan() {
        Ok(row) => row.reader().read_bool(),
        Err(DatabaseError::NoRows) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Run a query selecting one count
///
/// # Errors
///
/// Returns the execute or scan error
pub async fn perform_count_query(
    ctx: &QueryContext,
    querier: &mut dyn Querier,
    query: &SqlQuery,
) -> DatabaseResult<u64> {
    let row = get_one_row(ctx, querier, "count query", query).await.scan()?;
    row.reader().read_u64()
}

/// Run an insert and return the id the database assigned
///
/// `strategy` picks between reading a `RETURNING` row and asking the driver for
/// the last insert id.
///
/// # Errors
///
/// Returns the execute error, or a scan error if no id comes back
pub async fn perform_write_query(
    ctx: &QueryContext,
    querier: &mut dyn Querier,
    strategy: IdStrategy,
    label: &str,
    query: &SqlQuery,
) -> DatabaseResult<u64> {
    trace!(label, ?strategy, "performing write");
    match strategy {
        IdStrategy::Returning => {
            let row = get_one_row(ctx, querier, label, query).await.scan()?;
            row.reader().read_u64()
        }
        IdStrategy::LastInsertId => {
            let result = ctx.run(querier.exec(query)).await?;
            result
                .last_insert_id
                .ok_or_else(|| DatabaseError::scan(format!("{label}: no id reported by driver")))
        }
    }
}

/// Run a write whose result is not needed
///
/// # Errors
///
/// Returns the execute error
pub async fn perform_write_query_ignoring_return(
    ctx: &QueryContext,
    querier: &mut dyn Querier,
    label: &str,
    query: &SqlQuery,
) -> DatabaseResult<()> {
    trace!(label, "performing write");
    ctx.run(querier.exec(query)).await.map(|_| ())
}

/// Surface any iteration error, then close the iterator
///
/// # Errors
///
/// Returns the iteration error if there was one, otherwise the close error
pub fn check_rows_for_error_and_close(rows: &mut dyn ResultIterator) -> DatabaseResult<()> {
    if let Some(err) = rows.error() {
        if let Err(close_err) = rows.close() {
            trace!(error = %close_err, "closing rows after iteration error");
        }
        return Err(err);
    }
    rows.close()
}

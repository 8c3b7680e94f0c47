// ABOUTME: Integration tests for the sqlx-backed database handle against in-memory SQLite
// ABOUTME: Exercises argument binding, value decoding, executor helpers, and transaction commit/rollback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::init_test_logging;
use larder::config::{DatabaseConfig, DatabaseUrl, IdStrategy};
use larder::context::QueryContext;
use larder::database::{
    get_one_row, get_rows, perform_boolean_query, perform_count_query, perform_write_query,
    DatabaseHandle, SqlQuery, SqlValue, TransactionGuard,
};
use larder::database_plugins::SqlxDatabase;
use larder::larder_core::errors::DatabaseError;

async fn memory_database() -> Result<SqlxDatabase> {
    init_test_logging();
    let db = SqlxDatabase::connect(&DatabaseConfig::for_url(DatabaseUrl::Memory)).await?;
    db.querier()
        .exec(&SqlQuery::unparameterized(
            "CREATE TABLE valid_instruments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                icon BLOB,
                weight REAL,
                volumetric BOOLEAN NOT NULL DEFAULT 0,
                archived_on BIGINT
            )",
        ))
        .await?;
    Ok(db)
}

fn insert(name: &str) -> SqlQuery {
    SqlQuery::new(
        "INSERT INTO valid_instruments (name, icon, weight, volumetric) VALUES ($1, $2, $3, $4)",
        vec![
            SqlValue::from(name),
            SqlValue::from(b"svg".to_vec()),
            SqlValue::from(1.5),
            SqlValue::from(true),
        ],
    )
}

fn count_query() -> SqlQuery {
    SqlQuery::unparameterized("SELECT COUNT(*) FROM valid_instruments WHERE archived_on IS NULL")
}

#[tokio::test]
async fn test_insert_reports_last_insert_id() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();
    let mut querier = db.querier();

    let first = perform_write_query(
        &ctx,
        querier.as_mut(),
        IdStrategy::LastInsertId,
        "valid instrument",
        &insert("whisk"),
    )
    .await?;
    let second = perform_write_query(
        &ctx,
        querier.as_mut(),
        IdStrategy::LastInsertId,
        "valid instrument",
        &insert("ladle"),
    )
    .await?;

    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(perform_count_query(&ctx, querier.as_mut(), &count_query()).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_rows_decode_by_stored_type() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();
    let mut querier = db.querier();
    querier.exec(&insert("whisk")).await?;

    let row = get_one_row(
        &ctx,
        querier.as_mut(),
        "valid instrument",
        &SqlQuery::new(
            "SELECT id, name, icon, weight, volumetric, archived_on FROM valid_instruments WHERE id = $1",
            vec![SqlValue::from(1_u64)],
        ),
    )
    .await
    .scan()?;

    let mut reader = row.reader();
    assert_eq!(reader.read_u64()?, 1);
    assert_eq!(reader.read_string()?, "whisk");
    assert_eq!(reader.read_bytes()?, b"svg".to_vec());
    assert!((reader.read_f64()? - 1.5).abs() < f64::EPSILON);
    assert!(reader.read_bool()?);
    assert_eq!(reader.read_optional_u64()?, None);
    Ok(())
}

#[tokio::test]
async fn test_missing_row_scans_as_no_rows() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();
    let mut querier = db.querier();

    let outcome = get_one_row(
        &ctx,
        querier.as_mut(),
        "valid instrument",
        &SqlQuery::new(
            "SELECT id FROM valid_instruments WHERE id = $1",
            vec![SqlValue::from(99_u64)],
        ),
    )
    .await
    .scan();

    assert!(matches!(outcome, Err(DatabaseError::NoRows)));
    Ok(())
}

#[tokio::test]
async fn test_boolean_query_reads_exists() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();
    let mut querier = db.querier();
    querier.exec(&insert("whisk")).await?;

    let exists = |id: u64| {
        SqlQuery::new(
            "SELECT EXISTS (SELECT 1 FROM valid_instruments WHERE id = $1)",
            vec![SqlValue::from(id)],
        )
    };

    assert!(perform_boolean_query(&ctx, querier.as_mut(), &exists(1)).await?);
    assert!(!perform_boolean_query(&ctx, querier.as_mut(), &exists(2)).await?);
    Ok(())
}

#[tokio::test]
async fn test_committed_transaction_is_visible() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();

    let mut guard = TransactionGuard::begin(&ctx, &db).await?;
    guard.executor()?.exec(&insert("whisk")).await?;
    guard.commit(&ctx).await?;

    let mut querier = db.querier();
    assert_eq!(perform_count_query(&ctx, querier.as_mut(), &count_query()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_rolled_back_transaction_leaves_no_trace() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();

    let mut guard = TransactionGuard::begin(&ctx, &db).await?;
    guard.executor()?.exec(&insert("whisk")).await?;
    let failed: Result<(), DatabaseError> = Err(DatabaseError::execute("audit write failed"));
    let err = guard.rollback_on_error(failed).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Execute { .. }));
    assert!(!guard.is_active());
    drop(guard);

    let mut querier = db.querier();
    assert_eq!(perform_count_query(&ctx, querier.as_mut(), &count_query()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_driver_errors_become_execute_errors() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();
    let mut querier = db.querier();

    let err = get_rows(
        &ctx,
        querier.as_mut(),
        "missing table",
        &SqlQuery::unparameterized("SELECT * FROM no_such_table"),
    )
    .await
    .err()
    .expect("query against a missing table fails");

    assert!(matches!(err, DatabaseError::Execute { .. }));
    Ok(())
}

#[tokio::test]
async fn test_cancelled_context_skips_the_statement() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();
    ctx.cancel();
    let mut querier = db.querier();

    let err = perform_count_query(&ctx, querier.as_mut(), &count_query())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn test_commit_on_cancelled_context_discards_writes() -> Result<()> {
    let db = memory_database().await?;
    let ctx = QueryContext::new();

    let mut guard = TransactionGuard::begin(&ctx, &db).await?;
    guard.executor()?.exec(&insert("whisk")).await?;
    ctx.cancel();
    let err = guard.commit(&ctx).await.unwrap_err();
    assert!(err.is_cancelled());

    let fresh = QueryContext::new();
    let mut querier = db.querier();
    assert_eq!(perform_count_query(&fresh, querier.as_mut(), &count_query()).await?, 0);
    Ok(())
}

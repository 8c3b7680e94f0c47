// ABOUTME: Integration tests for batched parallel full-table streaming
// ABOUTME: Covers range planning, silent empty batches, failure logging, parallelism, and joined reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::time::{Duration, Instant};

use common::{count_row, row, valid_instrument, valid_instrument_columns, Harness};
use larder::config::QuerierConfig;
use larder::context::QueryContext;
use larder::database::Row;
use larder::database_plugins::MockDatabase;
use larder::larder_core::errors::DatabaseError;
use larder::larder_core::models::ValidInstrument;
use larder::querier::ValidInstrumentDataManager;
use larder::querybuilding::mock::{methods, BuilderArg};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn range(begin: u64, end: u64) -> Vec<BuilderArg> {
    vec![BuilderArg::Id(begin), BuilderArg::Id(end)]
}

fn instrument_row(id: u64) -> Row {
    row(valid_instrument_columns(&valid_instrument(id)))
}

/// Script a count of `count` rows and one successful batch per range
fn script_batches(h: &Harness, count: u64, ranges: &[(u64, u64)]) {
    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    h.db.expect_query(&count_query, vec![count_row(count)]);
    for &(begin, end) in ranges {
        let batch = h
            .builder
            .expect_entity::<ValidInstrument>(methods::BATCH, range(begin, end));
        h.db.expect_query(&batch, vec![instrument_row(begin)]);
    }
}

#[tokio::test]
async fn test_small_table_streams_as_one_batch() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);

    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    let batch = h
        .builder
        .expect_entity::<ValidInstrument>(methods::BATCH, range(1, 1001));
    h.db.expect_query(&count_query, vec![count_row(20)]).expect_query(
        &batch,
        (1..=20).map(instrument_row).collect(),
    );

    h.querier
        .get_all_valid_instruments(&ctx, Some(&tx), 1000)
        .await
        .unwrap();

    let published = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("batch published")
        .expect("channel open");
    assert_eq!(published.len(), 20);
    assert_eq!(published[0], valid_instrument(1));
    assert_eq!(published[19].id, 20);
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_zero_batch_size_uses_configured_default() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);
    script_batches(&h, 20, &[(1, 1001)]);

    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 0)
        .await
        .unwrap();

    assert_eq!(report.dispatched, 1);
    assert!(report.is_complete());
    assert_eq!(rx.recv().await.unwrap().len(), 1);
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_no_rows_batch_publishes_nothing_and_succeeds() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);

    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    let batch = h
        .builder
        .expect_entity::<ValidInstrument>(methods::BATCH, range(1, 1001));
    h.db.expect_query(&count_query, vec![count_row(20)])
        .expect_query_error(&batch, DatabaseError::NoRows);

    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 1000)
        .await
        .unwrap();

    assert_eq!(report.dispatched, 1);
    assert_eq!(report.empty, 1);
    assert_eq!(report.published, 0);
    assert!(report.failures.is_empty());
    assert!(report.is_complete());
    assert!(rx.try_recv().is_err());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_fire_and_forget_no_rows_batch_is_silent() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);

    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    let batch = h
        .builder
        .expect_entity::<ValidInstrument>(methods::BATCH, range(1, 1001));
    h.db.expect_query(&count_query, vec![count_row(20)])
        .expect_query_error(&batch, DatabaseError::NoRows);

    h.querier
        .get_all_valid_instruments(&ctx, Some(&tx), 1000)
        .await
        .unwrap();
    drop(tx);

    let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert!(received.is_none());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_failed_batch_is_reported_without_failing_the_call() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);

    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    let batch = h
        .builder
        .expect_entity::<ValidInstrument>(methods::BATCH, range(1, 1001));
    h.db.expect_query(&count_query, vec![count_row(20)])
        .expect_query_error(&batch, DatabaseError::execute("connection reset"));

    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 1000)
        .await
        .unwrap();

    assert_eq!(report.published, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].begin, 1);
    assert_eq!(report.failures[0].end, 1001);
    assert!(!report.is_complete());
    assert!(rx.try_recv().is_err());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_fire_and_forget_swallows_batch_errors() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);

    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    let batch = h
        .builder
        .expect_entity::<ValidInstrument>(methods::BATCH, range(1, 1001));
    h.db.expect_query(&count_query, vec![count_row(20)])
        .expect_query_error(&batch, DatabaseError::execute("connection reset"));

    h.querier
        .get_all_valid_instruments(&ctx, Some(&tx), 1000)
        .await
        .unwrap();
    drop(tx);

    // Every sender is gone once the batch task finishes without publishing
    let received = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
    assert!(received.is_none());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_ranges_cover_the_count_in_half_open_steps() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel(8);
    script_batches(&h, 5, &[(1, 3), (3, 5), (5, 7)]);

    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 2)
        .await
        .unwrap();

    assert_eq!(report.dispatched, 3);
    assert_eq!(report.published, 3);
    assert_eq!(report.rows_published, 3);

    let mut ranges: Vec<Vec<BuilderArg>> = h
        .builder
        .calls_to(methods::BATCH)
        .into_iter()
        .map(|call| call.args)
        .collect();
    ranges.sort_by_key(|args| match args[0] {
        BuilderArg::Id(begin) => begin,
        _ => 0,
    });
    assert_eq!(ranges, vec![range(1, 3), range(3, 5), range(5, 7)]);

    let mut first_ids = Vec::new();
    while let Ok(batch) = rx.try_recv() {
        first_ids.push(batch[0].id);
    }
    first_ids.sort_unstable();
    assert_eq!(first_ids, vec![1, 3, 5]);
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_empty_table_dispatches_no_batches() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, _rx) = mpsc::channel(8);
    script_batches(&h, 0, &[]);

    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 100)
        .await
        .unwrap();

    assert_eq!(report.dispatched, 0);
    assert!(report.is_complete());
    assert!(h.builder.calls_to(methods::BATCH).is_empty());
    h.assert_expectations_met();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batches_query_in_parallel() {
    let delay = Duration::from_millis(100);
    let h = Harness::with(
        MockDatabase::unordered().with_query_delay(delay),
        QuerierConfig::default(),
    );
    let ctx = QueryContext::new();
    let (tx, _rx) = mpsc::channel(8);
    script_batches(&h, 4, &[(1, 2), (2, 3), (3, 4), (4, 5)]);

    let started = Instant::now();
    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 1)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.published, 4);
    assert_eq!(h.db.max_concurrent_statements(), 4);
    // One count round trip plus one overlapping batch round trip
    assert!(elapsed < delay * 4, "streaming took {elapsed:?}");
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_concurrency_limit_bounds_in_flight_batches() {
    let config = QuerierConfig {
        stream_concurrency_limit: Some(1),
        ..QuerierConfig::default()
    };
    let h = Harness::with(
        MockDatabase::unordered().with_query_delay(Duration::from_millis(20)),
        config,
    );
    let ctx = QueryContext::new();
    let (tx, _rx) = mpsc::channel(8);
    script_batches(&h, 3, &[(1, 2), (2, 3), (3, 4)]);

    let report = h
        .querier
        .get_all_valid_instruments_joined(&ctx, Some(&tx), 1)
        .await
        .unwrap();

    assert_eq!(report.published, 3);
    assert_eq!(h.db.max_concurrent_statements(), 1);
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_missing_sink_is_rejected_before_any_query() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let err = h
        .querier
        .get_all_valid_instruments(&ctx, None, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NilInput { what: "results channel" }));

    let err = h
        .querier
        .get_all_valid_instruments_joined(&ctx, None, 100)
        .await
        .unwrap_err();
    assert!(err.is_nil_input());

    assert!(h.builder.calls().is_empty());
    assert!(h.db.calls().is_empty());
}

#[tokio::test]
async fn test_count_failure_fails_the_call() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let (tx, _rx) = mpsc::channel(8);

    let count_query = h
        .builder
        .expect_entity::<ValidInstrument>(methods::COUNT, vec![]);
    h.db.expect_query_error(&count_query, DatabaseError::execute("table missing"));

    let err = h
        .querier
        .get_all_valid_instruments(&ctx, Some(&tx), 100)
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .starts_with("fetching count of valid instrument rows"));
    assert!(h.builder.calls_to(methods::BATCH).is_empty());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_joined_stream_completes_when_drained_concurrently() {
    let h = Harness::unordered();
    let ctx = QueryContext::new();
    let (tx, mut rx) = mpsc::channel::<Vec<ValidInstrument>>(1);
    script_batches(&h, 5, &[(1, 3), (3, 5), (5, 7)]);

    let drain = async {
        let mut received = 0;
        for _ in 0..3 {
            received += rx.recv().await.expect("channel open").len();
        }
        received
    };
    let joined = h.querier.get_all_valid_instruments_joined(&ctx, Some(&tx), 2);

    let (report, received) = timeout(Duration::from_secs(2), async { tokio::join!(joined, drain) })
        .await
        .expect("joined stream finished");

    let report = report.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.published, 3);
    assert_eq!(received, 3);
    h.assert_expectations_met();
}

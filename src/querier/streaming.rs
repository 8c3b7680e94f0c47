// ABOUTME: Batched full-table streaming: count, split into id ranges, scan each range in its own task
// ABOUTME: Fire-and-forget entry point plus a joined entry point reporting per-batch outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Batched streaming
//!
//! Streaming counts the table, then dispatches one task per id range
//! `[begin, begin + batch_size)` for `begin = 1, 1 + batch_size, ...` while
//! `begin <= count`. Each task asks the builder for its range, scans every row,
//! and publishes the batch to the caller's channel. Tasks run in parallel and
//! publish in whatever order they finish; the channel is never closed here.
//!
//! - A task whose query reports no rows publishes nothing and stays silent
//! - Any other task failure is logged on the task's span and nothing is published
//! - An optional semaphore bounds how many tasks query at once
//!
//! [`SqlQuerier::stream_rows`] returns as soon as the tasks are spawned.
//! [`SqlQuerier::stream_rows_joined`] waits for every task and reports what
//! each one did.

use std::sync::Arc;

use larder_core::errors::{DatabaseError, DatabaseResult};
use tokio::sync::mpsc::Sender;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::field::Empty;
use tracing::{debug, debug_span, Instrument, Span};

use super::generic::scan_rows;
use super::{Scannable, SqlQuerier};
use crate::context::QueryContext;
use crate::database::{get_rows, perform_count_query, SqlQuery};
use crate::observability::{attach_batch_range, log_error, note, operation_span, prepare_error};
use crate::querybuilding::SqlQueryBuilder;

/// Builds the count query of the streamed table
pub(crate) type CountQueryFn = fn(&dyn SqlQueryBuilder) -> SqlQuery;

/// Builds the query for rows with `begin <= id < end`
pub(crate) type BatchQueryFn = fn(&dyn SqlQueryBuilder, u64, u64) -> SqlQuery;

/// What to stream: the table's label, its count query, and its range query
#[derive(Clone, Copy)]
pub(crate) struct StreamSource {
    pub(crate) label: &'static str,
    pub(crate) count_query: CountQueryFn,
    pub(crate) batch_query: BatchQueryFn,
}

/// A batch task that ended without publishing
#[derive(Debug)]
pub struct BatchFailure {
    /// First id of the range
    pub begin: u64,
    /// End of the range, exclusive
    pub end: u64,
    /// Why the task stopped
    pub error: DatabaseError,
}

/// Outcome of a joined stream
#[derive(Debug, Default)]
pub struct BatchStreamReport {
    /// Tasks dispatched
    pub dispatched: usize,
    /// Batches published to the channel
    pub published: usize,
    /// Rows across all published batches
    pub rows_published: usize,
    /// Tasks whose query reported no rows
    pub empty: usize,
    /// Tasks that failed
    pub failures: Vec<BatchFailure>,
}

impl BatchStreamReport {
    /// Whether every dispatched task either published or found no rows
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.published + self.empty == self.dispatched
    }

    fn record(&mut self, outcome: BatchOutcome) {
        match outcome.status {
            BatchStatus::Published(rows) => {
                self.published += 1;
                self.rows_published += rows;
            }
            BatchStatus::Empty => self.empty += 1,
            BatchStatus::Failed(error) => self.failures.push(BatchFailure {
                begin: outcome.begin,
                end: outcome.end,
                error,
            }),
        }
    }
}

#[derive(Debug)]
enum BatchStatus {
    Published(usize),
    Empty,
    Failed(DatabaseError),
}

#[derive(Debug)]
struct BatchOutcome {
    begin: u64,
    end: u64,
    status: BatchStatus,
}

/// Split `1..=count` into half-open ranges of `batch_size` ids
fn batch_ranges(count: u64, batch_size: u64) -> Vec<(u64, u64)> {
    let mut ranges = Vec::new();
    let mut begin = 1;
    while begin <= count {
        ranges.push((begin, begin.saturating_add(batch_size)));
        match begin.checked_add(batch_size) {
            Some(next) => begin = next,
            None => break,
        }
    }
    ranges
}

struct BatchTask<T> {
    querier: SqlQuerier,
    ctx: QueryContext,
    label: &'static str,
    batch_query: BatchQueryFn,
    begin: u64,
    end: u64,
    sink: Sender<Vec<T>>,
    limiter: Option<Arc<Semaphore>>,
}

impl<T: Scannable> BatchTask<T> {
    async fn run(self) -> BatchOutcome {
        let status = self.execute().await;
        BatchOutcome {
            begin: self.begin,
            end: self.end,
            status,
        }
    }

    async fn execute(&self) -> BatchStatus {
        let span = Span::current();

        let _permit = match &self.limiter {
            Some(limiter) => {
                let acquired = self
                    .ctx
                    .run(async {
                        Arc::clone(limiter)
                            .acquire_owned()
                            .await
                            .map_err(|_| DatabaseError::execute("batch limiter closed"))
                    })
                    .await;
                match acquired {
                    Ok(permit) => Some(permit),
                    Err(e) => return Self::failed(e, &span, "waiting for batch slot"),
                }
            }
            None => None,
        };

        let query = (self.batch_query)(self.querier.builder(), self.begin, self.end);
        let mut db = self.querier.handle();
        let rows = match get_rows(&self.ctx, db.as_mut(), self.label, &query).await {
            Ok(rows) => rows,
            Err(DatabaseError::NoRows) => {
                note(&span, "no rows in batch");
                return BatchStatus::Empty;
            }
            Err(e) => return Self::failed(e, &span, "querying batch"),
        };

        let batch = match scan_rows::<T>(rows, false) {
            Ok(scanned) => scanned.items,
            Err(e) => return Self::failed(e, &span, "scanning batch"),
        };

        let rows = batch.len();
        let published = self
            .ctx
            .run(async {
                self.sink
                    .send(batch)
                    .await
                    .map_err(|_| DatabaseError::execute("results channel closed"))
            })
            .await;
        match published {
            Ok(()) => {
                debug!(parent: &span, rows, "published batch");
                BatchStatus::Published(rows)
            }
            Err(e) => Self::failed(e, &span, "publishing batch"),
        }
    }

    fn failed(error: DatabaseError, span: &Span, description: &str) -> BatchStatus {
        log_error(&error, span, description);
        BatchStatus::Failed(error)
    }
}

impl SqlQuerier {
    /// Count the source and build one task per batch range
    async fn plan_batches<T: Scannable>(
        &self,
        ctx: &QueryContext,
        span: &Span,
        source: &StreamSource,
        sink: &Sender<Vec<T>>,
        batch_size: u16,
    ) -> DatabaseResult<Vec<(Span, BatchTask<T>)>> {
        let batch_size = if batch_size == 0 {
            self.config().default_batch_size
        } else {
            batch_size
        };

        let count_query = (source.count_query)(self.builder());
        let mut db = self.handle();
        let count = perform_count_query(ctx, db.as_mut(), &count_query)
            .await
            .map_err(|e| prepare_error(e, span, &format!("fetching count of {} rows", source.label)))?;

        let limiter = self
            .config()
            .stream_concurrency_limit
            .map(|limit| Arc::new(Semaphore::new(limit)));

        let ranges = batch_ranges(count, u64::from(batch_size));
        debug!(parent: span, count, batch_size, batches = ranges.len(), "dispatching batches");

        Ok(ranges
            .into_iter()
            .map(|(begin, end)| {
                let task_span = debug_span!(
                    parent: span,
                    "batch",
                    entity = source.label,
                    batch_begin = Empty,
                    batch_end = Empty,
                    error = Empty,
                    error.message = Empty,
                );
                attach_batch_range(&task_span, begin, end);
                let task = BatchTask {
                    querier: self.clone(),
                    ctx: ctx.clone(),
                    label: source.label,
                    batch_query: source.batch_query,
                    begin,
                    end,
                    sink: sink.clone(),
                    limiter: limiter.clone(),
                };
                (task_span, task)
            })
            .collect())
    }

    /// Stream every row of `source` to `sink` in parallel batches
    ///
    /// Returns once the tasks are spawned; task failures are only logged.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilInput`] without a sink, or the wrapped
    /// count query error
    pub(crate) async fn stream_rows<T: Scannable>(
        &self,
        ctx: &QueryContext,
        source: StreamSource,
        sink: Option<&Sender<Vec<T>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        let span = operation_span("stream all", source.label);
        let sink = sink.ok_or(DatabaseError::nil_input("results channel"))?;

        for (task_span, task) in self
            .plan_batches(ctx, &span, &source, sink, batch_size)
            .await?
        {
            tokio::spawn(task.run().instrument(task_span));
        }
        Ok(())
    }

    /// Stream every row of `source` to `sink` and wait for every batch task
    ///
    /// Dropping the returned future aborts any task still running. Batches
    /// are published while this waits, so a caller that awaits it before
    /// draining a sink with fewer slots than batches deadlocks.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilInput`] without a sink, or the wrapped
    /// count query error; task failures are reported in the
    /// [`BatchStreamReport`]
    pub(crate) async fn stream_rows_joined<T: Scannable>(
        &self,
        ctx: &QueryContext,
        source: StreamSource,
        sink: Option<&Sender<Vec<T>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        let span = operation_span("stream all joined", source.label);
        let sink = sink.ok_or(DatabaseError::nil_input("results channel"))?;

        let mut tasks = JoinSet::new();
        for (task_span, task) in self
            .plan_batches(ctx, &span, &source, sink, batch_size)
            .await?
        {
            tasks.spawn(task.run().instrument(task_span));
        }

        let mut report = BatchStreamReport {
            dispatched: tasks.len(),
            ..BatchStreamReport::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(join_err) => {
                    let error = DatabaseError::execute(format!("batch task did not finish: {join_err}"));
                    log_error(&error, &span, "joining batch task");
                    report.failures.push(BatchFailure {
                        begin: 0,
                        end: 0,
                        error,
                    });
                }
            }
        }

        debug!(
            parent: &span,
            published = report.published,
            empty = report.empty,
            failed = report.failures.len(),
            "batch stream finished"
        );
        Ok(report)
    }
}

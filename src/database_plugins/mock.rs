// ABOUTME: Scripted mock database for querier unit tests
// ABOUTME: Ordered or unordered begin/query/exec/commit/rollback expectations with latency and call log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Mock database
//!
//! Tests script the exact statements a querier operation should issue, hand
//! the mock to a `SqlQuerier`, then call [`MockDatabase::assert_expectations_met`].
//! Ordered mocks require calls in registration order; unordered mocks accept
//! them in any order, which streaming tests need since batches race.
//!
//! A call with no matching expectation fails with an execute error and is
//! reported by `assert_expectations_met`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use larder_core::errors::{DatabaseError, DatabaseResult};
use tokio::time::sleep;

use crate::database::{
    BufferedRows, DatabaseHandle, ExecResult, Querier, ResultIterator, Row, SqlQuery, Transaction,
};

/// A call the mock received
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// Transaction begin
    Begin,
    /// Read statement
    Query(SqlQuery),
    /// Write statement
    Exec(SqlQuery),
    /// Transaction commit
    Commit,
    /// Transaction rollback
    Rollback,
}

#[derive(Debug)]
enum Expected {
    Begin(DatabaseResult<()>),
    Query(SqlQuery, DatabaseResult<BufferedRows>),
    Exec(SqlQuery, DatabaseResult<ExecResult>),
    Commit(DatabaseResult<()>),
    Rollback(DatabaseResult<()>),
}

impl Expected {
    fn matches(&self, call: &MockCall) -> bool {
        match (self, call) {
            (Self::Begin(_), MockCall::Begin)
            | (Self::Commit(_), MockCall::Commit)
            | (Self::Rollback(_), MockCall::Rollback) => true,
            (Self::Query(expected, _), MockCall::Query(actual))
            | (Self::Exec(expected, _), MockCall::Exec(actual)) => expected == actual,
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Begin(_) => "begin".to_owned(),
            Self::Query(query, _) => format!("query {:?}", query.sql),
            Self::Exec(query, _) => format!("exec {:?}", query.sql),
            Self::Commit(_) => "commit".to_owned(),
            Self::Rollback(_) => "rollback".to_owned(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    unordered: bool,
    delay: Option<Duration>,
    expectations: VecDeque<Expected>,
    calls: Vec<MockCall>,
    unexpected: Vec<MockCall>,
    statements: usize,
    in_flight: usize,
    max_in_flight: usize,
}

/// Database handle answering from scripted expectations
///
/// Clones share the same script, so a test can keep one clone for assertions
/// while the querier owns another.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    /// Mock requiring calls in registration order
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock accepting calls in any order
    #[must_use]
    pub fn unordered() -> Self {
        let db = Self::default();
        db.lock().unordered = true;
        db
    }

    /// Delay every query and exec by `delay`
    #[must_use]
    pub fn with_query_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, expected: Expected) -> &Self {
        self.lock().expectations.push_back(expected);
        self
    }

    /// Expect a successful transaction begin
    pub fn expect_begin(&self) -> &Self {
        self.push(Expected::Begin(Ok(())))
    }

    /// Expect a transaction begin that fails with `error`
    pub fn expect_begin_error(&self, error: DatabaseError) -> &Self {
        self.push(Expected::Begin(Err(error)))
    }

    /// Expect `query` to be read, yielding `rows`
    pub fn expect_query(&self, query: &SqlQuery, rows: Vec<Row>) -> &Self {
        self.expect_query_rows(query, BufferedRows::new(rows))
    }

    /// Expect `query` to be read, yielding a prepared iterator
    pub fn expect_query_rows(&self, query: &SqlQuery, rows: BufferedRows) -> &Self {
        self.push(Expected::Query(query.clone(), Ok(rows)))
    }

    /// Expect `query` to be read and fail with `error`
    pub fn expect_query_error(&self, query: &SqlQuery, error: DatabaseError) -> &Self {
        self.push(Expected::Query(query.clone(), Err(error)))
    }

    /// Expect `query` to be executed, reporting `result`
    pub fn expect_exec(&self, query: &SqlQuery, result: ExecResult) -> &Self {
        self.push(Expected::Exec(query.clone(), Ok(result)))
    }

    /// Expect `query` to be executed and fail with `error`
    pub fn expect_exec_error(&self, query: &SqlQuery, error: DatabaseError) -> &Self {
        self.push(Expected::Exec(query.clone(), Err(error)))
    }

    /// Expect a successful commit
    pub fn expect_commit(&self) -> &Self {
        self.push(Expected::Commit(Ok(())))
    }

    /// Expect a commit that fails with `error`
    pub fn expect_commit_error(&self, error: DatabaseError) -> &Self {
        self.push(Expected::Commit(Err(error)))
    }

    /// Expect a successful rollback
    pub fn expect_rollback(&self) -> &Self {
        self.push(Expected::Rollback(Ok(())))
    }

    /// Expect a rollback that fails with `error`
    pub fn expect_rollback_error(&self, error: DatabaseError) -> &Self {
        self.push(Expected::Rollback(Err(error)))
    }

    /// Every call received, in arrival order
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of query and exec calls received
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.lock().statements
    }

    /// Highest number of statements that were in progress at once
    #[must_use]
    pub fn max_concurrent_statements(&self) -> usize {
        self.lock().max_in_flight
    }

    /// Panic unless every expectation was consumed and no unexpected call arrived
    ///
    /// # Panics
    ///
    /// Panics listing the leftover expectations and unexpected calls
    #[allow(clippy::panic)]
    pub fn assert_expectations_met(&self) {
        let state = self.lock();
        let unmet: Vec<String> = state.expectations.iter().map(Expected::describe).collect();
        if !unmet.is_empty() || !state.unexpected.is_empty() {
            panic!(
                "database expectations not met\nunmet: {unmet:#?}\nunexpected: {:#?}",
                state.unexpected
            );
        }
    }

    fn take(&self, call: MockCall) -> Option<Expected> {
        let mut state = self.lock();
        state.calls.push(call.clone());
        let position = if state.unordered {
            state.expectations.iter().position(|e| e.matches(&call))
        } else {
            state
                .expectations
                .front()
                .filter(|e| e.matches(&call))
                .map(|_| 0)
        };
        let taken = position.and_then(|index| state.expectations.remove(index));
        if taken.is_none() {
            state.unexpected.push(call);
        }
        taken
    }

    async fn statement(&self, call: MockCall) -> Option<Expected> {
        let delay = {
            let mut state = self.lock();
            state.statements += 1;
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.delay
        };
        let _in_flight = InFlight(self);
        if let Some(delay) = delay {
            sleep(delay).await;
        }
        self.take(call)
    }

    async fn exec_statement(&self, query: &SqlQuery) -> DatabaseResult<ExecResult> {
        match self.statement(MockCall::Exec(query.clone())).await {
            Some(Expected::Exec(_, result)) => result,
            _ => Err(unexpected("exec", query)),
        }
    }

    async fn query_statement(&self, query: &SqlQuery) -> DatabaseResult<Box<dyn ResultIterator>> {
        match self.statement(MockCall::Query(query.clone())).await {
            Some(Expected::Query(_, result)) => {
                result.map(|rows| Box::new(rows) as Box<dyn ResultIterator>)
            }
            _ => Err(unexpected("query", query)),
        }
    }

    fn finish(&self, call: MockCall) -> DatabaseResult<()> {
        let name = if call == MockCall::Commit { "commit" } else { "rollback" };
        match self.take(call) {
            Some(Expected::Commit(result) | Expected::Rollback(result)) => result,
            _ => Err(DatabaseError::execute(format!("unexpected {name}"))),
        }
    }
}

/// Decrements the in-flight count even when the statement future is dropped
struct InFlight<'a>(&'a MockDatabase);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

fn unexpected(kind: &str, query: &SqlQuery) -> DatabaseError {
    DatabaseError::execute(format!("unexpected {kind}: {:?}", query.sql))
}

#[async_trait]
impl DatabaseHandle for MockDatabase {
    fn querier(&self) -> Box<dyn Querier> {
        Box::new(MockQuerier { db: self.clone() })
    }

    async fn begin(&self) -> DatabaseResult<Box<dyn Transaction>> {
        match self.take(MockCall::Begin) {
            Some(Expected::Begin(result)) => {
                result?;
                Ok(Box::new(MockTransaction { db: self.clone() }))
            }
            _ => Err(DatabaseError::execute("unexpected begin")),
        }
    }
}

struct MockQuerier {
    db: MockDatabase,
}

#[async_trait]
impl Querier for MockQuerier {
    async fn exec(&mut self, query: &SqlQuery) -> DatabaseResult<ExecResult> {
        self.db.exec_statement(query).await
    }

    async fn query(&mut self, query: &SqlQuery) -> DatabaseResult<Box<dyn ResultIterator>> {
        self.db.query_statement(query).await
    }
}

struct MockTransaction {
    db: MockDatabase,
}

#[async_trait]
impl Querier for MockTransaction {
    async fn exec(&mut self, query: &SqlQuery) -> DatabaseResult<ExecResult> {
        self.db.exec_statement(query).await
    }

    async fn query(&mut self, query: &SqlQuery) -> DatabaseResult<Box<dyn ResultIterator>> {
        self.db.query_statement(query).await
    }
}

#[async_trait]
impl Transaction for MockTransaction {
    fn as_querier(&mut self) -> &mut dyn Querier {
        self
    }

    async fn commit(self: Box<Self>) -> DatabaseResult<()> {
        self.db.finish(MockCall::Commit)
    }

    async fn rollback(self: Box<Self>) -> DatabaseResult<()> {
        self.db.finish(MockCall::Rollback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqlValue;

    #[tokio::test]
    async fn ordered_mock_rejects_out_of_order_calls() {
        let first = SqlQuery::unparameterized("SELECT 1");
        let second = SqlQuery::unparameterized("SELECT 2");
        let db = MockDatabase::new();
        db.expect_query(&first, Vec::new()).expect_query(&second, Vec::new());

        let mut querier = db.querier();
        assert!(querier.query(&second).await.is_err());
        assert_eq!(db.calls(), vec![MockCall::Query(second)]);
    }

    #[tokio::test]
    async fn unordered_mock_accepts_any_order() {
        let first = SqlQuery::unparameterized("SELECT 1");
        let second = SqlQuery::new("SELECT ?", vec![SqlValue::Int(2)]);
        let db = MockDatabase::unordered();
        db.expect_query(&first, vec![Row::new(vec![SqlValue::Int(1)])])
            .expect_exec(&second, ExecResult::default());

        let mut querier = db.querier();
        querier.exec(&second).await.unwrap();
        let mut rows = querier.query(&first).await.unwrap();
        assert!(rows.advance());
        assert_eq!(db.statement_count(), 2);
        db.assert_expectations_met();
    }

    #[tokio::test]
    async fn transactions_consume_begin_and_commit() {
        let insert = SqlQuery::unparameterized("INSERT");
        let db = MockDatabase::new();
        db.expect_begin()
            .expect_exec(&insert, ExecResult::default())
            .expect_commit();

        let mut tx = db.begin().await.unwrap();
        tx.exec(&insert).await.unwrap();
        tx.commit().await.unwrap();
        db.assert_expectations_met();
    }

    #[tokio::test]
    async fn scripted_errors_are_returned() {
        let db = MockDatabase::new();
        db.expect_begin_error(DatabaseError::execute("pool exhausted"));
        assert!(db.begin().await.is_err());
        db.assert_expectations_met();
    }
}

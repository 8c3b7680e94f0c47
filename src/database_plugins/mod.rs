// ABOUTME: Database backends implementing the querier capability traits
// ABOUTME: sqlx Any pool for PostgreSQL and SQLite, plus a scripted mock database for tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database plugins
//!
//! Both backends implement [`DatabaseHandle`](crate::database::DatabaseHandle):
//!
//! - [`SqlxDatabase`]: connection pool over `sqlx::AnyPool`, selecting the
//!   PostgreSQL or SQLite driver from the configured URL
//! - [`MockDatabase`]: scripted begin/query/exec/commit/rollback expectations
//!   for unit tests, with optional latency and concurrency tracking

/// Scripted mock database
pub mod mock;
/// sqlx `Any` backend
pub mod sqlx_any;

pub use mock::MockDatabase;
pub use sqlx_any::SqlxDatabase;

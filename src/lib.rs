// ABOUTME: Main library entry point for the larder recipe persistence layer
// ABOUTME: Transactional writes with bundled audit logging and batched parallel streaming
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Larder
//!
//! Data-access layer of a multi-tenant recipe-management application. It sits
//! between service code and a relational database and exposes one data-manager
//! trait per entity, all implemented by [`querier::SqlQuerier`].
//!
//! ## Features
//!
//! - **Transactional writes**: every create, update and archive commits
//!   atomically with its audit log entry
//! - **Batched streaming**: full-table reads fan out into parallel id-range
//!   batches published to a caller-owned channel
//! - **Pluggable SQL**: query text comes from a [`querybuilding::SqlQueryBuilder`]
//! - **Backends**: a sqlx `Any` pool for PostgreSQL or SQLite, and a scripted
//!   mock for tests
//!
//! ## Architecture
//!
//! - **database**: querier capability traits, rows, executor helpers, and the
//!   transaction guard
//! - **`database_plugins`**: concrete database handles
//! - **querybuilding**: query-builder traits and a recording mock builder
//! - **querier**: generic entity operations, streaming, audit sinks, admin
//!   operations, and the per-entity data managers
//! - **audit**: audit entry constructors
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use larder::config::DatabaseConfig;
//! use larder::context::QueryContext;
//! use larder::database_plugins::SqlxDatabase;
//! use larder::errors::AppResult;
//! use larder::querier::{SqlQuerier, ValidInstrumentDataManager};
//! use larder::querybuilding::SqlQueryBuilder;
//!
//! async fn count_instruments(builder: Arc<dyn SqlQueryBuilder>) -> AppResult<u64> {
//!     let config = DatabaseConfig::from_env()?;
//!     let db = SqlxDatabase::connect(&config).await?;
//!     let querier = SqlQuerier::new(Arc::new(db), builder, config.querier);
//!     Ok(querier
//!         .get_all_valid_instruments_count(&QueryContext::new())
//!         .await?)
//! }
//! ```

/// Audit log entry constructors for entity and account events
pub mod audit;

/// Environment-driven configuration
pub mod config;

/// Cancellation context threaded through every data-access call
pub mod context;

/// Querier capability traits, rows, executor helpers, and transactions
pub mod database;

/// Database backends: sqlx `Any` pool and scripted mock
pub mod database_plugins;

/// Application-level error types
pub mod errors;

/// Structured logging initialisation
pub mod logging;

/// Operation spans and error preparation
pub mod observability;

/// Entity data managers over a database handle
pub mod querier;

/// Query-builder contracts and the recording mock builder
pub mod querybuilding;

pub use larder_core;

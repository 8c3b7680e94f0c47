// ABOUTME: Configuration module for embedding processes
// ABOUTME: Environment-driven database, pool, and querier settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration
//!
//! The querier itself only consumes an already-built [`QuerierConfig`];
//! loading from the environment happens here, in the embedding process.

/// Database, pool, and querier configuration
pub mod database;

pub use database::{DatabaseConfig, DatabaseUrl, IdStrategy, PoolConfig, QuerierConfig};

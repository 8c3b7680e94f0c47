// ABOUTME: Error types shared between the core crate and the persistence layer
// ABOUTME: Re-exports the database error taxonomy and its result alias
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Database error taxonomy
pub mod database;

pub use database::{DatabaseError, DatabaseResult};

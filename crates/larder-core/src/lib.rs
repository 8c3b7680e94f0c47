// ABOUTME: Core types and constants for the larder recipe persistence layer
// ABOUTME: Foundation crate with error handling, pagination, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Larder Core
//!
//! Foundation crate providing the shared types of the larder persistence layer.
//! It holds no I/O: everything here is plain data plus the error taxonomy that
//! the querier and its callers agree on.
//!
//! ## Modules
//!
//! - **errors**: `DatabaseError` taxonomy shared by every data-access operation
//! - **constants**: list limits, batch sizes, and audit context keys
//! - **pagination**: `QueryFilter` and `ListPage`
//! - **models**: entity records, creation inputs, and audit log types

/// Error taxonomy for data-access operations
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Query filters and list pages
pub mod pagination;

/// Domain models (entity records, creation inputs, audit log entries)
pub mod models;

// ABOUTME: Constants for list limits, streaming batch sizes, and audit context keys
// ABOUTME: Pure data constants shared by the querier, its query builders, and its callers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped by domain rather than kept in one flat list.

/// Pagination and batching limits
pub mod limits {
    /// Limit applied when a filter or bulk fetch passes the zero sentinel
    pub const DEFAULT_QUERY_FILTER_LIMIT: u8 = 20;
    /// Largest page a filter may request
    pub const MAX_QUERY_FILTER_LIMIT: u8 = 250;
    /// Batch size used by full-table streaming when the caller passes zero
    pub const DEFAULT_BATCH_SIZE: u16 = 1000;
}

/// Keys used inside audit log entry context maps
pub mod audit_context_keys {
    /// User who performed the audited action
    pub const PERFORMED_BY: &str = "performed_by";
    /// Serialized record as it looked right after creation
    pub const CREATION_ASSIGNMENT: &str = "created";
    /// Field-change summaries attached to updates
    pub const CHANGES: &str = "changes";
    /// User the event concerns
    pub const USER_ID: &str = "user_id";
    /// Household (account) the event concerns
    pub const HOUSEHOLD_ID: &str = "household_id";
    /// Free-form reason supplied by an administrator
    pub const REASON: &str = "reason";
}

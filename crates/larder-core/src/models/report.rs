// ABOUTME: User-submitted report records and creation inputs
// ABOUTME: Reports belong to an account and describe a concern of a given type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// A report filed by a member of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Kind of report
    pub report_type: String,
    /// Description of the concern
    pub concern: String,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
    /// Owning account
    pub belongs_to_account: u64,
}

/// Fields supplied when filing a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCreationInput {
    /// Kind of report
    pub report_type: String,
    /// Description of the concern
    pub concern: String,
    /// Owning account
    pub belongs_to_account: u64,
}

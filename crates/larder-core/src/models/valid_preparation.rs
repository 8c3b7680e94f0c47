// ABOUTME: Valid preparation records and creation inputs
// ABOUTME: Preparation techniques (dice, julienne, braise) recipes may reference
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// A preparation technique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPreparation {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Icon location
    pub icon_path: String,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
}

/// Fields supplied when creating a valid preparation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPreparationCreationInput {
    /// Name
    pub name: String,
    /// Description
    pub description: String,
    /// Icon location
    pub icon_path: String,
}

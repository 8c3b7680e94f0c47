// ABOUTME: Valid instrument records and creation inputs
// ABOUTME: Kitchen instruments recipes may reference
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// An instrument recipes may use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidInstrument {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Name
    pub name: String,
    /// Variant, such as "cast iron"
    pub variant: String,
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

/// Fields supplied when creating a valid instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidInstrumentCreationInput {
    /// Name
    pub name: String,
    /// Variant
    pub variant: String,
    /// Description
    pub description: String,
    /// Icon location
    pub icon_path: String,
}

// ABOUTME: Valid preparation instrument records and creation inputs
// ABOUTME: Links a preparation technique to an instrument it needs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Pairing of a preparation with an instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPreparationInstrument {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Instrument used
    pub valid_instrument_id: u64,
    /// Preparation performed
    pub valid_preparation_id: u64,
    /// Notes about the pairing
    pub notes: String,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
}

/// Fields supplied when creating a valid preparation instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPreparationInstrumentCreationInput {
    /// Instrument used
    pub valid_instrument_id: u64,
    /// Preparation performed
    pub valid_preparation_id: u64,
    /// Notes about the pairing
    pub notes: String,
}

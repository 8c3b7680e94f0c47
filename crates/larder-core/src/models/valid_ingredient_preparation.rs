// ABOUTME: Valid ingredient preparation records and creation inputs
// ABOUTME: Links an ingredient to a preparation technique that suits it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Pairing of an ingredient with a preparation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidIngredientPreparation {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Notes about the pairing
    pub notes: String,
    /// Ingredient being prepared
    pub valid_ingredient_id: u64,
    /// Preparation applied
    pub valid_preparation_id: u64,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
}

/// Fields supplied when creating a valid ingredient preparation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidIngredientPreparationCreationInput {
    /// Notes about the pairing
    pub notes: String,
    /// Ingredient being prepared
    pub valid_ingredient_id: u64,
    /// Preparation applied
    pub valid_preparation_id: u64,
}

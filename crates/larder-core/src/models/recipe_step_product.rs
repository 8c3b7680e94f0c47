// ABOUTME: Recipe step product records and creation inputs
// ABOUTME: What a recipe step yields, with a quantity, scoped to its step
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Product yielded by a recipe step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepProduct {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Name
    pub name: String,
    /// Unit of the quantity
    pub quantity_type: String,
    /// Amount produced
    pub quantity_value: f64,
    /// Notes about the quantity
    pub quantity_notes: String,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
    /// Owning recipe step
    pub belongs_to_recipe_step: u64,
}

/// Fields supplied when creating a recipe step product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStepProductCreationInput {
    /// Name
    pub name: String,
    /// Unit of the quantity
    pub quantity_type: String,
    /// Amount produced
    pub quantity_value: f64,
    /// Notes about the quantity
    pub quantity_notes: String,
    /// Owning recipe step
    pub belongs_to_recipe_step: u64,
}

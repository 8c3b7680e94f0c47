// ABOUTME: Valid ingredient records and creation inputs
// ABOUTME: Ingredients carry allergen flags and animal-product markers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// An ingredient recipes may use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // One flag per tracked allergen
pub struct ValidIngredient {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Name
    pub name: String,
    /// Variant, such as "red" for onions
    pub variant: String,
    /// Description
    pub description: String,
    /// Handling warning
    pub warning: String,
    /// Contains egg
    pub contains_egg: bool,
    /// Contains dairy
    pub contains_dairy: bool,
    /// Contains peanut
    pub contains_peanut: bool,
    /// Contains tree nuts
    pub contains_tree_nut: bool,
    /// Contains soy
    pub contains_soy: bool,
    /// Contains wheat
    pub contains_wheat: bool,
    /// Contains shellfish
    pub contains_shellfish: bool,
    /// Contains sesame
    pub contains_sesame: bool,
    /// Contains fish
    pub contains_fish: bool,
    /// Contains gluten
    pub contains_gluten: bool,
    /// Is animal flesh
    pub animal_flesh: bool,
    /// Is derived from an animal
    pub animal_derived: bool,
    /// Measured by volume rather than weight
    pub volumetric: bool,
    /// Icon location
    pub icon_path: String,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
}

/// Fields supplied when creating a valid ingredient
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidIngredientCreationInput {
    /// Name
    pub name: String,
    /// Variant
    pub variant: String,
    /// Description
    pub description: String,
    /// Handling warning
    pub warning: String,
    /// Contains egg
    pub contains_egg: bool,
    /// Contains dairy
    pub contains_dairy: bool,
    /// Contains peanut
    pub contains_peanut: bool,
    /// Contains tree nuts
    pub contains_tree_nut: bool,
    /// Contains soy
    pub contains_soy: bool,
    /// Contains wheat
    pub contains_wheat: bool,
    /// Contains shellfish
    pub contains_shellfish: bool,
    /// Contains sesame
    pub contains_sesame: bool,
    /// Contains fish
    pub contains_fish: bool,
    /// Contains gluten
    pub contains_gluten: bool,
    /// Is animal flesh
    pub animal_flesh: bool,
    /// Is derived from an animal
    pub animal_derived: bool,
    /// Measured by volume rather than weight
    pub volumetric: bool,
    /// Icon location
    pub icon_path: String,
}

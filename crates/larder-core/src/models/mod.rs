// ABOUTME: Domain models for the recipe persistence layer
// ABOUTME: Entity records, creation inputs, field-change summaries, and audit log types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain models
//!
//! Every entity record carries a database-assigned `id`, an opaque
//! `external_id`, its own attributes, and the `created_on` /
//! `last_updated_on` / `archived_on` timestamps in unix seconds. Creation
//! inputs are the subset of attributes a caller supplies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API client credentials owned by a user
pub mod api_client;
/// Audit log entries and their event vocabulary
pub mod audit_log_entry;
/// Household invitations
pub mod invitation;
/// Recipe step products
pub mod recipe_step_product;
/// User-submitted reports
pub mod report;
/// User reputation updates
pub mod user;
/// Valid ingredients
pub mod valid_ingredient;
/// Valid ingredient preparations
pub mod valid_ingredient_preparation;
/// Valid instruments
pub mod valid_instrument;
/// Valid preparations
pub mod valid_preparation;
/// Valid preparation instruments
pub mod valid_preparation_instrument;

pub use api_client::{ApiClient, ApiClientCreationInput};
pub use audit_log_entry::{
    AuditAction, AuditLogContext, AuditLogEntry, AuditLogEntryCreationInput, AuditLogEventType,
    AuditResource,
};
pub use invitation::{Invitation, InvitationCreationInput};
pub use recipe_step_product::{RecipeStepProduct, RecipeStepProductCreationInput};
pub use report::{Report, ReportCreationInput};
pub use user::{UserReputation, UserReputationUpdateInput};
pub use valid_ingredient::{ValidIngredient, ValidIngredientCreationInput};
pub use valid_ingredient_preparation::{
    ValidIngredientPreparation, ValidIngredientPreparationCreationInput,
};
pub use valid_instrument::{ValidInstrument, ValidInstrumentCreationInput};
pub use valid_preparation::{ValidPreparation, ValidPreparationCreationInput};
pub use valid_preparation_instrument::{
    ValidPreparationInstrument, ValidPreparationInstrumentCreationInput,
};

/// One changed field of an update, attached to the update's audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChangeSummary {
    /// Name of the changed field
    pub field_name: String,
    /// Value before the update
    pub old_value: Value,
    /// Value after the update
    pub new_value: Value,
}

impl FieldChangeSummary {
    /// Build a summary from any serializable old/new pair
    pub fn new(
        field_name: impl Into<String>,
        old_value: impl Into<Value>,
        new_value: impl Into<Value>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

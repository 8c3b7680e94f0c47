// ABOUTME: Household invitation records and creation inputs
// ABOUTME: Invitations belong to an account and carry a redeemable code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Invitation to join a household
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Redeemable code
    pub code: String,
    /// Whether the code has been redeemed
    pub consumed: bool,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
    /// Owning account
    pub belongs_to_account: u64,
}

/// Fields supplied when creating an invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationCreationInput {
    /// Redeemable code
    pub code: String,
    /// Owning account
    pub belongs_to_account: u64,
}

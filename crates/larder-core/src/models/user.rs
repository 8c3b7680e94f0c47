// ABOUTME: User reputation update input used by administrative operations
// ABOUTME: Reputation levels map to the strings stored on the user row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Standing of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserReputation {
    /// Newly registered, not yet verified
    Unverified,
    /// In good standing
    Good,
    /// Banned by an administrator
    Banned,
    /// Account terminated
    Terminated,
}

impl UserReputation {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Good => "good",
            Self::Banned => "banned",
            Self::Terminated => "terminated",
        }
    }
}

impl Display for UserReputation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative change to a user's reputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReputationUpdateInput {
    /// User whose reputation changes
    pub target_user_id: u64,
    /// New standing
    pub new_reputation: UserReputation,
    /// Administrator's explanation
    pub reason: String,
}

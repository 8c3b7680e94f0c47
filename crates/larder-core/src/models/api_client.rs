// ABOUTME: API client records and creation inputs
// ABOUTME: Client secrets are kept out of serialized output and debug formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{self, Debug, Formatter};

use serde::{Deserialize, Serialize};

/// API client credentials belonging to a user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClient {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Display name
    pub name: String,
    /// Public client identifier
    pub client_id: String,
    /// Shared secret
    #[serde(skip_serializing, default)]
    pub client_secret: Vec<u8>,
    /// Creation time in unix seconds
    pub created_on: u64,
    /// Last update time
    pub last_updated_on: Option<u64>,
    /// Archive time
    pub archived_on: Option<u64>,
    /// Owning user
    pub belongs_to_user: u64,
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("id", &self.id)
            .field("external_id", &self.external_id)
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("created_on", &self.created_on)
            .field("last_updated_on", &self.last_updated_on)
            .field("archived_on", &self.archived_on)
            .field("belongs_to_user", &self.belongs_to_user)
            .finish()
    }
}

/// Fields supplied when creating an API client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClientCreationInput {
    /// Display name
    pub name: String,
    /// Public client identifier
    pub client_id: String,
    /// Shared secret
    pub client_secret: Vec<u8>,
    /// Owning user
    pub belongs_to_user: u64,
}

impl Debug for ApiClientCreationInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientCreationInput")
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("belongs_to_user", &self.belongs_to_user)
            .finish()
    }
}

// ABOUTME: Audit log entry records, creation inputs, and the typed event vocabulary
// ABOUTME: Event types render as kebab-case strings such as api-client-created
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Free-form context attached to an audit entry
pub type AuditLogContext = BTreeMap<String, Value>;

/// Resources whose lifecycle is audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditResource {
    /// API clients
    ApiClient,
    /// Household invitations
    Invitation,
    /// Reports
    Report,
    /// Valid ingredients
    ValidIngredient,
    /// Valid instruments
    ValidInstrument,
    /// Valid preparations
    ValidPreparation,
    /// Valid ingredient preparations
    ValidIngredientPreparation,
    /// Valid preparation instruments
    ValidPreparationInstrument,
    /// Recipe step products
    RecipeStepProduct,
}

impl AuditResource {
    const ALL: [Self; 9] = [
        Self::ApiClient,
        Self::Invitation,
        Self::Report,
        Self::ValidIngredient,
        Self::ValidInstrument,
        Self::ValidPreparation,
        Self::ValidIngredientPreparation,
        Self::ValidPreparationInstrument,
        Self::RecipeStepProduct,
    ];

    /// Kebab-case prefix used in event type strings
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiClient => "api-client",
            Self::Invitation => "invitation",
            Self::Report => "report",
            Self::ValidIngredient => "valid-ingredient",
            Self::ValidInstrument => "valid-instrument",
            Self::ValidPreparation => "valid-preparation",
            Self::ValidIngredientPreparation => "valid-ingredient-preparation",
            Self::ValidPreparationInstrument => "valid-preparation-instrument",
            Self::RecipeStepProduct => "recipe-step-product",
        }
    }

    /// Context key holding the audited record's id
    #[must_use]
    pub const fn id_key(self) -> &'static str {
        match self {
            Self::ApiClient => "api_client_id",
            Self::Invitation => "invitation_id",
            Self::Report => "report_id",
            Self::ValidIngredient => "valid_ingredient_id",
            Self::ValidInstrument => "valid_instrument_id",
            Self::ValidPreparation => "valid_preparation_id",
            Self::ValidIngredientPreparation => "valid_ingredient_preparation_id",
            Self::ValidPreparationInstrument => "valid_preparation_instrument_id",
            Self::RecipeStepProduct => "recipe_step_product_id",
        }
    }
}

/// Lifecycle transitions recorded for every resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Record created
    Created,
    /// Record updated
    Updated,
    /// Record archived
    Archived,
}

impl AuditAction {
    /// Kebab-case suffix used in event type strings
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Archived => "archived",
        }
    }
}

/// Typed audit event tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuditLogEventType {
    /// Lifecycle transition of a resource
    Resource(AuditResource, AuditAction),
    /// User logged in
    SuccessfulLogin,
    /// Banned user tried to log in
    BannedUserLoginAttempt,
    /// Login rejected for a bad password
    UnsuccessfulLoginBadPassword,
    /// Login rejected for a bad two-factor code
    UnsuccessfulLoginBad2Fa,
    /// User logged out
    Logout,
    /// Cookie secret rotated
    CycleCookieSecret,
    /// User banned by an administrator
    UserBanned,
    /// Household terminated by an administrator
    HouseholdTerminated,
    /// Event type read from storage that this build does not know
    Other(String),
}

impl AuditLogEventType {
    /// Lifecycle event for a resource
    #[must_use]
    pub const fn resource(resource: AuditResource, action: AuditAction) -> Self {
        Self::Resource(resource, action)
    }
}

impl Display for AuditLogEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(resource, action) => {
                write!(f, "{}-{}", resource.as_str(), action.as_str())
            }
            Self::SuccessfulLogin => f.write_str("user-logged-in"),
            Self::BannedUserLoginAttempt => f.write_str("banned-user-login-attempt"),
            Self::UnsuccessfulLoginBadPassword => f.write_str("user-login-failed-bad-password"),
            Self::UnsuccessfulLoginBad2Fa => f.write_str("user-login-failed-bad-2fa-token"),
            Self::Logout => f.write_str("user-logged-out"),
            Self::CycleCookieSecret => f.write_str("cookie-secret-cycled"),
            Self::UserBanned => f.write_str("user-banned"),
            Self::HouseholdTerminated => f.write_str("household-terminated"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for AuditLogEventType {
    type Err = fmt::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fixed = [
            Self::SuccessfulLogin,
            Self::BannedUserLoginAttempt,
            Self::UnsuccessfulLoginBadPassword,
            Self::UnsuccessfulLoginBad2Fa,
            Self::Logout,
            Self::CycleCookieSecret,
            Self::UserBanned,
            Self::HouseholdTerminated,
        ];
        if let Some(event) = fixed.into_iter().find(|e| e.to_string() == s) {
            return Ok(event);
        }

        for resource in AuditResource::ALL {
            let Some(action) = s
                .strip_prefix(resource.as_str())
                .and_then(|rest| rest.strip_prefix('-'))
            else {
                continue;
            };
            let action = match action {
                "created" => AuditAction::Created,
                "updated" => AuditAction::Updated,
                "archived" => AuditAction::Archived,
                _ => continue,
            };
            return Ok(Self::Resource(resource, action));
        }

        Ok(Self::Other(s.to_owned()))
    }
}

impl Serialize for AuditLogEventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuditLogEventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw
            .parse()
            .unwrap_or_else(|_| Self::Other(raw.clone())))
    }
}

/// A persisted audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Database-assigned id
    pub id: u64,
    /// Opaque external identifier
    pub external_id: String,
    /// Typed event tag
    pub event_type: AuditLogEventType,
    /// Free-form context
    pub context: AuditLogContext,
    /// Creation time in unix seconds
    pub created_on: u64,
}

/// Input for writing a new audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntryCreationInput {
    /// Typed event tag
    pub event_type: AuditLogEventType,
    /// Free-form context
    pub context: AuditLogContext,
}

impl AuditLogEntryCreationInput {
    /// Input with an empty context
    #[must_use]
    pub const fn new(event_type: AuditLogEventType) -> Self {
        Self {
            event_type,
            context: BTreeMap::new(),
        }
    }

    /// Add a context value
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_owned(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_events_render_kebab_case() {
        let event = AuditLogEventType::resource(AuditResource::ApiClient, AuditAction::Created);
        assert_eq!(event.to_string(), "api-client-created");
    }

    #[test]
    fn event_types_parse_back() {
        let event = AuditLogEventType::resource(
            AuditResource::ValidIngredientPreparation,
            AuditAction::Archived,
        );
        let parsed: AuditLogEventType = event.to_string().parse().unwrap();
        assert_eq!(parsed, event);

        let parsed: AuditLogEventType = "user-logged-out".parse().unwrap();
        assert_eq!(parsed, AuditLogEventType::Logout);
    }

    #[test]
    fn unknown_event_types_are_preserved() {
        let parsed: AuditLogEventType = "recipe-cloned".parse().unwrap();
        assert_eq!(parsed, AuditLogEventType::Other("recipe-cloned".to_owned()));
    }
}

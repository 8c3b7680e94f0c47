// ABOUTME: Audit log entry constructors for entity lifecycle and account events
// ABOUTME: Pure functions producing creation inputs; writing them is the querier's job
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Audit entry constructors
//!
//! Entity entries carry the record's id under the resource's id key (for
//! example `api_client_id`) and the acting user under `performed_by`.
//! Creation entries embed the created record, update entries the list of
//! field changes, and archive entries every id that keyed the archive.

use larder_core::constants::audit_context_keys::{
    CHANGES, CREATION_ASSIGNMENT, HOUSEHOLD_ID, PERFORMED_BY, REASON, USER_ID,
};
use larder_core::models::{
    AuditAction, AuditLogEntryCreationInput, AuditLogEventType, FieldChangeSummary,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::querier::{Entity, IdSet};

/// Serialize `value` for an audit context slot, recording `null` on failure
fn context_value<T: Serialize + ?Sized>(key: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!(key, error = %e, "serializing audit context value, recording null");
        Value::Null
    })
}

/// Entry recording that `created` was inserted by `performed_by`
#[must_use]
pub fn build_entity_creation_event_entry<E: Entity>(
    created: &E,
    performed_by: u64,
) -> AuditLogEntryCreationInput {
    AuditLogEntryCreationInput::new(AuditLogEventType::resource(
        E::RESOURCE,
        AuditAction::Created,
    ))
    .with(E::RESOURCE.id_key(), created.id())
    .with(PERFORMED_BY, performed_by)
    .with(CREATION_ASSIGNMENT, context_value(CREATION_ASSIGNMENT, created))
}

/// Entry recording the field changes `performed_by` made to row `id`
#[must_use]
pub fn build_entity_update_event_entry<E: Entity>(
    id: u64,
    performed_by: u64,
    changes: &[FieldChangeSummary],
) -> AuditLogEntryCreationInput {
    AuditLogEntryCreationInput::new(AuditLogEventType::resource(
        E::RESOURCE,
        AuditAction::Updated,
    ))
    .with(E::RESOURCE.id_key(), id)
    .with(PERFORMED_BY, performed_by)
    .with(CHANGES, context_value(CHANGES, changes))
}

/// Entry recording that `performed_by` archived the keyed row
#[must_use]
pub fn build_entity_archive_event_entry<E: Entity>(
    key: &E::ArchiveKey,
    performed_by: u64,
) -> AuditLogEntryCreationInput {
    key.ids().into_iter().fold(
        AuditLogEntryCreationInput::new(AuditLogEventType::resource(
            E::RESOURCE,
            AuditAction::Archived,
        )),
        |entry, (name, id)| entry.with(name, id),
    )
    .with(PERFORMED_BY, performed_by)
}

fn user_event(event_type: AuditLogEventType, user_id: u64) -> AuditLogEntryCreationInput {
    AuditLogEntryCreationInput::new(event_type).with(USER_ID, user_id)
}

/// User logged in
#[must_use]
pub fn build_successful_login_event_entry(user_id: u64) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::SuccessfulLogin, user_id)
}

/// Banned user tried to log in
#[must_use]
pub fn build_banned_user_login_attempt_event_entry(user_id: u64) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::BannedUserLoginAttempt, user_id)
}

/// Login rejected for a bad password
#[must_use]
pub fn build_unsuccessful_login_bad_password_event_entry(
    user_id: u64,
) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::UnsuccessfulLoginBadPassword, user_id)
}

/// Login rejected for a bad two-factor code
#[must_use]
pub fn build_unsuccessful_login_bad_2fa_event_entry(user_id: u64) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::UnsuccessfulLoginBad2Fa, user_id)
}

/// User logged out
#[must_use]
pub fn build_logout_event_entry(user_id: u64) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::Logout, user_id)
}

/// Cookie secret rotated by `user_id`
#[must_use]
pub fn build_cycle_cookie_secret_event_entry(user_id: u64) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::CycleCookieSecret, user_id)
}

/// `banned_by` banned `user_id`
#[must_use]
pub fn build_user_ban_event_entry(
    banned_by: u64,
    user_id: u64,
    reason: &str,
) -> AuditLogEntryCreationInput {
    user_event(AuditLogEventType::UserBanned, user_id)
        .with(PERFORMED_BY, banned_by)
        .with(REASON, reason)
}

/// `terminated_by` terminated `household_id`
#[must_use]
pub fn build_household_termination_event_entry(
    terminated_by: u64,
    household_id: u64,
    reason: &str,
) -> AuditLogEntryCreationInput {
    AuditLogEntryCreationInput::new(AuditLogEventType::HouseholdTerminated)
        .with(HOUSEHOLD_ID, household_id)
        .with(PERFORMED_BY, terminated_by)
        .with(REASON, reason)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use larder_core::models::{Invitation, ValidInstrument};

    use super::*;
    use crate::querier::InvitationArchiveKey;

    fn instrument() -> ValidInstrument {
        ValidInstrument {
            id: 12,
            external_id: String::new(),
            name: "whisk".to_owned(),
            variant: String::new(),
            description: String::new(),
            icon_path: String::new(),
            created_on: 1000,
            last_updated_on: None,
            archived_on: None,
        }
    }

    #[test]
    fn creation_entry_embeds_the_record() {
        let entry = build_entity_creation_event_entry(&instrument(), 7);
        assert_eq!(entry.event_type.to_string(), "valid-instrument-created");
        assert_eq!(entry.context["valid_instrument_id"], Value::from(12));
        assert_eq!(entry.context[PERFORMED_BY], Value::from(7));
        assert_eq!(entry.context[CREATION_ASSIGNMENT]["name"], Value::from("whisk"));
    }

    #[test]
    fn update_entry_lists_changes() {
        let changes = vec![FieldChangeSummary::new("name", "whisk", "balloon whisk")];
        let entry = build_entity_update_event_entry::<ValidInstrument>(12, 7, &changes);
        assert_eq!(entry.event_type.to_string(), "valid-instrument-updated");
        assert_eq!(entry.context[CHANGES][0]["field_name"], Value::from("name"));
    }

    #[test]
    fn archive_entry_carries_every_key_id() {
        let key = InvitationArchiveKey {
            invitation_id: 9,
            account_id: 5,
        };
        let entry = build_entity_archive_event_entry::<Invitation>(&key, 7);
        assert_eq!(entry.event_type.to_string(), "invitation-archived");
        assert_eq!(entry.context["invitation_id"], Value::from(9));
        assert_eq!(entry.context["account_id"], Value::from(5));
        assert_eq!(entry.context[PERFORMED_BY], Value::from(7));
    }

    #[test]
    fn ban_entry_records_reason() {
        let entry = build_user_ban_event_entry(1, 2, "spam");
        assert_eq!(entry.event_type, AuditLogEventType::UserBanned);
        assert_eq!(entry.context[USER_ID], Value::from(2));
        assert_eq!(entry.context[REASON], Value::from("spam"));
    }

    #[test]
    fn unserializable_context_values_become_null() {
        let mut keyed_by_bytes = BTreeMap::new();
        keyed_by_bytes.insert(vec![1_u8, 2], "basil");
        assert_eq!(context_value(CHANGES, &keyed_by_bytes), Value::Null);
        assert_eq!(context_value(CHANGES, &[1, 2]), Value::from(vec![1, 2]));
    }
}

// ABOUTME: Integration tests for transactional writes with bundled audit log entries
// ABOUTME: Validates begin/write/audit/commit ordering, rollback on failure, and argument validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::fmt::Debug;

use common::{api_client_input, id_row, invitation, Harness, FIXED_NOW};
use larder::config::{IdStrategy, QuerierConfig};
use larder::context::QueryContext;
use larder::database::{ExecResult, TransactionGuard};
use larder::database_plugins::mock::MockCall;
use larder::database_plugins::MockDatabase;
use larder::larder_core::errors::DatabaseError;
use larder::larder_core::models::{
    ApiClient, AuditAction, AuditLogEventType, AuditResource, FieldChangeSummary, Invitation,
    ValidPreparation, ValidPreparationCreationInput,
};
use larder::querier::{ApiClientDataManager, InvitationDataManager, ValidPreparationDataManager};
use larder::querybuilding::mock::{methods, BuilderArg};
use serde_json::json;

fn input_arg(input: &impl Debug) -> BuilderArg {
    BuilderArg::Input(format!("{input:?}"))
}

#[tokio::test]
async fn test_create_api_client_commits_record_with_audit_entry() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let input = api_client_input();

    let create = h
        .builder
        .expect_entity::<ApiClient>(methods::CREATE, vec![input_arg(&input)]);
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_query(&create, vec![id_row(123)])
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    let created = h
        .querier
        .create_api_client(&ctx, Some(&input), 7)
        .await
        .unwrap();

    assert_eq!(created.id, 123);
    assert_eq!(created.name, "x");
    assert_eq!(created.client_id, "c");
    assert_eq!(created.client_secret, input.client_secret);
    assert_eq!(created.belongs_to_user, 42);
    assert_eq!(created.created_on, FIXED_NOW);

    let entries = h.builder.audit_entries_created();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].event_type,
        AuditLogEventType::resource(AuditResource::ApiClient, AuditAction::Created)
    );
    assert_eq!(entries[0].context["api_client_id"], json!(123));
    assert_eq!(entries[0].context["performed_by"], json!(7));
    assert_eq!(entries[0].context["created"]["name"], json!("x"));
    assert!(entries[0].context["created"].get("client_secret").is_none());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_create_api_client_rolls_back_when_audit_write_fails() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let input = api_client_input();

    let create = h
        .builder
        .expect_entity::<ApiClient>(methods::CREATE, vec![input_arg(&input)]);
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_query(&create, vec![id_row(123)])
        .expect_exec_error(&audit, DatabaseError::execute("audit table locked"))
        .expect_rollback();

    let err = h
        .querier
        .create_api_client(&ctx, Some(&input), 7)
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .starts_with("writing API client creation audit log entry"));
    assert!(!h.db.calls().contains(&MockCall::Commit));
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_archive_invitation_writes_archive_audit_entry() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let archive = h.builder.expect_entity::<Invitation>(
        methods::ARCHIVE,
        vec![BuilderArg::Id(9), BuilderArg::Id(5)],
    );
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(&archive, ExecResult::default())
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    h.querier.archive_invitation(&ctx, 9, 5, 7).await.unwrap();

    let entries = h.builder.audit_entries_created();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].event_type,
        AuditLogEventType::resource(AuditResource::Invitation, AuditAction::Archived)
    );
    assert_eq!(entries[0].context["invitation_id"], json!(9));
    assert_eq!(entries[0].context["account_id"], json!(5));
    assert_eq!(entries[0].context["performed_by"], json!(7));
    assert_eq!(
        h.db.calls(),
        vec![
            MockCall::Begin,
            MockCall::Exec(archive),
            MockCall::Exec(audit),
            MockCall::Commit
        ]
    );
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_update_records_field_changes_in_audit_entry() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let mut updated = invitation(9);
    updated.consumed = true;
    let changes = vec![FieldChangeSummary::new("consumed", false, true)];

    let update = h
        .builder
        .expect_entity::<Invitation>(methods::UPDATE, vec![input_arg(&updated)]);
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(&update, ExecResult::default())
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    h.querier
        .update_invitation(&ctx, Some(&updated), 7, &changes)
        .await
        .unwrap();

    let entries = h.builder.audit_entries_created();
    assert_eq!(
        entries[0].event_type,
        AuditLogEventType::resource(AuditResource::Invitation, AuditAction::Updated)
    );
    assert_eq!(entries[0].context["invitation_id"], json!(9));
    assert_eq!(
        entries[0].context["changes"],
        json!([{"field_name": "consumed", "old_value": false, "new_value": true}])
    );
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_write_failure_rolls_back_without_audit_entry() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let input = api_client_input();

    let create = h
        .builder
        .expect_entity::<ApiClient>(methods::CREATE, vec![input_arg(&input)]);
    h.db.expect_begin()
        .expect_query_error(&create, DatabaseError::execute("duplicate client_id"))
        .expect_rollback();

    let err = h
        .querier
        .create_api_client(&ctx, Some(&input), 7)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("creating API client"));
    assert!(h.builder.audit_entries_created().is_empty());
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_rollback_failure_does_not_mask_original_error() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let archive = h.builder.expect_entity::<Invitation>(
        methods::ARCHIVE,
        vec![BuilderArg::Id(9), BuilderArg::Id(5)],
    );
    h.db.expect_begin()
        .expect_exec_error(&archive, DatabaseError::execute("row locked"))
        .expect_rollback_error(DatabaseError::execute("connection lost"));

    let err = h.querier.archive_invitation(&ctx, 9, 5, 7).await.unwrap_err();

    assert!(err.to_string().starts_with("archiving invitation"));
    match err.root_cause() {
        DatabaseError::Execute { context, .. } => assert_eq!(context, "row locked"),
        other => panic!("unexpected root cause {other:?}"),
    }
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_commit_failure_is_not_followed_by_rollback() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let archive = h.builder.expect_entity::<Invitation>(
        methods::ARCHIVE,
        vec![BuilderArg::Id(9), BuilderArg::Id(5)],
    );
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(&archive, ExecResult::default())
        .expect_exec(&audit, ExecResult::default())
        .expect_commit_error(DatabaseError::execute("serialization failure"));

    let err = h.querier.archive_invitation(&ctx, 9, 5, 7).await.unwrap_err();

    assert!(err
        .to_string()
        .starts_with("committing invitation archive transaction"));
    assert!(!h.db.calls().contains(&MockCall::Rollback));
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_begin_failure_issues_no_statements() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let input = api_client_input();

    h.builder
        .expect_entity::<ApiClient>(methods::CREATE, vec![input_arg(&input)]);
    h.db.expect_begin_error(DatabaseError::execute("pool timed out"));

    let err = h
        .querier
        .create_api_client(&ctx, Some(&input), 7)
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("beginning transaction"));
    assert_eq!(h.db.statement_count(), 0);
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_create_rejects_missing_input_before_any_work() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let err = h.querier.create_api_client(&ctx, None, 7).await.unwrap_err();

    assert!(matches!(err, DatabaseError::NilInput { .. }));
    assert!(h.builder.calls().is_empty());
    assert!(h.db.calls().is_empty());
}

#[tokio::test]
async fn test_write_paths_reject_zero_actor() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let input = api_client_input();

    let err = h
        .querier
        .create_api_client(&ctx, Some(&input), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "created_by" }));

    let err = h
        .querier
        .update_invitation(&ctx, Some(&invitation(9)), 0, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "changed_by" }));

    let err = h.querier.archive_invitation(&ctx, 9, 5, 0).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "archived_by" }));

    assert!(h.db.calls().is_empty());
}

#[tokio::test]
async fn test_update_rejects_missing_record() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let err = h
        .querier
        .update_invitation(&ctx, None, 7, &[])
        .await
        .unwrap_err();

    assert!(err.is_nil_input());
    assert!(h.db.calls().is_empty());
}

#[tokio::test]
async fn test_archive_validates_ids_left_to_right() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let err = h.querier.archive_invitation(&ctx, 0, 0, 0).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "invitation_id" }));

    let err = h.querier.archive_invitation(&ctx, 9, 0, 0).await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "account_id" }));

    assert!(h.builder.calls().is_empty());
    assert!(h.db.calls().is_empty());
}

#[tokio::test]
async fn test_last_insert_id_strategy_reads_driver_id() {
    let db = MockDatabase::new();
    let config = QuerierConfig {
        id_strategy: IdStrategy::LastInsertId,
        ..QuerierConfig::default()
    };
    let h = Harness::with(db, config);
    let ctx = QueryContext::new();
    let input = ValidPreparationCreationInput {
        name: "dice".to_owned(),
        description: "small cubes".to_owned(),
        icon_path: String::new(),
    };

    let create = h
        .builder
        .expect_entity::<ValidPreparation>(methods::CREATE, vec![input_arg(&input)]);
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(
            &create,
            ExecResult {
                rows_affected: 1,
                last_insert_id: Some(55),
            },
        )
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    let created = h
        .querier
        .create_valid_preparation(&ctx, Some(&input), 7)
        .await
        .unwrap();

    assert_eq!(created.id, 55);
    assert_eq!(created.name, "dice");
    assert_eq!(created.created_on, FIXED_NOW);
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_cancelled_context_stops_before_begin() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    ctx.cancel();
    let input = api_client_input();

    h.builder
        .expect_entity::<ApiClient>(methods::CREATE, vec![input_arg(&input)]);

    let err = h
        .querier
        .create_api_client(&ctx, Some(&input), 7)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(h.db.calls().is_empty());
    h.builder.assert_expectations_met();
}

#[tokio::test]
async fn test_archive_audit_failure_rolls_back_with_entity_label() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let archive = h
        .builder
        .expect_entity::<ValidPreparation>(methods::ARCHIVE, vec![BuilderArg::Id(6)]);
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(&archive, ExecResult::default())
        .expect_exec_error(&audit, DatabaseError::execute("audit table locked"))
        .expect_rollback();

    let err = h
        .querier
        .archive_valid_preparation(&ctx, 6, 7)
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .starts_with("writing valid preparation archive audit log entry"));
    assert!(matches!(err.root_cause(), DatabaseError::Execute { .. }));
    assert_eq!(
        h.db.calls(),
        vec![
            MockCall::Begin,
            MockCall::Exec(archive),
            MockCall::Exec(audit),
            MockCall::Rollback,
        ]
    );
    assert_eq!(
        h.builder.audit_entries_created()[0].event_type.to_string(),
        "valid-preparation-archived"
    );
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_commit_after_cancellation_rolls_back() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    h.db.expect_begin().expect_rollback();

    let guard = TransactionGuard::begin(&ctx, &h.db).await.unwrap();
    ctx.cancel();
    let err = guard.commit(&ctx).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(h.db.calls(), vec![MockCall::Begin, MockCall::Rollback]);
    h.assert_expectations_met();
}

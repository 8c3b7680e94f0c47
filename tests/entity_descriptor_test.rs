// ABOUTME: Per-entity descriptor tests: row scanning, key validation order, and audit labelling
// ABOUTME: Every entity's get path is exercised against fixture rows in its select column order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    api_client, api_client_columns, id_row, invitation, invitation_columns, recipe_step_product,
    recipe_step_product_columns, report, report_columns, row, valid_ingredient,
    valid_ingredient_columns, valid_ingredient_preparation, valid_ingredient_preparation_columns,
    valid_instrument, valid_instrument_columns, valid_preparation, valid_preparation_columns,
    valid_preparation_instrument, valid_preparation_instrument_columns, Harness,
};
use larder::context::QueryContext;
use larder::database::{ExecResult, SqlValue};
use larder::larder_core::errors::DatabaseError;
use larder::larder_core::models::{
    ApiClient, AuditAction, AuditLogEventType, AuditResource, Invitation, RecipeStepProduct,
    Report, ReportCreationInput, ValidIngredient, ValidIngredientPreparation, ValidInstrument,
    ValidPreparation, ValidPreparationInstrument,
};
use larder::querier::{
    ApiClientDataManager, Entity, IdSet, InvitationDataManager, RecipeStepProductDataManager,
    RecipeStepProductKey, ReportDataManager, ValidIngredientDataManager,
    ValidIngredientPreparationDataManager, ValidInstrumentDataManager,
    ValidPreparationDataManager, ValidPreparationInstrumentDataManager,
};
use larder::querybuilding::mock::{methods, BuilderArg};
use serde_json::json;

/// Script one get call on `E` with `ids` returning `columns`
fn script_get<E: Entity>(h: &Harness, ids: &[u64], columns: Vec<SqlValue>) {
    let args = ids.iter().copied().map(BuilderArg::Id).collect();
    let query = h.builder.expect_entity::<E>(methods::GET, args);
    h.db.expect_query(&query, vec![row(columns)]);
}

#[tokio::test]
async fn test_every_entity_scans_its_columns() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    script_get::<ApiClient>(&h, &[1, 42], api_client_columns(&api_client(1)));
    script_get::<Invitation>(&h, &[2], invitation_columns(&invitation(2)));
    script_get::<Report>(&h, &[3], report_columns(&report(3)));
    script_get::<ValidIngredient>(&h, &[4], valid_ingredient_columns(&valid_ingredient(4)));
    script_get::<ValidInstrument>(&h, &[5], valid_instrument_columns(&valid_instrument(5)));
    script_get::<ValidPreparation>(&h, &[6], valid_preparation_columns(&valid_preparation(6)));
    script_get::<ValidIngredientPreparation>(
        &h,
        &[7],
        valid_ingredient_preparation_columns(&valid_ingredient_preparation(7)),
    );
    script_get::<ValidPreparationInstrument>(
        &h,
        &[8],
        valid_preparation_instrument_columns(&valid_preparation_instrument(8)),
    );
    script_get::<RecipeStepProduct>(
        &h,
        &[1, 3, 9],
        recipe_step_product_columns(&recipe_step_product(9)),
    );

    let q = &h.querier;
    assert_eq!(
        q.get_api_client_by_database_id(&ctx, 1, 42).await.unwrap(),
        api_client(1)
    );
    assert_eq!(q.get_invitation(&ctx, 2).await.unwrap(), invitation(2));
    assert_eq!(q.get_report(&ctx, 3).await.unwrap(), report(3));
    assert_eq!(
        q.get_valid_ingredient(&ctx, 4).await.unwrap(),
        valid_ingredient(4)
    );
    assert_eq!(
        q.get_valid_instrument(&ctx, 5).await.unwrap(),
        valid_instrument(5)
    );
    assert_eq!(
        q.get_valid_preparation(&ctx, 6).await.unwrap(),
        valid_preparation(6)
    );
    assert_eq!(
        q.get_valid_ingredient_preparation(&ctx, 7).await.unwrap(),
        valid_ingredient_preparation(7)
    );
    assert_eq!(
        q.get_valid_preparation_instrument(&ctx, 8).await.unwrap(),
        valid_preparation_instrument(8)
    );
    assert_eq!(
        q.get_recipe_step_product(&ctx, 1, 3, 9).await.unwrap(),
        recipe_step_product(9)
    );
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_column_type_mismatch_is_a_scan_error() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let mut columns = invitation_columns(&invitation(2));
    columns[3] = SqlValue::from("not a bool");
    script_get::<Invitation>(&h, &[2], columns);

    let err = h.querier.get_invitation(&ctx, 2).await.unwrap_err();

    assert!(err.to_string().starts_with("scanning invitation"));
    assert!(matches!(err.root_cause(), DatabaseError::Scan { .. }));
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_recipe_step_product_exists_validates_each_id_position() {
    let h = Harness::new();
    let ctx = QueryContext::new();

    let err = h
        .querier
        .recipe_step_product_exists(&ctx, 0, 1, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "recipe_id" }));

    let err = h
        .querier
        .recipe_step_product_exists(&ctx, 1, 0, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidId { field: "recipe_step_id" }));

    let err = h
        .querier
        .recipe_step_product_exists(&ctx, 1, 1, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::InvalidId {
            field: "recipe_step_product_id"
        }
    ));

    assert!(h.builder.calls().is_empty());
    assert_eq!(h.db.statement_count(), 0);
}

#[test]
fn test_key_ids_keep_declaration_order() {
    let key = RecipeStepProductKey {
        recipe_id: 1,
        recipe_step_id: 3,
        recipe_step_product_id: 9,
    };
    assert_eq!(
        key.ids(),
        vec![
            ("recipe_id", 1),
            ("recipe_step_id", 3),
            ("recipe_step_product_id", 9)
        ]
    );
    assert!(key.validate().is_ok());
}

#[tokio::test]
async fn test_recipe_step_product_archive_audits_both_ids() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let archive = h.builder.expect_entity::<RecipeStepProduct>(
        methods::ARCHIVE,
        vec![BuilderArg::Id(3), BuilderArg::Id(9)],
    );
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(&archive, ExecResult::default())
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    h.querier
        .archive_recipe_step_product(&ctx, 3, 9, 7)
        .await
        .unwrap();

    let entries = h.builder.audit_entries_created();
    let entry = &entries[0];
    assert_eq!(
        entry.event_type,
        AuditLogEventType::resource(AuditResource::RecipeStepProduct, AuditAction::Archived)
    );
    assert_eq!(entry.context["recipe_step_id"], json!(3));
    assert_eq!(entry.context["recipe_step_product_id"], json!(9));
    assert_eq!(entry.context["performed_by"], json!(7));
    h.assert_expectations_met();
}

#[tokio::test]
async fn test_single_key_archive_audits_resource_id() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let archive = h
        .builder
        .expect_entity::<ValidIngredient>(methods::ARCHIVE, vec![BuilderArg::Id(4)]);
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_exec(&archive, ExecResult::default())
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    h.querier.archive_valid_ingredient(&ctx, 4, 7).await.unwrap();

    let entries = h.builder.audit_entries_created();
    let entry = &entries[0];
    assert_eq!(entry.event_type.to_string(), "valid-ingredient-archived");
    assert_eq!(entry.context["valid_ingredient_id"], json!(4));
    h.assert_expectations_met();
}

#[test]
fn test_entity_labels_and_audit_resources() {
    assert_eq!(ApiClient::NAME, "API client");
    assert_eq!(Invitation::NAME, "invitation");
    assert_eq!(Report::NAME, "report");
    assert_eq!(ValidIngredient::NAME, "valid ingredient");
    assert_eq!(ValidInstrument::NAME, "valid instrument");
    assert_eq!(ValidPreparation::NAME, "valid preparation");
    assert_eq!(
        ValidIngredientPreparation::NAME,
        "valid ingredient preparation"
    );
    assert_eq!(
        ValidPreparationInstrument::NAME,
        "valid preparation instrument"
    );
    assert_eq!(RecipeStepProduct::NAME, "recipe step product");

    let created = |resource| AuditLogEventType::resource(resource, AuditAction::Created).to_string();
    assert_eq!(created(ApiClient::RESOURCE), "api-client-created");
    assert_eq!(created(Invitation::RESOURCE), "invitation-created");
    assert_eq!(created(Report::RESOURCE), "report-created");
    assert_eq!(created(ValidIngredient::RESOURCE), "valid-ingredient-created");
    assert_eq!(created(ValidInstrument::RESOURCE), "valid-instrument-created");
    assert_eq!(created(ValidPreparation::RESOURCE), "valid-preparation-created");
    assert_eq!(
        created(ValidIngredientPreparation::RESOURCE),
        "valid-ingredient-preparation-created"
    );
    assert_eq!(
        created(ValidPreparationInstrument::RESOURCE),
        "valid-preparation-instrument-created"
    );
    assert_eq!(
        created(RecipeStepProduct::RESOURCE),
        "recipe-step-product-created"
    );

    assert_eq!(
        AuditLogEventType::resource(Report::RESOURCE, AuditAction::Updated).to_string(),
        "report-updated"
    );
}

#[tokio::test]
async fn test_creation_keeps_owner_from_input() {
    let h = Harness::new();
    let ctx = QueryContext::new();
    let input = ReportCreationInput {
        report_type: "recipe".to_owned(),
        concern: "spam".to_owned(),
        belongs_to_account: 5,
    };
    let create = h.builder.expect_entity::<Report>(
        methods::CREATE,
        vec![BuilderArg::Input(format!("{input:?}"))],
    );
    let audit = h.builder.expect_audit_log_entry_creation();
    h.db.expect_begin()
        .expect_query(&create, vec![id_row(77)])
        .expect_exec(&audit, ExecResult::default())
        .expect_commit();

    let created = h
        .querier
        .create_report(&ctx, Some(&input), 7)
        .await
        .unwrap();

    assert_eq!(created.id, 77);
    assert_eq!(created.belongs_to_account, 5);
    assert_eq!(created.report_type, "recipe");
    assert_eq!(
        h.builder.audit_entries_created()[0].context["report_id"],
        json!(77)
    );
    h.assert_expectations_met();
}

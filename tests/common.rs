// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, a mock-backed querier harness, and entity row fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `larder`
//!
//! Each test builds a [`Harness`]: a `SqlQuerier` over a scripted
//! `MockDatabase` and a recording `MockSqlQueryBuilder`, with the clock pinned
//! to [`FIXED_NOW`]. Row helpers turn fixture records into the column order
//! the querier scans.

use std::env;
use std::sync::{Arc, Once};

use larder::config::QuerierConfig;
use larder::database::{Row, SqlValue};
use larder::database_plugins::MockDatabase;
use larder::larder_core::models::{
    ApiClient, ApiClientCreationInput, Invitation, RecipeStepProduct, Report, ValidIngredient,
    ValidIngredientPreparation, ValidInstrument, ValidPreparation, ValidPreparationInstrument,
};
use larder::querier::SqlQuerier;
use larder::querybuilding::mock::MockSqlQueryBuilder;
use tracing::Level;

/// Unix time every harness clock reports
pub const FIXED_NOW: u64 = 1_000;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// A querier wired to a scripted database and a recording builder
pub struct Harness {
    pub db: MockDatabase,
    pub builder: Arc<MockSqlQueryBuilder>,
    pub querier: SqlQuerier,
}

impl Harness {
    /// Harness expecting database calls in registration order
    pub fn new() -> Self {
        Self::with(MockDatabase::new(), QuerierConfig::default())
    }

    /// Harness accepting database calls in any order
    pub fn unordered() -> Self {
        Self::with(MockDatabase::unordered(), QuerierConfig::default())
    }

    /// Harness over a prepared mock and querier settings
    pub fn with(db: MockDatabase, config: QuerierConfig) -> Self {
        init_test_logging();
        let builder = Arc::new(MockSqlQueryBuilder::new());
        let querier = SqlQuerier::new(Arc::new(db.clone()), builder.clone(), config)
            .with_clock(Arc::new(|| FIXED_NOW));
        Self {
            db,
            builder,
            querier,
        }
    }

    /// Assert both the database script and builder expectations were consumed
    pub fn assert_expectations_met(&self) {
        self.db.assert_expectations_met();
        self.builder.assert_expectations_met();
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// A row from column values
pub fn row(values: Vec<SqlValue>) -> Row {
    Row::new(values)
}

/// A list row: record columns followed by filtered and total counts
pub fn row_with_counts(mut values: Vec<SqlValue>, filtered: u64, total: u64) -> Row {
    values.push(SqlValue::from(filtered));
    values.push(SqlValue::from(total));
    Row::new(values)
}

/// A single-column id row, as returned by `RETURNING id`
pub fn id_row(id: u64) -> Row {
    Row::new(vec![SqlValue::from(id)])
}

/// A single-column count row
pub fn count_row(count: u64) -> Row {
    Row::new(vec![SqlValue::from(count)])
}

/// A single-column boolean row
pub fn bool_row(value: bool) -> Row {
    Row::new(vec![SqlValue::Bool(value)])
}

fn text(value: &str) -> SqlValue {
    SqlValue::from(value)
}

pub fn api_client_input() -> ApiClientCreationInput {
    ApiClientCreationInput {
        name: "x".to_owned(),
        client_id: "c".to_owned(),
        client_secret: b"s3cr3t".to_vec(),
        belongs_to_user: 42,
    }
}

pub fn api_client(id: u64) -> ApiClient {
    ApiClient {
        id,
        external_id: format!("api-client-{id}"),
        name: format!("client {id}"),
        client_id: format!("client-id-{id}"),
        client_secret: b"s3cr3t".to_vec(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
        belongs_to_user: 42,
    }
}

pub fn api_client_columns(client: &ApiClient) -> Vec<SqlValue> {
    vec![
        SqlValue::from(client.id),
        text(&client.external_id),
        text(&client.name),
        text(&client.client_id),
        SqlValue::from(client.client_secret.clone()),
        SqlValue::from(client.created_on),
        SqlValue::from(client.last_updated_on),
        SqlValue::from(client.archived_on),
        SqlValue::from(client.belongs_to_user),
    ]
}

pub fn invitation(id: u64) -> Invitation {
    Invitation {
        id,
        external_id: format!("invitation-{id}"),
        code: format!("code-{id}"),
        consumed: false,
        created_on: 500,
        last_updated_on: Some(600),
        archived_on: None,
        belongs_to_account: 5,
    }
}

pub fn invitation_columns(invitation: &Invitation) -> Vec<SqlValue> {
    vec![
        SqlValue::from(invitation.id),
        text(&invitation.external_id),
        text(&invitation.code),
        SqlValue::Bool(invitation.consumed),
        SqlValue::from(invitation.created_on),
        SqlValue::from(invitation.last_updated_on),
        SqlValue::from(invitation.archived_on),
        SqlValue::from(invitation.belongs_to_account),
    ]
}

pub fn report(id: u64) -> Report {
    Report {
        id,
        external_id: format!("report-{id}"),
        report_type: "recipe".to_owned(),
        concern: "spam".to_owned(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
        belongs_to_account: 5,
    }
}

pub fn report_columns(report: &Report) -> Vec<SqlValue> {
    vec![
        SqlValue::from(report.id),
        text(&report.external_id),
        text(&report.report_type),
        text(&report.concern),
        SqlValue::from(report.created_on),
        SqlValue::from(report.last_updated_on),
        SqlValue::from(report.archived_on),
        SqlValue::from(report.belongs_to_account),
    ]
}

pub fn valid_ingredient(id: u64) -> ValidIngredient {
    ValidIngredient {
        id,
        external_id: format!("valid-ingredient-{id}"),
        name: format!("ingredient {id}"),
        variant: String::new(),
        description: "pantry staple".to_owned(),
        warning: String::new(),
        contains_egg: false,
        contains_dairy: true,
        contains_peanut: false,
        contains_tree_nut: false,
        contains_soy: false,
        contains_wheat: true,
        contains_shellfish: false,
        contains_sesame: false,
        contains_fish: false,
        contains_gluten: true,
        animal_flesh: false,
        animal_derived: true,
        volumetric: false,
        icon_path: "icons/ingredient.svg".to_owned(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
    }
}

pub fn valid_ingredient_columns(ingredient: &ValidIngredient) -> Vec<SqlValue> {
    vec![
        SqlValue::from(ingredient.id),
        text(&ingredient.external_id),
        text(&ingredient.name),
        text(&ingredient.variant),
        text(&ingredient.description),
        text(&ingredient.warning),
        SqlValue::Bool(ingredient.contains_egg),
        SqlValue::Bool(ingredient.contains_dairy),
        SqlValue::Bool(ingredient.contains_peanut),
        SqlValue::Bool(ingredient.contains_tree_nut),
        SqlValue::Bool(ingredient.contains_soy),
        SqlValue::Bool(ingredient.contains_wheat),
        SqlValue::Bool(ingredient.contains_shellfish),
        SqlValue::Bool(ingredient.contains_sesame),
        SqlValue::Bool(ingredient.contains_fish),
        SqlValue::Bool(ingredient.contains_gluten),
        SqlValue::Bool(ingredient.animal_flesh),
        SqlValue::Bool(ingredient.animal_derived),
        SqlValue::Bool(ingredient.volumetric),
        text(&ingredient.icon_path),
        SqlValue::from(ingredient.created_on),
        SqlValue::from(ingredient.last_updated_on),
        SqlValue::from(ingredient.archived_on),
    ]
}

pub fn valid_instrument(id: u64) -> ValidInstrument {
    ValidInstrument {
        id,
        external_id: format!("valid-instrument-{id}"),
        name: format!("instrument {id}"),
        variant: "stainless".to_owned(),
        description: "kitchen tool".to_owned(),
        icon_path: "icons/instrument.svg".to_owned(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
    }
}

pub fn valid_instrument_columns(instrument: &ValidInstrument) -> Vec<SqlValue> {
    vec![
        SqlValue::from(instrument.id),
        text(&instrument.external_id),
        text(&instrument.name),
        text(&instrument.variant),
        text(&instrument.description),
        text(&instrument.icon_path),
        SqlValue::from(instrument.created_on),
        SqlValue::from(instrument.last_updated_on),
        SqlValue::from(instrument.archived_on),
    ]
}

pub fn valid_preparation(id: u64) -> ValidPreparation {
    ValidPreparation {
        id,
        external_id: format!("valid-preparation-{id}"),
        name: format!("preparation {id}"),
        description: "cut into pieces".to_owned(),
        icon_path: "icons/preparation.svg".to_owned(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
    }
}

pub fn valid_preparation_columns(preparation: &ValidPreparation) -> Vec<SqlValue> {
    vec![
        SqlValue::from(preparation.id),
        text(&preparation.external_id),
        text(&preparation.name),
        text(&preparation.description),
        text(&preparation.icon_path),
        SqlValue::from(preparation.created_on),
        SqlValue::from(preparation.last_updated_on),
        SqlValue::from(preparation.archived_on),
    ]
}

pub fn valid_ingredient_preparation(id: u64) -> ValidIngredientPreparation {
    ValidIngredientPreparation {
        id,
        external_id: format!("valid-ingredient-preparation-{id}"),
        notes: "finely".to_owned(),
        valid_ingredient_id: 11,
        valid_preparation_id: 12,
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
    }
}

pub fn valid_ingredient_preparation_columns(record: &ValidIngredientPreparation) -> Vec<SqlValue> {
    vec![
        SqlValue::from(record.id),
        text(&record.external_id),
        text(&record.notes),
        SqlValue::from(record.valid_ingredient_id),
        SqlValue::from(record.valid_preparation_id),
        SqlValue::from(record.created_on),
        SqlValue::from(record.last_updated_on),
        SqlValue::from(record.archived_on),
    ]
}

pub fn valid_preparation_instrument(id: u64) -> ValidPreparationInstrument {
    ValidPreparationInstrument {
        id,
        external_id: format!("valid-preparation-instrument-{id}"),
        valid_instrument_id: 21,
        valid_preparation_id: 12,
        notes: "sharp".to_owned(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
    }
}

pub fn valid_preparation_instrument_columns(record: &ValidPreparationInstrument) -> Vec<SqlValue> {
    vec![
        SqlValue::from(record.id),
        text(&record.external_id),
        SqlValue::from(record.valid_instrument_id),
        SqlValue::from(record.valid_preparation_id),
        text(&record.notes),
        SqlValue::from(record.created_on),
        SqlValue::from(record.last_updated_on),
        SqlValue::from(record.archived_on),
    ]
}

pub fn recipe_step_product(id: u64) -> RecipeStepProduct {
    RecipeStepProduct {
        id,
        external_id: format!("recipe-step-product-{id}"),
        name: "dough".to_owned(),
        quantity_type: "grams".to_owned(),
        quantity_value: 250.5,
        quantity_notes: String::new(),
        created_on: 500,
        last_updated_on: None,
        archived_on: None,
        belongs_to_recipe_step: 3,
    }
}

pub fn recipe_step_product_columns(product: &RecipeStepProduct) -> Vec<SqlValue> {
    vec![
        SqlValue::from(product.id),
        text(&product.external_id),
        text(&product.name),
        text(&product.quantity_type),
        SqlValue::Float(product.quantity_value),
        text(&product.quantity_notes),
        SqlValue::from(product.created_on),
        SqlValue::from(product.last_updated_on),
        SqlValue::from(product.archived_on),
        SqlValue::from(product.belongs_to_recipe_step),
    ]
}

// ABOUTME: Query-builder collaborator contract consumed by the querier
// ABOUTME: Per-entity builders plus audit log, user, API client lookup, and name search builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Query builders
//!
//! The querier never writes SQL. For every entity and operation it asks a
//! builder for a [`SqlQuery`] and treats the text and arguments as opaque.
//! Builders are pure: no I/O, and safe to share across tasks.
//!
//! Key, scope, and owner arguments are the entity descriptor's id sets (see
//! [`Entity`]), already validated by the time a builder sees them.

use larder_core::models::{
    ApiClient, AuditLogEntryCreationInput, Invitation, RecipeStepProduct, Report,
    UserReputationUpdateInput, ValidIngredient, ValidIngredientPreparation, ValidInstrument,
    ValidPreparation, ValidPreparationInstrument,
};
use larder_core::pagination::QueryFilter;

use crate::database::SqlQuery;
use crate::querier::Entity;

/// Recording builder for tests
pub mod mock;

/// The ten CRUD queries of one entity
pub trait EntitySqlQueryBuilder<E: Entity>: Send + Sync {
    /// `SELECT EXISTS (...)` for the keyed row, excluding archived rows
    fn build_exists_query(&self, key: &E::Key) -> SqlQuery;

    /// Select the keyed row
    fn build_get_query(&self, key: &E::Key) -> SqlQuery;

    /// Count non-archived rows
    fn build_get_all_count_query(&self) -> SqlQuery;

    /// Rows with `begin <= id < end`
    fn build_get_batch_query(&self, begin: u64, end: u64) -> SqlQuery;

    /// Filtered page of rows within `scope`, with trailing filtered and total counts
    fn build_get_list_query(
        &self,
        scope: &E::Scope,
        include_archived: bool,
        filter: Option<&QueryFilter>,
    ) -> SqlQuery;

    /// Rows whose ids are in `ids`, at most `limit` of them
    fn build_get_with_ids_query(&self, owner: &E::Owner, limit: u8, ids: &[u64]) -> SqlQuery;

    /// Insert a new row
    fn build_create_query(&self, input: &E::CreationInput) -> SqlQuery;

    /// Update the row identified by `updated`'s id
    fn build_update_query(&self, updated: &E) -> SqlQuery;

    /// Set `archived_on` on the keyed row
    fn build_archive_query(&self, key: &E::ArchiveKey) -> SqlQuery;

    /// Audit entries recorded for the row with `id`
    fn build_audit_log_entries_query(&self, id: u64) -> SqlQuery;
}

/// Name lookups for the valid-* reference entities
pub trait NameSearchSqlQueryBuilder<E: Entity>: Send + Sync {
    /// Rows whose name matches `name`
    fn build_search_by_name_query(&self, name: &str) -> SqlQuery;

    /// Id of the row named exactly `name`
    fn build_get_id_for_name_query(&self, name: &str) -> SqlQuery;
}

/// Lookups specific to API clients
pub trait ApiClientSqlQueryBuilder: Send + Sync {
    /// Select the API client with the given public client id
    fn build_get_api_client_by_client_id_query(&self, client_id: &str) -> SqlQuery;
}

/// Queries over the audit log table
pub trait AuditLogEntrySqlQueryBuilder: Send + Sync {
    /// Select one entry
    fn build_get_audit_log_entry_query(&self, entry_id: u64) -> SqlQuery;

    /// Count all entries
    fn build_get_all_audit_log_entries_count_query(&self) -> SqlQuery;

    /// Entries with `begin <= id < end`
    fn build_get_batch_of_audit_log_entries_query(&self, begin: u64, end: u64) -> SqlQuery;

    /// Filtered page of entries with trailing filtered and total counts
    fn build_get_audit_log_entries_query(&self, filter: Option<&QueryFilter>) -> SqlQuery;

    /// Insert an entry
    fn build_create_audit_log_entry_query(&self, input: &AuditLogEntryCreationInput) -> SqlQuery;
}

/// Administrative user writes
pub trait UserSqlQueryBuilder: Send + Sync {
    /// Set a user's reputation
    fn build_set_user_reputation_query(&self, input: &UserReputationUpdateInput) -> SqlQuery;
}

/// Aggregate builder handed to the querier
pub trait SqlQueryBuilder: Send + Sync {
    /// API client CRUD
    fn api_clients(&self) -> &dyn EntitySqlQueryBuilder<ApiClient>;
    /// API client lookups
    fn api_client_lookups(&self) -> &dyn ApiClientSqlQueryBuilder;
    /// Invitation CRUD
    fn invitations(&self) -> &dyn EntitySqlQueryBuilder<Invitation>;
    /// Report CRUD
    fn reports(&self) -> &dyn EntitySqlQueryBuilder<Report>;
    /// Valid ingredient CRUD
    fn valid_ingredients(&self) -> &dyn EntitySqlQueryBuilder<ValidIngredient>;
    /// Valid ingredient name lookups
    fn valid_ingredient_names(&self) -> &dyn NameSearchSqlQueryBuilder<ValidIngredient>;
    /// Valid instrument CRUD
    fn valid_instruments(&self) -> &dyn EntitySqlQueryBuilder<ValidInstrument>;
    /// Valid instrument name lookups
    fn valid_instrument_names(&self) -> &dyn NameSearchSqlQueryBuilder<ValidInstrument>;
    /// Valid preparation CRUD
    fn valid_preparations(&self) -> &dyn EntitySqlQueryBuilder<ValidPreparation>;
    /// Valid preparation name lookups
    fn valid_preparation_names(&self) -> &dyn NameSearchSqlQueryBuilder<ValidPreparation>;
    /// Valid ingredient preparation CRUD
    fn valid_ingredient_preparations(&self)
        -> &dyn EntitySqlQueryBuilder<ValidIngredientPreparation>;
    /// Valid preparation instrument CRUD
    fn valid_preparation_instruments(&self)
        -> &dyn EntitySqlQueryBuilder<ValidPreparationInstrument>;
    /// Recipe step product CRUD
    fn recipe_step_products(&self) -> &dyn EntitySqlQueryBuilder<RecipeStepProduct>;
    /// Audit log queries
    fn audit_log_entries(&self) -> &dyn AuditLogEntrySqlQueryBuilder;
    /// Administrative user writes
    fn users(&self) -> &dyn UserSqlQueryBuilder;
}

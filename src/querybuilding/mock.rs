// ABOUTME: Recording query builder used by querier unit tests
// ABOUTME: Returns a distinct fake query per expectation and records every call with its arguments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Mock query builder
//!
//! Tests register the calls they expect with [`MockSqlQueryBuilder::expect`],
//! receive the fake [`SqlQuery`] each call will return, and script a
//! `MockDatabase` with those same queries. Every call is recorded so tests can
//! assert on arguments (for example the begin/end of each streaming batch).

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use larder_core::models::{
    ApiClient, AuditLogEntryCreationInput, Invitation, RecipeStepProduct, Report,
    UserReputationUpdateInput, ValidIngredient, ValidIngredientPreparation, ValidInstrument,
    ValidPreparation, ValidPreparationInstrument,
};
use larder_core::pagination::QueryFilter;

use super::{
    ApiClientSqlQueryBuilder, AuditLogEntrySqlQueryBuilder, EntitySqlQueryBuilder,
    NameSearchSqlQueryBuilder, SqlQueryBuilder, UserSqlQueryBuilder,
};
use crate::database::{SqlQuery, SqlValue};
use crate::querier::{Entity, IdSet};

/// Target name used for audit log builder calls
pub const AUDIT_LOG_TARGET: &str = "audit log entry";
/// Target name used for user builder calls
pub const USER_TARGET: &str = "user";

/// Builder method names as recorded in [`BuilderCall::method`]
pub mod methods {
    /// [`EntitySqlQueryBuilder::build_exists_query`](super::EntitySqlQueryBuilder::build_exists_query)
    pub const EXISTS: &str = "build_exists_query";
    /// [`EntitySqlQueryBuilder::build_get_query`](super::EntitySqlQueryBuilder::build_get_query)
    pub const GET: &str = "build_get_query";
    /// [`EntitySqlQueryBuilder::build_get_all_count_query`](super::EntitySqlQueryBuilder::build_get_all_count_query)
    pub const COUNT: &str = "build_get_all_count_query";
    /// [`EntitySqlQueryBuilder::build_get_batch_query`](super::EntitySqlQueryBuilder::build_get_batch_query)
    pub const BATCH: &str = "build_get_batch_query";
    /// [`EntitySqlQueryBuilder::build_get_list_query`](super::EntitySqlQueryBuilder::build_get_list_query)
    pub const LIST: &str = "build_get_list_query";
    /// [`EntitySqlQueryBuilder::build_get_with_ids_query`](super::EntitySqlQueryBuilder::build_get_with_ids_query)
    pub const WITH_IDS: &str = "build_get_with_ids_query";
    /// [`EntitySqlQueryBuilder::build_create_query`](super::EntitySqlQueryBuilder::build_create_query)
    pub const CREATE: &str = "build_create_query";
    /// [`EntitySqlQueryBuilder::build_update_query`](super::EntitySqlQueryBuilder::build_update_query)
    pub const UPDATE: &str = "build_update_query";
    /// [`EntitySqlQueryBuilder::build_archive_query`](super::EntitySqlQueryBuilder::build_archive_query)
    pub const ARCHIVE: &str = "build_archive_query";
    /// [`EntitySqlQueryBuilder::build_audit_log_entries_query`](super::EntitySqlQueryBuilder::build_audit_log_entries_query)
    pub const AUDIT_ENTRIES: &str = "build_audit_log_entries_query";
    /// Name search
    pub const SEARCH_BY_NAME: &str = "build_search_by_name_query";
    /// Id lookup by name
    pub const ID_FOR_NAME: &str = "build_get_id_for_name_query";
    /// API client lookup by public client id
    pub const GET_BY_CLIENT_ID: &str = "build_get_api_client_by_client_id_query";
    /// Single audit entry
    pub const GET_AUDIT_LOG_ENTRY: &str = "build_get_audit_log_entry_query";
    /// Audit entry count
    pub const COUNT_AUDIT_LOG_ENTRIES: &str = "build_get_all_audit_log_entries_count_query";
    /// Audit entry batch
    pub const BATCH_OF_AUDIT_LOG_ENTRIES: &str = "build_get_batch_of_audit_log_entries_query";
    /// Audit entry list
    pub const LIST_AUDIT_LOG_ENTRIES: &str = "build_get_audit_log_entries_query";
    /// Audit entry insert
    pub const CREATE_AUDIT_LOG_ENTRY: &str = "build_create_audit_log_entry_query";
    /// User reputation write
    pub const SET_USER_REPUTATION: &str = "build_set_user_reputation_query";
}

/// One recorded builder argument
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderArg {
    /// An id (key components are recorded one per argument, in order)
    Id(u64),
    /// A list of ids
    Ids(Vec<u64>),
    /// A row limit
    Limit(u8),
    /// The include-archived flag
    IncludeArchived(bool),
    /// A query filter, `None` when the caller passed none
    Filter(Option<QueryFilter>),
    /// A string argument
    Text(String),
    /// A structured input, recorded by its debug rendering
    Input(String),
    /// An audit entry to insert
    AuditEntry(AuditLogEntryCreationInput),
    /// A reputation update
    Reputation(UserReputationUpdateInput),
}

/// A recorded builder call
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderCall {
    /// Entity name or builder target
    pub target: &'static str,
    /// Method name, see [`methods`]
    pub method: &'static str,
    /// Arguments in call order
    pub args: Vec<BuilderArg>,
}

#[derive(Debug)]
struct Expectation {
    target: &'static str,
    method: &'static str,
    args: Option<Vec<BuilderArg>>,
    query: SqlQuery,
    satisfied: bool,
}

impl Expectation {
    fn matches(&self, call: &BuilderCall) -> bool {
        !self.satisfied
            && self.target == call.target
            && self.method == call.method
            && self.args.as_ref().is_none_or(|args| *args == call.args)
    }
}

#[derive(Debug, Default)]
struct BuilderState {
    expectations: Vec<Expectation>,
    calls: Vec<BuilderCall>,
    unexpected: Vec<BuilderCall>,
    issued: u64,
}

/// Query builder that records calls and returns scripted fake queries
#[derive(Debug, Default)]
pub struct MockSqlQueryBuilder {
    state: Mutex<BuilderState>,
}

impl MockSqlQueryBuilder {
    /// Builder with no expectations
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BuilderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(
        &self,
        target: &'static str,
        method: &'static str,
        args: Option<Vec<BuilderArg>>,
    ) -> SqlQuery {
        let mut state = self.lock();
        state.issued += 1;
        let issued = state.issued;
        let query = SqlQuery::new(
            format!("-- fake {target} {method} #{issued}"),
            vec![SqlValue::from(issued)],
        );
        state.expectations.push(Expectation {
            target,
            method,
            args,
            query: query.clone(),
            satisfied: false,
        });
        query
    }

    /// Expect one call with exactly `args`; returns the query it will produce
    pub fn expect(
        &self,
        target: &'static str,
        method: &'static str,
        args: Vec<BuilderArg>,
    ) -> SqlQuery {
        self.register(target, method, Some(args))
    }

    /// Expect one call with any arguments
    pub fn expect_any_args(&self, target: &'static str, method: &'static str) -> SqlQuery {
        self.register(target, method, None)
    }

    /// Expect one call on entity `E`'s builder
    pub fn expect_entity<E: Entity>(&self, method: &'static str, args: Vec<BuilderArg>) -> SqlQuery {
        self.expect(E::NAME, method, args)
    }

    /// Expect one audit entry insert with any contents
    pub fn expect_audit_log_entry_creation(&self) -> SqlQuery {
        self.expect_any_args(AUDIT_LOG_TARGET, methods::CREATE_AUDIT_LOG_ENTRY)
    }

    /// Every call so far, in call order
    #[must_use]
    pub fn calls(&self) -> Vec<BuilderCall> {
        self.lock().calls.clone()
    }

    /// Calls to one method, in call order
    #[must_use]
    pub fn calls_to(&self, method: &str) -> Vec<BuilderCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// Audit entries the querier asked to insert, in call order
    #[must_use]
    pub fn audit_entries_created(&self) -> Vec<AuditLogEntryCreationInput> {
        self.calls_to(methods::CREATE_AUDIT_LOG_ENTRY)
            .into_iter()
            .filter_map(|call| match call.args.into_iter().next() {
                Some(BuilderArg::AuditEntry(entry)) => Some(entry),
                _ => None,
            })
            .collect()
    }

    /// Panic unless every expectation was met and no unexpected call happened
    ///
    /// # Panics
    ///
    /// Panics listing the unmet expectations and unexpected calls
    #[allow(clippy::panic)]
    pub fn assert_expectations_met(&self) {
        let state = self.lock();
        let unmet: Vec<String> = state
            .expectations
            .iter()
            .filter(|e| !e.satisfied)
            .map(|e| format!("{} {} {:?}", e.target, e.method, e.args))
            .collect();
        if !unmet.is_empty() || !state.unexpected.is_empty() {
            panic!(
                "query builder expectations not met\nunmet: {unmet:#?}\nunexpected: {:#?}",
                state.unexpected
            );
        }
    }

    fn record(&self, target: &'static str, method: &'static str, args: Vec<BuilderArg>) -> SqlQuery {
        let call = BuilderCall {
            target,
            method,
            args,
        };
        let mut state = self.lock();
        state.calls.push(call.clone());
        let matched = state
            .expectations
            .iter_mut()
            .find(|expectation| expectation.matches(&call));
        if let Some(expectation) = matched {
            expectation.satisfied = true;
            return expectation.query.clone();
        }
        let query = SqlQuery::unparameterized(format!("-- unexpected {target} {method}"));
        state.unexpected.push(call);
        query
    }
}

fn id_args(ids: &dyn IdSet) -> Vec<BuilderArg> {
    ids.ids()
        .into_iter()
        .map(|(_, value)| BuilderArg::Id(value))
        .collect()
}

fn input_arg(input: &dyn Debug) -> BuilderArg {
    BuilderArg::Input(format!("{input:?}"))
}

impl<E: Entity> EntitySqlQueryBuilder<E> for MockSqlQueryBuilder {
    fn build_exists_query(&self, key: &E::Key) -> SqlQuery {
        self.record(E::NAME, methods::EXISTS, id_args(key))
    }

    fn build_get_query(&self, key: &E::Key) -> SqlQuery {
        self.record(E::NAME, methods::GET, id_args(key))
    }

    fn build_get_all_count_query(&self) -> SqlQuery {
        self.record(E::NAME, methods::COUNT, Vec::new())
    }

    fn build_get_batch_query(&self, begin: u64, end: u64) -> SqlQuery {
        self.record(
            E::NAME,
            methods::BATCH,
            vec![BuilderArg::Id(begin), BuilderArg::Id(end)],
        )
    }

    fn build_get_list_query(
        &self,
        scope: &E::Scope,
        include_archived: bool,
        filter: Option<&QueryFilter>,
    ) -> SqlQuery {
        let mut args = id_args(scope);
        args.push(BuilderArg::IncludeArchived(include_archived));
        args.push(BuilderArg::Filter(filter.cloned()));
        self.record(E::NAME, methods::LIST, args)
    }

    fn build_get_with_ids_query(&self, owner: &E::Owner, limit: u8, ids: &[u64]) -> SqlQuery {
        let mut args = id_args(owner);
        args.push(BuilderArg::Limit(limit));
        args.push(BuilderArg::Ids(ids.to_vec()));
        self.record(E::NAME, methods::WITH_IDS, args)
    }

    fn build_create_query(&self, input: &E::CreationInput) -> SqlQuery {
        self.record(E::NAME, methods::CREATE, vec![input_arg(input)])
    }

    fn build_update_query(&self, updated: &E) -> SqlQuery {
        self.record(E::NAME, methods::UPDATE, vec![input_arg(updated)])
    }

    fn build_archive_query(&self, key: &E::ArchiveKey) -> SqlQuery {
        self.record(E::NAME, methods::ARCHIVE, id_args(key))
    }

    fn build_audit_log_entries_query(&self, id: u64) -> SqlQuery {
        self.record(E::NAME, methods::AUDIT_ENTRIES, vec![BuilderArg::Id(id)])
    }
}

impl<E: Entity> NameSearchSqlQueryBuilder<E> for MockSqlQueryBuilder {
    fn build_search_by_name_query(&self, name: &str) -> SqlQuery {
        self.record(
            E::NAME,
            methods::SEARCH_BY_NAME,
            vec![BuilderArg::Text(name.to_owned())],
        )
    }

    fn build_get_id_for_name_query(&self, name: &str) -> SqlQuery {
        self.record(
            E::NAME,
            methods::ID_FOR_NAME,
            vec![BuilderArg::Text(name.to_owned())],
        )
    }
}

impl ApiClientSqlQueryBuilder for MockSqlQueryBuilder {
    fn build_get_api_client_by_client_id_query(&self, client_id: &str) -> SqlQuery {
        self.record(
            ApiClient::NAME,
            methods::GET_BY_CLIENT_ID,
            vec![BuilderArg::Text(client_id.to_owned())],
        )
    }
}

impl AuditLogEntrySqlQueryBuilder for MockSqlQueryBuilder {
    fn build_get_audit_log_entry_query(&self, entry_id: u64) -> SqlQuery {
        self.record(
            AUDIT_LOG_TARGET,
            methods::GET_AUDIT_LOG_ENTRY,
            vec![BuilderArg::Id(entry_id)],
        )
    }

    fn build_get_all_audit_log_entries_count_query(&self) -> SqlQuery {
        self.record(AUDIT_LOG_TARGET, methods::COUNT_AUDIT_LOG_ENTRIES, Vec::new())
    }

    fn build_get_batch_of_audit_log_entries_query(&self, begin: u64, end: u64) -> SqlQuery {
        self.record(
            AUDIT_LOG_TARGET,
            methods::BATCH_OF_AUDIT_LOG_ENTRIES,
            vec![BuilderArg::Id(begin), BuilderArg::Id(end)],
        )
    }

    fn build_get_audit_log_entries_query(&self, filter: Option<&QueryFilter>) -> SqlQuery {
        self.record(
            AUDIT_LOG_TARGET,
            methods::LIST_AUDIT_LOG_ENTRIES,
            vec![BuilderArg::Filter(filter.cloned())],
        )
    }

    fn build_create_audit_log_entry_query(&self, input: &AuditLogEntryCreationInput) -> SqlQuery {
        self.record(
            AUDIT_LOG_TARGET,
            methods::CREATE_AUDIT_LOG_ENTRY,
            vec![BuilderArg::AuditEntry(input.clone())],
        )
    }
}

impl UserSqlQueryBuilder for MockSqlQueryBuilder {
    fn build_set_user_reputation_query(&self, input: &UserReputationUpdateInput) -> SqlQuery {
        self.record(
            USER_TARGET,
            methods::SET_USER_REPUTATION,
            vec![BuilderArg::Reputation(input.clone())],
        )
    }
}

impl SqlQueryBuilder for MockSqlQueryBuilder {
    fn api_clients(&self) -> &dyn EntitySqlQueryBuilder<ApiClient> {
        self
    }

    fn api_client_lookups(&self) -> &dyn ApiClientSqlQueryBuilder {
        self
    }

    fn invitations(&self) -> &dyn EntitySqlQueryBuilder<Invitation> {
        self
    }

    fn reports(&self) -> &dyn EntitySqlQueryBuilder<Report> {
        self
    }

    fn valid_ingredients(&self) -> &dyn EntitySqlQueryBuilder<ValidIngredient> {
        self
    }

    fn valid_ingredient_names(&self) -> &dyn NameSearchSqlQueryBuilder<ValidIngredient> {
        self
    }

    fn valid_instruments(&self) -> &dyn EntitySqlQueryBuilder<ValidInstrument> {
        self
    }

    fn valid_instrument_names(&self) -> &dyn NameSearchSqlQueryBuilder<ValidInstrument> {
        self
    }

    fn valid_preparations(&self) -> &dyn EntitySqlQueryBuilder<ValidPreparation> {
        self
    }

    fn valid_preparation_names(&self) -> &dyn NameSearchSqlQueryBuilder<ValidPreparation> {
        self
    }

    fn valid_ingredient_preparations(
        &self,
    ) -> &dyn EntitySqlQueryBuilder<ValidIngredientPreparation> {
        self
    }

    fn valid_preparation_instruments(
        &self,
    ) -> &dyn EntitySqlQueryBuilder<ValidPreparationInstrument> {
        self
    }

    fn recipe_step_products(&self) -> &dyn EntitySqlQueryBuilder<RecipeStepProduct> {
        self
    }

    fn audit_log_entries(&self) -> &dyn AuditLogEntrySqlQueryBuilder {
        self
    }

    fn users(&self) -> &dyn UserSqlQueryBuilder {
        self
    }
}

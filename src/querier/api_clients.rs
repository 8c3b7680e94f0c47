// ABOUTME: API client persistence: descriptor, row scanning, and the API client data-manager contract
// ABOUTME: Clients are scoped to their owning user; lookups by public client id surface no-rows as-is
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::{DatabaseError, DatabaseResult};
use larder_core::models::{
    ApiClient, ApiClientCreationInput, AuditLogEntry, AuditResource, FieldChangeSummary,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, Scannable, Scanned, SqlQuerier, UserScope};
use crate::context::QueryContext;
use crate::database::{get_one_row, Row};
use crate::observability::{note, operation_span, prepare_error};
use crate::querybuilding::{EntitySqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one API client of one user
    ApiClientKey { api_client_id, user_id }
}

/// Identifies the API client to archive
pub type ApiClientArchiveKey = ApiClientKey;

impl Scannable for ApiClient {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let client = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            name: reader.read_string()?,
            client_id: reader.read_string()?,
            client_secret: reader.read_bytes()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
            belongs_to_user: reader.read_u64()?,
        };
        Scanned::finish(client, &mut reader, include_counts)
    }
}

impl Entity for ApiClient {
    const NAME: &'static str = "API client";
    const RESOURCE: AuditResource = AuditResource::ApiClient;

    type Key = ApiClientKey;
    type Scope = UserScope;
    type Owner = UserScope;
    type ArchiveKey = ApiClientArchiveKey;
    type CreationInput = ApiClientCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            name: input.name.clone(),
            client_id: input.client_id.clone(),
            client_secret: input.client_secret.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
            belongs_to_user: input.belongs_to_user,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.api_clients()
    }
}

/// Persistence contract for API clients
#[async_trait]
pub trait ApiClientDataManager: Send + Sync {
    /// Whether the user's API client exists
    async fn api_client_exists(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
        user_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one of a user's API clients by database id
    async fn get_api_client_by_database_id(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
        user_id: u64,
    ) -> DatabaseResult<ApiClient>;

    /// Fetch an API client by its public client id
    async fn get_api_client_by_client_id(
        &self,
        ctx: &QueryContext,
        client_id: &str,
    ) -> DatabaseResult<ApiClient>;

    /// Count non-archived API clients
    async fn get_all_api_clients_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every API client to `sink` in parallel batches
    async fn get_all_api_clients(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ApiClient>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every API client to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_api_clients_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ApiClient>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of a user's API clients
    async fn get_api_clients(
        &self,
        ctx: &QueryContext,
        user_id: u64,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ApiClient>>;

    /// Fetch a user's API clients by id
    async fn get_api_clients_with_ids(
        &self,
        ctx: &QueryContext,
        user_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ApiClient>>;

    /// Create an API client with its creation audit entry
    async fn create_api_client(
        &self,
        ctx: &QueryContext,
        input: Option<&ApiClientCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ApiClient>;

    /// Update an API client with its update audit entry
    async fn update_api_client(
        &self,
        ctx: &QueryContext,
        updated: Option<&ApiClient>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a user's API client with its archive audit entry
    async fn archive_api_client(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
        user_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for an API client
    async fn get_audit_log_entries_for_api_client(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ApiClientDataManager for SqlQuerier {
    async fn api_client_exists(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
        user_id: u64,
    ) -> DatabaseResult<bool> {
        let key = ApiClientKey {
            api_client_id,
            user_id,
        };
        self.entity_exists::<ApiClient>(ctx, &key).await
    }

    async fn get_api_client_by_database_id(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
        user_id: u64,
    ) -> DatabaseResult<ApiClient> {
        let key = ApiClientKey {
            api_client_id,
            user_id,
        };
        self.get_entity(ctx, &key).await
    }

    async fn get_api_client_by_client_id(
        &self,
        ctx: &QueryContext,
        client_id: &str,
    ) -> DatabaseResult<ApiClient> {
        let span = operation_span("get by client id", ApiClient::NAME);
        if client_id.is_empty() {
            return Err(DatabaseError::empty_input("client_id"));
        }

        let query = self
            .builder()
            .api_client_lookups()
            .build_get_api_client_by_client_id_query(client_id);
        let mut querier = self.handle();
        let row = match get_one_row(ctx, querier.as_mut(), ApiClient::NAME, &query)
            .await
            .scan()
        {
            Ok(row) => row,
            Err(DatabaseError::NoRows) => {
                note(&span, "no API client with that client id");
                return Err(DatabaseError::NoRows);
            }
            Err(e) => return Err(prepare_error(e, &span, "querying for API client")),
        };

        ApiClient::scan(&row, false)
            .map(|scanned| scanned.value)
            .map_err(|e| prepare_error(e, &span, "scanning API client"))
    }

    async fn get_all_api_clients_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        self.get_all_entities_count::<ApiClient>(ctx).await
    }

    async fn get_all_api_clients(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ApiClient>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_api_clients_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ApiClient>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_api_clients(
        &self,
        ctx: &QueryContext,
        user_id: u64,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ApiClient>> {
        self.get_entities(ctx, &UserScope { user_id }, filter).await
    }

    async fn get_api_clients_with_ids(
        &self,
        ctx: &QueryContext,
        user_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ApiClient>> {
        self.get_entities_with_ids(ctx, &UserScope { user_id }, limit, ids)
            .await
    }

    async fn create_api_client(
        &self,
        ctx: &QueryContext,
        input: Option<&ApiClientCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ApiClient> {
        self.create_entity::<ApiClient>(ctx, input, created_by).await
    }

    async fn update_api_client(
        &self,
        ctx: &QueryContext,
        updated: Option<&ApiClient>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_api_client(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
        user_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ApiClientArchiveKey {
            api_client_id,
            user_id,
        };
        self.archive_entity::<ApiClient>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_api_client(
        &self,
        ctx: &QueryContext,
        api_client_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<ApiClient>(ctx, api_client_id)
            .await
    }
}

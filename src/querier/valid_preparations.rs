// ABOUTME: Valid preparation persistence: descriptor, row scanning, name lookups, and data-manager contract
// ABOUTME: Preparations (chop, braise, ...) shared by every account; list and bulk fetch take no scope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, ValidPreparation,
    ValidPreparationCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, NameSearchable, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, NameSearchSqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one valid preparation
    ValidPreparationKey { valid_preparation_id }
}

impl Scannable for ValidPreparation {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let record = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            name: reader.read_string()?,
            description: reader.read_string()?,
            icon_path: reader.read_string()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
        };
        Scanned::finish(record, &mut reader, include_counts)
    }
}

impl Entity for ValidPreparation {
    const NAME: &'static str = "valid preparation";
    const RESOURCE: AuditResource = AuditResource::ValidPreparation;

    type Key = ValidPreparationKey;
    type Scope = ();
    type Owner = ();
    type ArchiveKey = ValidPreparationKey;
    type CreationInput = ValidPreparationCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            name: input.name.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.valid_preparations()
    }
}

impl NameSearchable for ValidPreparation {
    fn name_query_builder(builder: &dyn SqlQueryBuilder) -> &dyn NameSearchSqlQueryBuilder<Self> {
        builder.valid_preparation_names()
    }
}

/// Persistence contract for valid preparations
#[async_trait]
pub trait ValidPreparationDataManager: Send + Sync {
    /// Whether the valid preparation exists
    async fn valid_preparation_exists(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one valid preparation
    async fn get_valid_preparation(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
    ) -> DatabaseResult<ValidPreparation>;

    /// Valid preparations whose name matches `name`
    async fn search_for_valid_preparations(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<ValidPreparation>>;

    /// Id of the valid preparation named exactly `name`
    async fn get_valid_preparation_id_for_name(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64>;

    /// Count non-archived valid preparations
    async fn get_all_valid_preparations_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every valid preparation to `sink` in parallel batches
    async fn get_all_valid_preparations(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every valid preparation to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_valid_preparations_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of valid preparations
    async fn get_valid_preparations(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidPreparation>>;

    /// Fetch valid preparations by id
    async fn get_valid_preparations_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidPreparation>>;

    /// Create a valid preparation with its creation audit entry
    async fn create_valid_preparation(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidPreparationCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidPreparation>;

    /// Update a valid preparation with its update audit entry
    async fn update_valid_preparation(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidPreparation>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a valid preparation with its archive audit entry
    async fn archive_valid_preparation(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a valid preparation
    async fn get_audit_log_entries_for_valid_preparation(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ValidPreparationDataManager for SqlQuerier {
    async fn valid_preparation_exists(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
    ) -> DatabaseResult<bool> {
        self.entity_exists::<ValidPreparation>(ctx, &ValidPreparationKey { valid_preparation_id })
            .await
    }

    async fn get_valid_preparation(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
    ) -> DatabaseResult<ValidPreparation> {
        self.get_entity(ctx, &ValidPreparationKey { valid_preparation_id })
            .await
    }

    async fn search_for_valid_preparations(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<ValidPreparation>> {
        self.search_entities_by_name(ctx, name).await
    }

    async fn get_valid_preparation_id_for_name(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64> {
        self.get_entity_id_for_name::<ValidPreparation>(ctx, name)
            .await
    }

    async fn get_all_valid_preparations_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        self.get_all_entities_count::<ValidPreparation>(ctx).await
    }

    async fn get_all_valid_preparations(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_valid_preparations_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_valid_preparations(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidPreparation>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_valid_preparations_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidPreparation>> {
        self.get_entities_with_ids(ctx, &(), limit, ids).await
    }

    async fn create_valid_preparation(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidPreparationCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidPreparation> {
        self.create_entity::<ValidPreparation>(ctx, input, created_by)
            .await
    }

    async fn update_valid_preparation(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidPreparation>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_valid_preparation(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ValidPreparationKey {
            valid_preparation_id,
        };
        self.archive_entity::<ValidPreparation>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_valid_preparation(
        &self,
        ctx: &QueryContext,
        valid_preparation_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<ValidPreparation>(ctx, valid_preparation_id)
            .await
    }
}

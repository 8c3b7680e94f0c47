// ABOUTME: Valid ingredient preparation persistence: which preparations apply to which ingredients
// ABOUTME: Descriptor, row scanning, and the data-manager contract for the bridge table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, ValidIngredientPreparation,
    ValidIngredientPreparationCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one valid ingredient preparation
    ValidIngredientPreparationKey { valid_ingredient_preparation_id }
}

impl Scannable for ValidIngredientPreparation {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let record = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            notes: reader.read_string()?,
            valid_ingredient_id: reader.read_u64()?,
            valid_preparation_id: reader.read_u64()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
        };
        Scanned::finish(record, &mut reader, include_counts)
    }
}

impl Entity for ValidIngredientPreparation {
    const NAME: &'static str = "valid ingredient preparation";
    const RESOURCE: AuditResource = AuditResource::ValidIngredientPreparation;

    type Key = ValidIngredientPreparationKey;
    type Scope = ();
    type Owner = ();
    type ArchiveKey = ValidIngredientPreparationKey;
    type CreationInput = ValidIngredientPreparationCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            notes: input.notes.clone(),
            valid_ingredient_id: input.valid_ingredient_id,
            valid_preparation_id: input.valid_preparation_id,
            created_on,
            last_updated_on: None,
            archived_on: None,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.valid_ingredient_preparations()
    }
}

/// Persistence contract for valid ingredient preparations
#[async_trait]
pub trait ValidIngredientPreparationDataManager: Send + Sync {
    /// Whether the valid ingredient preparation exists
    async fn valid_ingredient_preparation_exists(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one valid ingredient preparation
    async fn get_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
    ) -> DatabaseResult<ValidIngredientPreparation>;

    /// Count non-archived valid ingredient preparations
    async fn get_all_valid_ingredient_preparations_count(
        &self,
        ctx: &QueryContext,
    ) -> DatabaseResult<u64>;

    /// Stream every valid ingredient preparation to `sink` in parallel batches
    async fn get_all_valid_ingredient_preparations(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredientPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every valid ingredient preparation to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_valid_ingredient_preparations_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredientPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of valid ingredient preparations
    async fn get_valid_ingredient_preparations(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidIngredientPreparation>>;

    /// Fetch valid ingredient preparations by id
    async fn get_valid_ingredient_preparations_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidIngredientPreparation>>;

    /// Create a valid ingredient preparation with its creation audit entry
    async fn create_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidIngredientPreparationCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidIngredientPreparation>;

    /// Update a valid ingredient preparation with its update audit entry
    async fn update_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidIngredientPreparation>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a valid ingredient preparation with its archive audit entry
    async fn archive_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a valid ingredient preparation
    async fn get_audit_log_entries_for_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ValidIngredientPreparationDataManager for SqlQuerier {
    async fn valid_ingredient_preparation_exists(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
    ) -> DatabaseResult<bool> {
        let key = ValidIngredientPreparationKey {
            valid_ingredient_preparation_id,
        };
        self.entity_exists::<ValidIngredientPreparation>(ctx, &key)
            .await
    }

    async fn get_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
    ) -> DatabaseResult<ValidIngredientPreparation> {
        let key = ValidIngredientPreparationKey {
            valid_ingredient_preparation_id,
        };
        self.get_entity(ctx, &key).await
    }

    async fn get_all_valid_ingredient_preparations_count(
        &self,
        ctx: &QueryContext,
    ) -> DatabaseResult<u64> {
        self.get_all_entities_count::<ValidIngredientPreparation>(ctx)
            .await
    }

    async fn get_all_valid_ingredient_preparations(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredientPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_valid_ingredient_preparations_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidIngredientPreparation>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_valid_ingredient_preparations(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidIngredientPreparation>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_valid_ingredient_preparations_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidIngredientPreparation>> {
        self.get_entities_with_ids(ctx, &(), limit, ids).await
    }

    async fn create_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidIngredientPreparationCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidIngredientPreparation> {
        self.create_entity::<ValidIngredientPreparation>(ctx, input, created_by)
            .await
    }

    async fn update_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidIngredientPreparation>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ValidIngredientPreparationKey {
            valid_ingredient_preparation_id,
        };
        self.archive_entity::<ValidIngredientPreparation>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_valid_ingredient_preparation(
        &self,
        ctx: &QueryContext,
        valid_ingredient_preparation_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<ValidIngredientPreparation>(
            ctx,
            valid_ingredient_preparation_id,
        )
        .await
    }
}

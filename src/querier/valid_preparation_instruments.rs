// ABOUTME: Valid preparation instrument persistence: which instruments each preparation calls for
// ABOUTME: Descriptor, row scanning, and the data-manager contract for the bridge table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, ValidPreparationInstrument,
    ValidPreparationInstrumentCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one valid preparation instrument
    ValidPreparationInstrumentKey { valid_preparation_instrument_id }
}

impl Scannable for ValidPreparationInstrument {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let record = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            valid_instrument_id: reader.read_u64()?,
            valid_preparation_id: reader.read_u64()?,
            notes: reader.read_string()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
        };
        Scanned::finish(record, &mut reader, include_counts)
    }
}

impl Entity for ValidPreparationInstrument {
    const NAME: &'static str = "valid preparation instrument";
    const RESOURCE: AuditResource = AuditResource::ValidPreparationInstrument;

    type Key = ValidPreparationInstrumentKey;
    type Scope = ();
    type Owner = ();
    type ArchiveKey = ValidPreparationInstrumentKey;
    type CreationInput = ValidPreparationInstrumentCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            valid_instrument_id: input.valid_instrument_id,
            valid_preparation_id: input.valid_preparation_id,
            notes: input.notes.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.valid_preparation_instruments()
    }
}

/// Persistence contract for valid preparation instruments
#[async_trait]
pub trait ValidPreparationInstrumentDataManager: Send + Sync {
    /// Whether the valid preparation instrument exists
    async fn valid_preparation_instrument_exists(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one valid preparation instrument
    async fn get_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
    ) -> DatabaseResult<ValidPreparationInstrument>;

    /// Count non-archived valid preparation instruments
    async fn get_all_valid_preparation_instruments_count(
        &self,
        ctx: &QueryContext,
    ) -> DatabaseResult<u64>;

    /// Stream every valid preparation instrument to `sink` in parallel batches
    async fn get_all_valid_preparation_instruments(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparationInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every valid preparation instrument to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_valid_preparation_instruments_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparationInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of valid preparation instruments
    async fn get_valid_preparation_instruments(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidPreparationInstrument>>;

    /// Fetch valid preparation instruments by id
    async fn get_valid_preparation_instruments_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidPreparationInstrument>>;

    /// Create a valid preparation instrument with its creation audit entry
    async fn create_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidPreparationInstrumentCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidPreparationInstrument>;

    /// Update a valid preparation instrument with its update audit entry
    async fn update_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidPreparationInstrument>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a valid preparation instrument with its archive audit entry
    async fn archive_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a valid preparation instrument
    async fn get_audit_log_entries_for_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ValidPreparationInstrumentDataManager for SqlQuerier {
    async fn valid_preparation_instrument_exists(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
    ) -> DatabaseResult<bool> {
        let key = ValidPreparationInstrumentKey {
            valid_preparation_instrument_id,
        };
        self.entity_exists::<ValidPreparationInstrument>(ctx, &key)
            .await
    }

    async fn get_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
    ) -> DatabaseResult<ValidPreparationInstrument> {
        let key = ValidPreparationInstrumentKey {
            valid_preparation_instrument_id,
        };
        self.get_entity(ctx, &key).await
    }

    async fn get_all_valid_preparation_instruments_count(
        &self,
        ctx: &QueryContext,
    ) -> DatabaseResult<u64> {
        self.get_all_entities_count::<ValidPreparationInstrument>(ctx)
            .await
    }

    async fn get_all_valid_preparation_instruments(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparationInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_valid_preparation_instruments_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidPreparationInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_valid_preparation_instruments(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidPreparationInstrument>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_valid_preparation_instruments_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidPreparationInstrument>> {
        self.get_entities_with_ids(ctx, &(), limit, ids).await
    }

    async fn create_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidPreparationInstrumentCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidPreparationInstrument> {
        self.create_entity::<ValidPreparationInstrument>(ctx, input, created_by)
            .await
    }

    async fn update_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidPreparationInstrument>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ValidPreparationInstrumentKey {
            valid_preparation_instrument_id,
        };
        self.archive_entity::<ValidPreparationInstrument>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_valid_preparation_instrument(
        &self,
        ctx: &QueryContext,
        valid_preparation_instrument_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<ValidPreparationInstrument>(
            ctx,
            valid_preparation_instrument_id,
        )
        .await
    }
}

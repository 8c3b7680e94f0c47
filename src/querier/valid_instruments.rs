// ABOUTME: Valid instrument persistence: descriptor, row scanning, name lookups, and data-manager contract
// ABOUTME: Reference data shared by every account, so list and bulk fetch take no scope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, ValidInstrument,
    ValidInstrumentCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, BatchStreamReport, Entity, NameSearchable, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, NameSearchSqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one valid instrument
    ValidInstrumentKey { valid_instrument_id }
}

impl Scannable for ValidInstrument {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let record = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            name: reader.read_string()?,
            variant: reader.read_string()?,
            description: reader.read_string()?,
            icon_path: reader.read_string()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
        };
        Scanned::finish(record, &mut reader, include_counts)
    }
}

impl Entity for ValidInstrument {
    const NAME: &'static str = "valid instrument";
    const RESOURCE: AuditResource = AuditResource::ValidInstrument;

    type Key = ValidInstrumentKey;
    type Scope = ();
    type Owner = ();
    type ArchiveKey = ValidInstrumentKey;
    type CreationInput = ValidInstrumentCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            name: input.name.clone(),
            variant: input.variant.clone(),
            description: input.description.clone(),
            icon_path: input.icon_path.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.valid_instruments()
    }
}

impl NameSearchable for ValidInstrument {
    fn name_query_builder(builder: &dyn SqlQueryBuilder) -> &dyn NameSearchSqlQueryBuilder<Self> {
        builder.valid_instrument_names()
    }
}

/// Persistence contract for valid instruments
#[async_trait]
pub trait ValidInstrumentDataManager: Send + Sync {
    /// Whether the valid instrument exists
    async fn valid_instrument_exists(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
    ) -> DatabaseResult<bool>;

    /// Fetch one valid instrument
    async fn get_valid_instrument(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
    ) -> DatabaseResult<ValidInstrument>;

    /// Valid instruments whose name matches `name`
    async fn search_for_valid_instruments(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<ValidInstrument>>;

    /// Id of the valid instrument named exactly `name`
    async fn get_valid_instrument_id_for_name(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64>;

    /// Count non-archived valid instruments
    async fn get_all_valid_instruments_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every valid instrument to `sink` in parallel batches
    async fn get_all_valid_instruments(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every valid instrument to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_valid_instruments_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of valid instruments
    async fn get_valid_instruments(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidInstrument>>;

    /// Fetch valid instruments by id
    async fn get_valid_instruments_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidInstrument>>;

    /// Create a valid instrument with its creation audit entry
    async fn create_valid_instrument(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidInstrumentCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidInstrument>;

    /// Update a valid instrument with its update audit entry
    async fn update_valid_instrument(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidInstrument>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive a valid instrument with its archive audit entry
    async fn archive_valid_instrument(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a valid instrument
    async fn get_audit_log_entries_for_valid_instrument(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ValidInstrumentDataManager for SqlQuerier {
    async fn valid_instrument_exists(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
    ) -> DatabaseResult<bool> {
        self.entity_exists::<ValidInstrument>(ctx, &ValidInstrumentKey { valid_instrument_id })
            .await
    }

    async fn get_valid_instrument(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
    ) -> DatabaseResult<ValidInstrument> {
        self.get_entity(ctx, &ValidInstrumentKey { valid_instrument_id })
            .await
    }

    async fn search_for_valid_instruments(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<ValidInstrument>> {
        self.search_entities_by_name(ctx, name).await
    }

    async fn get_valid_instrument_id_for_name(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64> {
        self.get_entity_id_for_name::<ValidInstrument>(ctx, name)
            .await
    }

    async fn get_all_valid_instruments_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        self.get_all_entities_count::<ValidInstrument>(ctx).await
    }

    async fn get_all_valid_instruments(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_valid_instruments_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<ValidInstrument>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_valid_instruments(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<ValidInstrument>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_valid_instruments_with_ids(
        &self,
        ctx: &QueryContext,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<ValidInstrument>> {
        self.get_entities_with_ids(ctx, &(), limit, ids).await
    }

    async fn create_valid_instrument(
        &self,
        ctx: &QueryContext,
        input: Option<&ValidInstrumentCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<ValidInstrument> {
        self.create_entity::<ValidInstrument>(ctx, input, created_by)
            .await
    }

    async fn update_valid_instrument(
        &self,
        ctx: &QueryContext,
        updated: Option<&ValidInstrument>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_valid_instrument(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ValidInstrumentKey {
            valid_instrument_id,
        };
        self.archive_entity::<ValidInstrument>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_valid_instrument(
        &self,
        ctx: &QueryContext,
        valid_instrument_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<ValidInstrument>(ctx, valid_instrument_id)
            .await
    }
}

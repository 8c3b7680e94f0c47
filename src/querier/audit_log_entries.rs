// ABOUTME: Audit log sinks (transactional and best-effort) and audit log entry reads
// ABOUTME: Transactional writes roll back the caller's transaction on failure; best-effort writes never fail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Audit log
//!
//! Two sinks write audit entries:
//!
//! - [`SqlQuerier::create_audit_log_entry_in_transaction`] writes inside the
//!   caller's transaction and rolls it back if the write fails, so an entity
//!   write never commits without its audit entry
//! - [`SqlQuerier::create_audit_log_entry`] is for events that are themselves
//!   the point (logins, bans). Missing arguments are noted on the span and
//!   write failures are logged; nothing reaches the caller

use async_trait::async_trait;
use larder_core::errors::{DatabaseError, DatabaseResult};
use larder_core::models::{AuditLogEntry, AuditLogEntryCreationInput};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;
use tracing::debug;

use super::generic::scan_rows;
use super::streaming::{BatchQueryFn, CountQueryFn, StreamSource};
use super::{BatchStreamReport, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::{
    get_one_row, get_rows, perform_count_query, perform_write_query_ignoring_return, Querier,
    Row, TransactionGuard,
};
use crate::observability::{attach_ids, log_error, note, operation_span, prepare_error};

/// Label for audit log entries in spans and error descriptions
pub const AUDIT_LOG_ENTRY_NAME: &str = "audit log entry";

impl Scannable for AuditLogEntry {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let id = reader.read_u64()?;
        let external_id = reader.read_string()?;
        let raw_event_type = reader.read_string()?;
        let event_type = raw_event_type
            .parse()
            .map_err(|_| DatabaseError::scan(format!("audit event type {raw_event_type}")))?;
        let context = reader.read_json()?;
        let created_on = reader.read_u64()?;

        let entry = Self {
            id,
            external_id,
            event_type,
            context,
            created_on,
        };
        Scanned::finish(entry, &mut reader, include_counts)
    }
}

/// Reads over the audit log
#[async_trait]
pub trait AuditLogEntryDataManager: Send + Sync {
    /// Fetch one entry
    async fn get_audit_log_entry(
        &self,
        ctx: &QueryContext,
        audit_log_entry_id: u64,
    ) -> DatabaseResult<AuditLogEntry>;

    /// Count every entry
    async fn get_all_audit_log_entries_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every entry to `sink` in parallel batches
    async fn get_all_audit_log_entries(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<AuditLogEntry>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every entry to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_audit_log_entries_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<AuditLogEntry>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of entries
    async fn get_audit_log_entries(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<AuditLogEntry>>;
}

impl SqlQuerier {
    /// Write `input` inside the caller's transaction
    ///
    /// A failed write rolls the transaction back before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilTransaction`] without an active transaction,
    /// [`DatabaseError::NilInput`] without input, otherwise the write error
    pub async fn create_audit_log_entry_in_transaction(
        &self,
        ctx: &QueryContext,
        transaction: Option<&mut TransactionGuard>,
        input: Option<&AuditLogEntryCreationInput>,
    ) -> DatabaseResult<()> {
        let span = operation_span("create audit log entry in transaction", AUDIT_LOG_ENTRY_NAME);
        let guard = transaction
            .filter(|guard| guard.is_active())
            .ok_or(DatabaseError::NilTransaction)?;
        let input = input.ok_or(DatabaseError::nil_input("audit log entry"))?;
        debug!(parent: &span, event_type = %input.event_type, "writing audit log entry");

        let query = self
            .builder()
            .audit_log_entries()
            .build_create_audit_log_entry_query(input);
        let written =
            perform_write_query_ignoring_return(ctx, guard.executor()?, AUDIT_LOG_ENTRY_NAME, &query)
                .await;
        if let Err(e) = &written {
            log_error(e, &span, "executing audit log entry creation query");
        }
        guard.rollback_on_error(written).await
    }

    /// Write `input` outside any transaction, never failing the caller
    ///
    /// Missing arguments are noted on the span and nothing is written; a
    /// failed write is logged and swallowed.
    pub async fn create_audit_log_entry(
        &self,
        ctx: &QueryContext,
        querier: Option<&mut dyn Querier>,
        input: Option<&AuditLogEntryCreationInput>,
    ) {
        let span = operation_span("create audit log entry", AUDIT_LOG_ENTRY_NAME);
        let Some(querier) = querier else {
            note(&span, "no querier provided for audit log entry");
            return;
        };
        let Some(input) = input else {
            note(&span, "no input provided for audit log entry");
            return;
        };
        debug!(parent: &span, event_type = %input.event_type, "writing audit log entry");

        let query = self
            .builder()
            .audit_log_entries()
            .build_create_audit_log_entry_query(input);
        if let Err(e) =
            perform_write_query_ignoring_return(ctx, querier, AUDIT_LOG_ENTRY_NAME, &query).await
        {
            log_error(&e, &span, "executing audit log entry creation query");
        }
    }

    fn audit_log_stream_source() -> StreamSource {
        let count_query: CountQueryFn =
            |builder| builder.audit_log_entries().build_get_all_audit_log_entries_count_query();
        let batch_query: BatchQueryFn = |builder, begin, end| {
            builder
                .audit_log_entries()
                .build_get_batch_of_audit_log_entries_query(begin, end)
        };
        StreamSource {
            label: AUDIT_LOG_ENTRY_NAME,
            count_query,
            batch_query,
        }
    }
}

#[async_trait]
impl AuditLogEntryDataManager for SqlQuerier {
    async fn get_audit_log_entry(
        &self,
        ctx: &QueryContext,
        audit_log_entry_id: u64,
    ) -> DatabaseResult<AuditLogEntry> {
        let span = operation_span("get", AUDIT_LOG_ENTRY_NAME);
        if audit_log_entry_id == 0 {
            return Err(DatabaseError::invalid_id("audit_log_entry_id"));
        }
        attach_ids(&span, &[("audit_log_entry_id", audit_log_entry_id)]);

        let query = self
            .builder()
            .audit_log_entries()
            .build_get_audit_log_entry_query(audit_log_entry_id);
        let mut querier = self.handle();
        let row = match get_one_row(ctx, querier.as_mut(), AUDIT_LOG_ENTRY_NAME, &query)
            .await
            .scan()
        {
            Ok(row) => row,
            Err(DatabaseError::NoRows) => {
                note(&span, "no matching row");
                return Err(DatabaseError::NoRows);
            }
            Err(e) => return Err(prepare_error(e, &span, "fetching audit log entry")),
        };

        AuditLogEntry::scan(&row, false)
            .map(|scanned| scanned.value)
            .map_err(|e| prepare_error(e, &span, "scanning audit log entry"))
    }

    async fn get_all_audit_log_entries_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        let span = operation_span("count", AUDIT_LOG_ENTRY_NAME);
        let query = self
            .builder()
            .audit_log_entries()
            .build_get_all_audit_log_entries_count_query();
        let mut querier = self.handle();
        perform_count_query(ctx, querier.as_mut(), &query)
            .await
            .map_err(|e| prepare_error(e, &span, "fetching count of audit log entries"))
    }

    async fn get_all_audit_log_entries(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<AuditLogEntry>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.stream_rows(ctx, Self::audit_log_stream_source(), sink, batch_size)
            .await
    }

    async fn get_all_audit_log_entries_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<AuditLogEntry>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.stream_rows_joined(ctx, Self::audit_log_stream_source(), sink, batch_size)
            .await
    }

    async fn get_audit_log_entries(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<AuditLogEntry>> {
        let span = operation_span("list", AUDIT_LOG_ENTRY_NAME);
        let query = self
            .builder()
            .audit_log_entries()
            .build_get_audit_log_entries_query(filter);
        let mut querier = self.handle();
        let rows = get_rows(ctx, querier.as_mut(), AUDIT_LOG_ENTRY_NAME, &query)
            .await
            .map_err(|e| prepare_error(e, &span, "fetching audit log entries"))?;
        let scanned = scan_rows::<AuditLogEntry>(rows, true)
            .map_err(|e| prepare_error(e, &span, "scanning audit log entries"))?;

        let mut page = ListPage::for_filter(filter);
        page.items = scanned.items;
        page.filtered_count = scanned.filtered_count;
        page.total_count = scanned.total_count;
        Ok(page)
    }
}

// ABOUTME: Report persistence: descriptor, row scanning, and the report data-manager contract
// ABOUTME: Reports belong to an account; archive and bulk fetch are scoped by that account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{AuditLogEntry, AuditResource, FieldChangeSummary, Report, ReportCreationInput};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, AccountScope, BatchStreamReport, Entity, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one report
    ReportKey { report_id }
}

id_set! {
    /// Identifies the report to archive within its account
    ReportArchiveKey { report_id, account_id }
}

impl Scannable for Report {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let report = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            report_type: reader.read_string()?,
            concern: reader.read_string()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
            belongs_to_account: reader.read_u64()?,
        };
        Scanned::finish(report, &mut reader, include_counts)
    }
}

impl Entity for Report {
    const NAME: &'static str = "report";
    const RESOURCE: AuditResource = AuditResource::Report;

    type Key = ReportKey;
    type Scope = ();
    type Owner = AccountScope;
    type ArchiveKey = ReportArchiveKey;
    type CreationInput = ReportCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            report_type: input.report_type.clone(),
            concern: input.concern.clone(),
            created_on,
            last_updated_on: None,
            archived_on: None,
            belongs_to_account: input.belongs_to_account,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.reports()
    }
}

/// Persistence contract for reports
#[async_trait]
pub trait ReportDataManager: Send + Sync {
    /// Whether the report exists
    async fn report_exists(&self, ctx: &QueryContext, report_id: u64) -> DatabaseResult<bool>;

    /// Fetch one report
    async fn get_report(&self, ctx: &QueryContext, report_id: u64) -> DatabaseResult<Report>;

    /// Count non-archived reports
    async fn get_all_reports_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every report to `sink` in parallel batches
    async fn get_all_reports(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Report>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every report to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_reports_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Report>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of reports
    async fn get_reports(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<Report>>;

    /// Fetch an account's reports by id
    async fn get_reports_with_ids(
        &self,
        ctx: &QueryContext,
        account_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<Report>>;

    /// Create a report with its creation audit entry
    async fn create_report(
        &self,
        ctx: &QueryContext,
        input: Option<&ReportCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<Report>;

    /// Update a report with its update audit entry
    async fn update_report(
        &self,
        ctx: &QueryContext,
        updated: Option<&Report>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive an account's report with its archive audit entry
    async fn archive_report(
        &self,
        ctx: &QueryContext,
        report_id: u64,
        account_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for a report
    async fn get_audit_log_entries_for_report(
        &self,
        ctx: &QueryContext,
        report_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl ReportDataManager for SqlQuerier {
    async fn report_exists(&self, ctx: &QueryContext, report_id: u64) -> DatabaseResult<bool> {
        self.entity_exists::<Report>(ctx, &ReportKey { report_id })
            .await
    }

    async fn get_report(&self, ctx: &QueryContext, report_id: u64) -> DatabaseResult<Report> {
        self.get_entity(ctx, &ReportKey { report_id }).await
    }

    async fn get_all_reports_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        self.get_all_entities_count::<Report>(ctx).await
    }

    async fn get_all_reports(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Report>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_reports_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Report>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_reports(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<Report>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_reports_with_ids(
        &self,
        ctx: &QueryContext,
        account_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<Report>> {
        self.get_entities_with_ids(ctx, &AccountScope { account_id }, limit, ids)
            .await
    }

    async fn create_report(
        &self,
        ctx: &QueryContext,
        input: Option<&ReportCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<Report> {
        self.create_entity::<Report>(ctx, input, created_by).await
    }

    async fn update_report(
        &self,
        ctx: &QueryContext,
        updated: Option<&Report>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_report(
        &self,
        ctx: &QueryContext,
        report_id: u64,
        account_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = ReportArchiveKey {
            report_id,
            account_id,
        };
        self.archive_entity::<Report>(ctx, &key, archived_by).await
    }

    async fn get_audit_log_entries_for_report(
        &self,
        ctx: &QueryContext,
        report_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<Report>(ctx, report_id)
            .await
    }
}

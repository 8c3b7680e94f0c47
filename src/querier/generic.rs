// ABOUTME: Generic CRUD operations instantiated per entity from its descriptor
// ABOUTME: Exists, get, count, list, bulk fetch, create/update/archive with audit, audit history, name lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use larder_core::errors::{DatabaseError, DatabaseResult};
use larder_core::models::{AuditLogEntry, FieldChangeSummary};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, trace};

use super::streaming::{BatchQueryFn, CountQueryFn, StreamSource};
use super::{BatchStreamReport, Entity, IdSet, NameSearchable, Scannable, SqlQuerier};
use crate::audit;
use crate::context::QueryContext;
use crate::database::{
    check_rows_for_error_and_close, get_one_row, get_rows, perform_boolean_query,
    perform_count_query, perform_write_query, perform_write_query_ignoring_return,
    ResultIterator, TransactionGuard,
};
use crate::observability::{attach_actor, attach_ids, note, operation_span, prepare_error};

/// Rows scanned from a read, with the list counts of the last row
#[derive(Debug)]
pub(crate) struct ScannedRows<T> {
    pub(crate) items: Vec<T>,
    pub(crate) filtered_count: u64,
    pub(crate) total_count: u64,
}

/// Scan every row, then surface iteration and close errors
pub(crate) fn scan_rows<T: Scannable>(
    mut rows: Box<dyn ResultIterator>,
    include_counts: bool,
) -> DatabaseResult<ScannedRows<T>> {
    let scanned = read_all(rows.as_mut(), include_counts);
    match scanned {
        Ok(scanned) => {
            check_rows_for_error_and_close(rows.as_mut())?;
            Ok(scanned)
        }
        Err(e) => {
            if let Err(close_err) = rows.close() {
                trace!(error = %close_err, "closing rows after scan error");
            }
            Err(e)
        }
    }
}

fn read_all<T: Scannable>(
    rows: &mut dyn ResultIterator,
    include_counts: bool,
) -> DatabaseResult<ScannedRows<T>> {
    let mut scanned = ScannedRows {
        items: Vec::new(),
        filtered_count: 0,
        total_count: 0,
    };
    while rows.advance() {
        let row = T::scan(rows.current()?, include_counts)?;
        scanned.filtered_count = row.filtered_count;
        scanned.total_count = row.total_count;
        scanned.items.push(row.value);
    }
    Ok(scanned)
}

impl SqlQuerier {
    /// Whether the keyed, non-archived row exists
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for the first zero key id, otherwise
    /// the wrapped query error
    pub async fn entity_exists<E: Entity>(
        &self,
        ctx: &QueryContext,
        key: &E::Key,
    ) -> DatabaseResult<bool> {
        let span = operation_span("exists", E::NAME);
        key.validate()?;
        attach_ids(&span, &key.ids());

        let query = E::query_builder(self.builder()).build_exists_query(key);
        let mut querier = self.handle();
        perform_boolean_query(ctx, querier.as_mut(), &query)
            .await
            .map_err(|e| {
                prepare_error(e, &span, &format!("performing {} existence check", E::NAME))
            })
    }

    /// Fetch the keyed row
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for the first zero key id,
    /// [`DatabaseError::NoRows`] unwrapped when nothing matches, otherwise the
    /// wrapped query or scan error
    pub async fn get_entity<E: Entity>(&self, ctx: &QueryContext, key: &E::Key) -> DatabaseResult<E> {
        let span = operation_span("get", E::NAME);
        key.validate()?;
        attach_ids(&span, &key.ids());

        let query = E::query_builder(self.builder()).build_get_query(key);
        let mut querier = self.handle();
        let row = match get_one_row(ctx, querier.as_mut(), E::NAME, &query).await.scan() {
            Ok(row) => row,
            Err(DatabaseError::NoRows) => {
                note(&span, "no matching row");
                return Err(DatabaseError::NoRows);
            }
            Err(e) => return Err(prepare_error(e, &span, &format!("fetching {}", E::NAME))),
        };

        E::scan(&row, false)
            .map(|scanned| scanned.value)
            .map_err(|e| prepare_error(e, &span, &format!("scanning {}", E::NAME)))
    }

    /// Count non-archived rows
    ///
    /// # Errors
    ///
    /// Returns the wrapped query or scan error
    pub async fn get_all_entities_count<E: Entity>(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        let span = operation_span("count", E::NAME);
        let query = E::query_builder(self.builder()).build_get_all_count_query();
        let mut querier = self.handle();
        perform_count_query(ctx, querier.as_mut(), &query)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("fetching count of {} rows", E::NAME)))
    }

    fn entity_stream_source<E: Entity>() -> StreamSource {
        let count_query: CountQueryFn =
            |builder| E::query_builder(builder).build_get_all_count_query();
        let batch_query: BatchQueryFn =
            |builder, begin, end| E::query_builder(builder).build_get_batch_query(begin, end);
        StreamSource {
            label: E::NAME,
            count_query,
            batch_query,
        }
    }

    /// Stream every non-archived row to `sink` in parallel batches
    ///
    /// Returns once the batch tasks are spawned. A zero batch size uses the
    /// configured default.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilInput`] without a sink, otherwise the
    /// wrapped count query error; batch failures are only logged
    pub async fn get_all_entities<E: Entity>(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<E>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.stream_rows(ctx, Self::entity_stream_source::<E>(), sink, batch_size)
            .await
    }

    /// Stream every non-archived row to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilInput`] without a sink, otherwise the
    /// wrapped count query error; batch failures are in the report
    pub async fn get_all_entities_joined<E: Entity>(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<E>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.stream_rows_joined(ctx, Self::entity_stream_source::<E>(), sink, batch_size)
            .await
    }

    /// Fetch one filtered page within `scope`
    ///
    /// Archived rows are only included when the filter asks for them. Without
    /// a filter the page reports page and limit as zero.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for the first zero scope id,
    /// otherwise the wrapped query or scan error
    pub async fn get_entities<E: Entity>(
        &self,
        ctx: &QueryContext,
        scope: &E::Scope,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<E>> {
        let span = operation_span("list", E::NAME);
        scope.validate()?;
        attach_ids(&span, &scope.ids());

        let include_archived = filter.is_some_and(|f| f.include_archived);
        let query =
            E::query_builder(self.builder()).build_get_list_query(scope, include_archived, filter);
        let mut querier = self.handle();
        let rows = get_rows(ctx, querier.as_mut(), E::NAME, &query)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("fetching {} rows", E::NAME)))?;
        let scanned = scan_rows::<E>(rows, true)
            .map_err(|e| prepare_error(e, &span, &format!("scanning {} rows", E::NAME)))?;

        let mut page = ListPage::for_filter(filter);
        page.items = scanned.items;
        page.filtered_count = scanned.filtered_count;
        page.total_count = scanned.total_count;
        Ok(page)
    }

    /// Fetch up to `limit` rows by id; a zero limit uses the configured default
    ///
    /// An empty id list returns no rows without touching the database.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for the first zero owner id,
    /// otherwise the wrapped query or scan error
    pub async fn get_entities_with_ids<E: Entity>(
        &self,
        ctx: &QueryContext,
        owner: &E::Owner,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<E>> {
        let span = operation_span("get with ids", E::NAME);
        owner.validate()?;
        attach_ids(&span, &owner.ids());
        if ids.is_empty() {
            note(&span, "no ids requested");
            return Ok(Vec::new());
        }

        let limit = if limit == 0 {
            self.config().default_list_limit
        } else {
            limit
        };
        let query = E::query_builder(self.builder()).build_get_with_ids_query(owner, limit, ids);
        let mut querier = self.handle();
        let rows = get_rows(ctx, querier.as_mut(), E::NAME, &query)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("fetching {} rows by id", E::NAME)))?;
        scan_rows::<E>(rows, false)
            .map(|scanned| scanned.items)
            .map_err(|e| prepare_error(e, &span, &format!("scanning {} rows", E::NAME)))
    }

    /// Insert a row and its creation audit entry in one transaction
    ///
    /// The returned record carries the new id and the clock's `created_on`;
    /// columns the database fills in (such as `external_id`) stay empty.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilInput`] without input,
    /// [`DatabaseError::InvalidId`] for a zero actor, otherwise the wrapped
    /// error of whichever step failed
    pub async fn create_entity<E: Entity>(
        &self,
        ctx: &QueryContext,
        input: Option<&E::CreationInput>,
        created_by: u64,
    ) -> DatabaseResult<E> {
        let span = operation_span("create", E::NAME);
        let input = input.ok_or(DatabaseError::nil_input("creation input"))?;
        if created_by == 0 {
            return Err(DatabaseError::invalid_id("created_by"));
        }
        attach_actor(&span, created_by);
        debug!(parent: &span, ?input, "creating record");

        let query = E::query_builder(self.builder()).build_create_query(input);
        let mut guard = TransactionGuard::begin(ctx, self.db())
            .await
            .map_err(|e| prepare_error(e, &span, "beginning transaction"))?;

        let written = perform_write_query(
            ctx,
            guard.executor()?,
            self.config().id_strategy,
            E::NAME,
            &query,
        )
        .await;
        let id = guard
            .rollback_on_error(written)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("creating {}", E::NAME)))?;
        attach_ids(&span, &[(E::RESOURCE.id_key(), id)]);

        let created = E::from_creation_input(input, id, self.now());
        let entry = audit::build_entity_creation_event_entry(&created, created_by);
        self.create_audit_log_entry_in_transaction(ctx, Some(&mut guard), Some(&entry))
            .await
            .map_err(|e| {
                prepare_error(
                    e,
                    &span,
                    &format!("writing {} creation audit log entry", E::NAME),
                )
            })?;

        guard.commit(ctx).await.map_err(|e| {
            prepare_error(e, &span, &format!("committing {} creation transaction", E::NAME))
        })?;

        info!(parent: &span, id, "{} created", E::NAME);
        Ok(created)
    }

    /// Update a row and record the changed fields in one transaction
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilInput`] without a record,
    /// [`DatabaseError::InvalidId`] for a zero actor, otherwise the wrapped
    /// error of whichever step failed
    pub async fn update_entity<E: Entity>(
        &self,
        ctx: &QueryContext,
        updated: Option<&E>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        let span = operation_span("update", E::NAME);
        let updated = updated.ok_or(DatabaseError::nil_input("updated record"))?;
        if changed_by == 0 {
            return Err(DatabaseError::invalid_id("changed_by"));
        }
        attach_ids(&span, &[(E::RESOURCE.id_key(), updated.id())]);
        attach_actor(&span, changed_by);

        let query = E::query_builder(self.builder()).build_update_query(updated);
        let mut guard = TransactionGuard::begin(ctx, self.db())
            .await
            .map_err(|e| prepare_error(e, &span, "beginning transaction"))?;

        let written =
            perform_write_query_ignoring_return(ctx, guard.executor()?, E::NAME, &query).await;
        guard
            .rollback_on_error(written)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("updating {}", E::NAME)))?;

        let entry = audit::build_entity_update_event_entry::<E>(updated.id(), changed_by, changes);
        self.create_audit_log_entry_in_transaction(ctx, Some(&mut guard), Some(&entry))
            .await
            .map_err(|e| {
                prepare_error(e, &span, &format!("writing {} update audit log entry", E::NAME))
            })?;

        guard.commit(ctx).await.map_err(|e| {
            prepare_error(e, &span, &format!("committing {} update transaction", E::NAME))
        })?;

        info!(parent: &span, "{} updated", E::NAME);
        Ok(())
    }

    /// Archive the keyed row and record who did it in one transaction
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for the first zero key id or a
    /// zero actor, otherwise the wrapped error of whichever step failed
    pub async fn archive_entity<E: Entity>(
        &self,
        ctx: &QueryContext,
        key: &E::ArchiveKey,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let span = operation_span("archive", E::NAME);
        key.validate()?;
        if archived_by == 0 {
            return Err(DatabaseError::invalid_id("archived_by"));
        }
        attach_ids(&span, &key.ids());
        attach_actor(&span, archived_by);

        let query = E::query_builder(self.builder()).build_archive_query(key);
        let mut guard = TransactionGuard::begin(ctx, self.db())
            .await
            .map_err(|e| prepare_error(e, &span, "beginning transaction"))?;

        let written =
            perform_write_query_ignoring_return(ctx, guard.executor()?, E::NAME, &query).await;
        guard
            .rollback_on_error(written)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("archiving {}", E::NAME)))?;

        let entry = audit::build_entity_archive_event_entry::<E>(key, archived_by);
        self.create_audit_log_entry_in_transaction(ctx, Some(&mut guard), Some(&entry))
            .await
            .map_err(|e| {
                prepare_error(e, &span, &format!("writing {} archive audit log entry", E::NAME))
            })?;

        guard.commit(ctx).await.map_err(|e| {
            prepare_error(e, &span, &format!("committing {} archive transaction", E::NAME))
        })?;

        info!(parent: &span, "{} archived", E::NAME);
        Ok(())
    }

    /// Audit entries recorded for the row with `id`
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] for a zero id, otherwise the
    /// wrapped query or scan error
    pub async fn get_audit_log_entries_for_entity<E: Entity>(
        &self,
        ctx: &QueryContext,
        id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        let span = operation_span("audit log entries", E::NAME);
        if id == 0 {
            return Err(DatabaseError::invalid_id(E::RESOURCE.id_key()));
        }
        attach_ids(&span, &[(E::RESOURCE.id_key(), id)]);

        let query = E::query_builder(self.builder()).build_audit_log_entries_query(id);
        let mut querier = self.handle();
        let rows = get_rows(ctx, querier.as_mut(), E::NAME, &query)
            .await
            .map_err(|e| {
                prepare_error(e, &span, &format!("fetching audit log entries for {}", E::NAME))
            })?;
        scan_rows::<AuditLogEntry>(rows, false)
            .map(|scanned| scanned.items)
            .map_err(|e| prepare_error(e, &span, "scanning audit log entries"))
    }

    /// Rows whose name matches `name`
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::EmptyInput`] for an empty name, otherwise the
    /// wrapped query or scan error
    pub async fn search_entities_by_name<E: NameSearchable>(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<Vec<E>> {
        let span = operation_span("search by name", E::NAME);
        if name.is_empty() {
            return Err(DatabaseError::empty_input("name"));
        }

        let query = E::name_query_builder(self.builder()).build_search_by_name_query(name);
        let mut querier = self.handle();
        let rows = get_rows(ctx, querier.as_mut(), E::NAME, &query)
            .await
            .map_err(|e| prepare_error(e, &span, &format!("searching {} rows by name", E::NAME)))?;
        scan_rows::<E>(rows, false)
            .map(|scanned| scanned.items)
            .map_err(|e| prepare_error(e, &span, &format!("scanning {} rows", E::NAME)))
    }

    /// Id of the row named exactly `name`
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::EmptyInput`] for an empty name,
    /// [`DatabaseError::NoRows`] unwrapped when nothing matches, otherwise the
    /// wrapped query or scan error
    pub async fn get_entity_id_for_name<E: NameSearchable>(
        &self,
        ctx: &QueryContext,
        name: &str,
    ) -> DatabaseResult<u64> {
        let span = operation_span("id for name", E::NAME);
        if name.is_empty() {
            return Err(DatabaseError::empty_input("name"));
        }

        let query = E::name_query_builder(self.builder()).build_get_id_for_name_query(name);
        let mut querier = self.handle();
        match get_one_row(ctx, querier.as_mut(), E::NAME, &query).await.scan() {
            Ok(row) => row
                .reader()
                .read_u64()
                .map_err(|e| prepare_error(e, &span, &format!("scanning {} id", E::NAME))),
            Err(DatabaseError::NoRows) => {
                note(&span, "no row with that name");
                Err(DatabaseError::NoRows)
            }
            Err(e) => Err(prepare_error(
                e,
                &span,
                &format!("fetching {} id for name", E::NAME),
            )),
        }
    }
}

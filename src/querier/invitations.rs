// ABOUTME: Invitation persistence: descriptor, row scanning, and the invitation data-manager contract
// ABOUTME: Invitations belong to an account; archive and bulk fetch are scoped by that account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::DatabaseResult;
use larder_core::models::{
    AuditLogEntry, AuditResource, FieldChangeSummary, Invitation, InvitationCreationInput,
};
use larder_core::pagination::{ListPage, QueryFilter};
use tokio::sync::mpsc::Sender;

use super::{id_set, AccountScope, BatchStreamReport, Entity, Scannable, Scanned, SqlQuerier};
use crate::context::QueryContext;
use crate::database::Row;
use crate::querybuilding::{EntitySqlQueryBuilder, SqlQueryBuilder};

id_set! {
    /// Identifies one invitation
    InvitationKey { invitation_id }
}

id_set! {
    /// Identifies the invitation to archive within its account
    InvitationArchiveKey { invitation_id, account_id }
}

impl Scannable for Invitation {
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>> {
        let mut reader = row.reader();
        let invitation = Self {
            id: reader.read_u64()?,
            external_id: reader.read_string()?,
            code: reader.read_string()?,
            consumed: reader.read_bool()?,
            created_on: reader.read_u64()?,
            last_updated_on: reader.read_optional_u64()?,
            archived_on: reader.read_optional_u64()?,
            belongs_to_account: reader.read_u64()?,
        };
        Scanned::finish(invitation, &mut reader, include_counts)
    }
}

impl Entity for Invitation {
    const NAME: &'static str = "invitation";
    const RESOURCE: AuditResource = AuditResource::Invitation;

    type Key = InvitationKey;
    type Scope = ();
    type Owner = AccountScope;
    type ArchiveKey = InvitationArchiveKey;
    type CreationInput = InvitationCreationInput;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self {
        Self {
            id,
            external_id: String::new(),
            code: input.code.clone(),
            consumed: false,
            created_on,
            last_updated_on: None,
            archived_on: None,
            belongs_to_account: input.belongs_to_account,
        }
    }

    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self> {
        builder.invitations()
    }
}

/// Persistence contract for invitations
#[async_trait]
pub trait InvitationDataManager: Send + Sync {
    /// Whether the invitation exists
    async fn invitation_exists(&self, ctx: &QueryContext, invitation_id: u64)
        -> DatabaseResult<bool>;

    /// Fetch one invitation
    async fn get_invitation(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
    ) -> DatabaseResult<Invitation>;

    /// Count non-archived invitations
    async fn get_all_invitations_count(&self, ctx: &QueryContext) -> DatabaseResult<u64>;

    /// Stream every invitation to `sink` in parallel batches
    async fn get_all_invitations(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Invitation>>>,
        batch_size: u16,
    ) -> DatabaseResult<()>;

    /// Stream every invitation to `sink` and wait for every batch
    ///
    /// The sink is drained concurrently or holds every batch; otherwise a
    /// full sink blocks the batch tasks and this call never returns.
    async fn get_all_invitations_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Invitation>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport>;

    /// Fetch one filtered page of invitations
    async fn get_invitations(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<Invitation>>;

    /// Fetch an account's invitations by id
    async fn get_invitations_with_ids(
        &self,
        ctx: &QueryContext,
        account_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<Invitation>>;

    /// Create an invitation with its creation audit entry
    async fn create_invitation(
        &self,
        ctx: &QueryContext,
        input: Option<&InvitationCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<Invitation>;

    /// Update an invitation with its update audit entry
    async fn update_invitation(
        &self,
        ctx: &QueryContext,
        updated: Option<&Invitation>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()>;

    /// Archive an account's invitation with its archive audit entry
    async fn archive_invitation(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
        account_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()>;

    /// Audit entries recorded for an invitation
    async fn get_audit_log_entries_for_invitation(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>>;
}

#[async_trait]
impl InvitationDataManager for SqlQuerier {
    async fn invitation_exists(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
    ) -> DatabaseResult<bool> {
        self.entity_exists::<Invitation>(ctx, &InvitationKey { invitation_id })
            .await
    }

    async fn get_invitation(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
    ) -> DatabaseResult<Invitation> {
        self.get_entity(ctx, &InvitationKey { invitation_id }).await
    }

    async fn get_all_invitations_count(&self, ctx: &QueryContext) -> DatabaseResult<u64> {
        self.get_all_entities_count::<Invitation>(ctx).await
    }

    async fn get_all_invitations(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Invitation>>>,
        batch_size: u16,
    ) -> DatabaseResult<()> {
        self.get_all_entities(ctx, sink, batch_size).await
    }

    async fn get_all_invitations_joined(
        &self,
        ctx: &QueryContext,
        sink: Option<&Sender<Vec<Invitation>>>,
        batch_size: u16,
    ) -> DatabaseResult<BatchStreamReport> {
        self.get_all_entities_joined(ctx, sink, batch_size).await
    }

    async fn get_invitations(
        &self,
        ctx: &QueryContext,
        filter: Option<&QueryFilter>,
    ) -> DatabaseResult<ListPage<Invitation>> {
        self.get_entities(ctx, &(), filter).await
    }

    async fn get_invitations_with_ids(
        &self,
        ctx: &QueryContext,
        account_id: u64,
        limit: u8,
        ids: &[u64],
    ) -> DatabaseResult<Vec<Invitation>> {
        self.get_entities_with_ids(ctx, &AccountScope { account_id }, limit, ids)
            .await
    }

    async fn create_invitation(
        &self,
        ctx: &QueryContext,
        input: Option<&InvitationCreationInput>,
        created_by: u64,
    ) -> DatabaseResult<Invitation> {
        self.create_entity::<Invitation>(ctx, input, created_by).await
    }

    async fn update_invitation(
        &self,
        ctx: &QueryContext,
        updated: Option<&Invitation>,
        changed_by: u64,
        changes: &[FieldChangeSummary],
    ) -> DatabaseResult<()> {
        self.update_entity(ctx, updated, changed_by, changes).await
    }

    async fn archive_invitation(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
        account_id: u64,
        archived_by: u64,
    ) -> DatabaseResult<()> {
        let key = InvitationArchiveKey {
            invitation_id,
            account_id,
        };
        self.archive_entity::<Invitation>(ctx, &key, archived_by)
            .await
    }

    async fn get_audit_log_entries_for_invitation(
        &self,
        ctx: &QueryContext,
        invitation_id: u64,
    ) -> DatabaseResult<Vec<AuditLogEntry>> {
        self.get_audit_log_entries_for_entity::<Invitation>(ctx, invitation_id)
            .await
    }
}

// ABOUTME: Administrative operations: user reputation updates and best-effort account event logging
// ABOUTME: Event helpers write through the best-effort audit sink and never fail the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use larder_core::errors::{DatabaseError, DatabaseResult};
use larder_core::models::{AuditLogEntryCreationInput, UserReputationUpdateInput};
use tracing::info;

use super::SqlQuerier;
use crate::audit;
use crate::context::QueryContext;
use crate::database::perform_write_query_ignoring_return;
use crate::observability::{attach_ids, operation_span, prepare_error};

const USER_NAME: &str = "user";

/// Administrative user operations and account event logging
#[async_trait]
pub trait AdminUserDataManager: Send + Sync {
    /// Set a user's reputation outside any transaction
    ///
    /// No audit entry is written here; callers record the change themselves.
    async fn update_user_reputation(
        &self,
        ctx: &QueryContext,
        user_id: u64,
        input: Option<&UserReputationUpdateInput>,
    ) -> DatabaseResult<()>;

    /// Record a successful login
    async fn log_successful_login_event(&self, ctx: &QueryContext, user_id: u64);

    /// Record a login attempt by a banned user
    async fn log_banned_user_login_attempt_event(&self, ctx: &QueryContext, user_id: u64);

    /// Record a login rejected for a bad password
    async fn log_unsuccessful_login_bad_password_event(&self, ctx: &QueryContext, user_id: u64);

    /// Record a login rejected for a bad two-factor code
    async fn log_unsuccessful_login_bad_2fa_event(&self, ctx: &QueryContext, user_id: u64);

    /// Record a logout
    async fn log_logout_event(&self, ctx: &QueryContext, user_id: u64);

    /// Record a cookie secret rotation
    async fn log_cycle_cookie_secret_event(&self, ctx: &QueryContext, user_id: u64);

    /// Record `banned_by` banning `user_id`
    async fn log_user_ban_event(
        &self,
        ctx: &QueryContext,
        banned_by: u64,
        user_id: u64,
        reason: &str,
    );

    /// Record `terminated_by` terminating `household_id`
    async fn log_household_termination_event(
        &self,
        ctx: &QueryContext,
        terminated_by: u64,
        household_id: u64,
        reason: &str,
    );
}

impl SqlQuerier {
    async fn log_account_event(&self, ctx: &QueryContext, entry: AuditLogEntryCreationInput) {
        let mut querier = self.handle();
        self.create_audit_log_entry(ctx, Some(querier.as_mut()), Some(&entry))
            .await;
    }
}

#[async_trait]
impl AdminUserDataManager for SqlQuerier {
    async fn update_user_reputation(
        &self,
        ctx: &QueryContext,
        user_id: u64,
        input: Option<&UserReputationUpdateInput>,
    ) -> DatabaseResult<()> {
        let span = operation_span("update reputation", USER_NAME);
        if user_id == 0 {
            return Err(DatabaseError::invalid_id("user_id"));
        }
        let input = input.ok_or(DatabaseError::nil_input("reputation update"))?;
        attach_ids(&span, &[("user_id", user_id)]);

        let query = self.builder().users().build_set_user_reputation_query(input);
        let mut querier = self.handle();
        perform_write_query_ignoring_return(ctx, querier.as_mut(), USER_NAME, &query)
            .await
            .map_err(|e| prepare_error(e, &span, "setting user reputation"))?;

        info!(
            parent: &span,
            new_reputation = input.new_reputation.as_str(),
            "user reputation updated"
        );
        Ok(())
    }

    async fn log_successful_login_event(&self, ctx: &QueryContext, user_id: u64) {
        self.log_account_event(ctx, audit::build_successful_login_event_entry(user_id))
            .await;
    }

    async fn log_banned_user_login_attempt_event(&self, ctx: &QueryContext, user_id: u64) {
        self.log_account_event(
            ctx,
            audit::build_banned_user_login_attempt_event_entry(user_id),
        )
        .await;
    }

    async fn log_unsuccessful_login_bad_password_event(&self, ctx: &QueryContext, user_id: u64) {
        self.log_account_event(
            ctx,
            audit::build_unsuccessful_login_bad_password_event_entry(user_id),
        )
        .await;
    }

    async fn log_unsuccessful_login_bad_2fa_event(&self, ctx: &QueryContext, user_id: u64) {
        self.log_account_event(
            ctx,
            audit::build_unsuccessful_login_bad_2fa_event_entry(user_id),
        )
        .await;
    }

    async fn log_logout_event(&self, ctx: &QueryContext, user_id: u64) {
        self.log_account_event(ctx, audit::build_logout_event_entry(user_id))
            .await;
    }

    async fn log_cycle_cookie_secret_event(&self, ctx: &QueryContext, user_id: u64) {
        self.log_account_event(ctx, audit::build_cycle_cookie_secret_event_entry(user_id))
            .await;
    }

    async fn log_user_ban_event(
        &self,
        ctx: &QueryContext,
        banned_by: u64,
        user_id: u64,
        reason: &str,
    ) {
        self.log_account_event(
            ctx,
            audit::build_user_ban_event_entry(banned_by, user_id, reason),
        )
        .await;
    }

    async fn log_household_termination_event(
        &self,
        ctx: &QueryContext,
        terminated_by: u64,
        household_id: u64,
        reason: &str,
    ) {
        self.log_account_event(
            ctx,
            audit::build_household_termination_event_entry(terminated_by, household_id, reason),
        )
        .await;
    }
}

// ABOUTME: The querier: one value implementing every data-manager contract over a database handle
// ABOUTME: Holds the handle, the query builder, querier settings, and the clock stamped on created records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Querier
//!
//! [`SqlQuerier`] is the persistence layer's single entry point. Every
//! operation follows the same shape: open a span, validate arguments, ask the
//! builder for SQL, run it through the executor helpers, and wrap any failure
//! once with a description of what was being done.
//!
//! Writes run inside a [`TransactionGuard`](crate::database::TransactionGuard)
//! that also carries the matching audit log entry, so either both land or
//! neither does.
//!
//! Per-entity contracts ([`ApiClientDataManager`], [`ValidIngredientDataManager`]
//! and so on) are thin, named wrappers over the generic operations in
//! `generic.rs`, driven by each record's [`Entity`] descriptor.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use chrono::Utc;

use crate::config::QuerierConfig;
use crate::database::{DatabaseHandle, Querier};
use crate::querybuilding::SqlQueryBuilder;

mod admin;
mod api_clients;
mod audit_log_entries;
mod entity;
mod generic;
mod invitations;
mod recipe_step_products;
mod reports;
mod streaming;
mod valid_ingredient_preparations;
mod valid_ingredients;
mod valid_instruments;
mod valid_preparation_instruments;
mod valid_preparations;

pub use admin::AdminUserDataManager;
pub use api_clients::{ApiClientArchiveKey, ApiClientDataManager, ApiClientKey};
pub use audit_log_entries::{AuditLogEntryDataManager, AUDIT_LOG_ENTRY_NAME};
pub use entity::{
    AccountScope, Entity, IdSet, NameSearchable, Scannable, Scanned, UserScope,
};
pub(crate) use entity::id_set;
pub use invitations::{InvitationArchiveKey, InvitationDataManager, InvitationKey};
pub use recipe_step_products::{
    RecipeStepProductArchiveKey, RecipeStepProductDataManager, RecipeStepProductKey,
    RecipeStepProductOwner, RecipeStepProductScope,
};
pub use reports::{ReportArchiveKey, ReportDataManager, ReportKey};
pub use streaming::{BatchFailure, BatchStreamReport};
pub use valid_ingredient_preparations::{
    ValidIngredientPreparationDataManager, ValidIngredientPreparationKey,
};
pub use valid_ingredients::{ValidIngredientDataManager, ValidIngredientKey};
pub use valid_instruments::{ValidInstrumentDataManager, ValidInstrumentKey};
pub use valid_preparation_instruments::{
    ValidPreparationInstrumentDataManager, ValidPreparationInstrumentKey,
};
pub use valid_preparations::{ValidPreparationDataManager, ValidPreparationKey};

/// Source of the `created_on` stamp for records returned from create
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Wall clock in unix seconds
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(|| u64::try_from(Utc::now().timestamp()).unwrap_or_default())
}

/// Persistence layer over a database handle and a query builder
///
/// Cheap to clone; clones share the handle, builder, and clock.
#[derive(Clone)]
pub struct SqlQuerier {
    db: Arc<dyn DatabaseHandle>,
    builder: Arc<dyn SqlQueryBuilder>,
    config: QuerierConfig,
    clock: Clock,
}

impl SqlQuerier {
    /// Create a querier stamping records with the system clock
    #[must_use]
    pub fn new(
        db: Arc<dyn DatabaseHandle>,
        builder: Arc<dyn SqlQueryBuilder>,
        config: QuerierConfig,
    ) -> Self {
        Self {
            db,
            builder,
            config,
            clock: system_clock(),
        }
    }

    /// Replace the clock used for `created_on` on created records
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Querier settings
    #[must_use]
    pub const fn config(&self) -> &QuerierConfig {
        &self.config
    }

    /// Querier over the bare handle, for statements outside a transaction
    #[must_use]
    pub fn handle(&self) -> Box<dyn Querier> {
        self.db.querier()
    }

    pub(crate) fn db(&self) -> &dyn DatabaseHandle {
        self.db.as_ref()
    }

    pub(crate) fn builder(&self) -> &dyn SqlQueryBuilder {
        self.builder.as_ref()
    }

    pub(crate) fn now(&self) -> u64 {
        (self.clock)()
    }
}

impl Debug for SqlQuerier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlQuerier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

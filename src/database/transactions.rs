// ABOUTME: RAII transaction guard for write paths with rollback-on-error helpers
// ABOUTME: Rolls back on any post-begin error and warns when dropped uncommitted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transaction management with an RAII guard
//!
//! Every write path follows the same shape:
//!
//! ```text
//! let mut guard = TransactionGuard::begin(ctx, db.as_ref()).await?;
//! let result = perform_write_query(ctx, guard.executor()?, ...).await;
//! let id = guard.rollback_on_error(result).await?;
//! create_audit_log_entry_in_transaction(ctx, Some(&mut guard), Some(&entry)).await?;
//! guard.commit(ctx).await?;
//! ```
//!
//! - `rollback_on_error` rolls back and hands the original error back; a
//!   failing rollback is logged and never replaces the original error
//! - `commit` consumes the guard; a failed commit is not followed by a rollback,
//!   and a cancelled context turns the commit into an explicit rollback
//! - dropping an uncommitted guard logs a warning and lets the driver roll back

use larder_core::errors::{DatabaseError, DatabaseResult};
use tracing::{debug, error, warn};

use super::{DatabaseHandle, Querier, Transaction};
use crate::context::QueryContext;

/// Guard owning an in-progress transaction
pub struct TransactionGuard {
    transaction: Option<Box<dyn Transaction>>,
    committed: bool,
}

impl TransactionGuard {
    /// Wrap an already-begun transaction
    #[must_use]
    pub fn new(transaction: Box<dyn Transaction>) -> Self {
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Guard with no transaction; every use reports [`DatabaseError::NilTransaction`]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            transaction: None,
            committed: false,
        }
    }

    /// Begin a transaction on `db` under the caller's context
    ///
    /// # Errors
    ///
    /// Returns the begin error or [`DatabaseError::Cancelled`]
    pub async fn begin(ctx: &QueryContext, db: &dyn DatabaseHandle) -> DatabaseResult<Self> {
        let transaction = ctx.run(db.begin()).await?;
        debug!("transaction begun");
        Ok(Self::new(transaction))
    }

    /// Whether a transaction is still held
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// Check if the transaction has been committed
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Querier running statements inside the transaction
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilTransaction`] once the guard was committed or
    /// rolled back
    pub fn executor(&mut self) -> DatabaseResult<&mut dyn Querier> {
        self.transaction
            .as_deref_mut()
            .map(Transaction::as_querier)
            .ok_or(DatabaseError::NilTransaction)
    }

    /// Commit the transaction and consume the guard
    ///
    /// A token that already fired rolls the transaction back instead. Once
    /// started, the commit itself is not raced against the token.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NilTransaction`] if nothing is held,
    /// [`DatabaseError::Cancelled`] after rolling back, or the commit error
    pub async fn commit(mut self, ctx: &QueryContext) -> DatabaseResult<()> {
        if self.transaction.is_none() {
            return Err(DatabaseError::NilTransaction);
        }
        if ctx.is_cancelled() {
            warn!("context cancelled before commit, rolling back");
            self.rollback().await;
            return Err(DatabaseError::Cancelled);
        }
        let transaction = self
            .transaction
            .take()
            .ok_or(DatabaseError::NilTransaction)?;
        transaction.commit().await?;
        self.committed = true;
        debug!("transaction committed");
        Ok(())
    }

    /// Roll back the held transaction, logging rather than returning failures
    ///
    /// Not raced against the caller's cancellation token: the rollback is
    /// attempted even after the token fired.
    pub async fn rollback(&mut self) {
        let Some(transaction) = self.transaction.take() else {
            return;
        };
        match transaction.rollback().await {
            Ok(()) => debug!("transaction rolled back"),
            Err(e) => error!(error = %e, "rolling back transaction"),
        }
    }

    /// Pass `result` through, rolling back first if it is an error
    ///
    /// # Errors
    ///
    /// Returns the error contained in `result`
    pub async fn rollback_on_error<T>(&mut self, result: DatabaseResult<T>) -> DatabaseResult<T> {
        if result.is_err() {
            self.rollback().await;
        }
        result
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            warn!("TransactionGuard dropped without commit - transaction will be rolled back by the driver");
        }
    }
}

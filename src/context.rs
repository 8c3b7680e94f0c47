// ABOUTME: Ambient cancellation token threaded through every querier call
// ABOUTME: Races database futures against cancellation and reports DatabaseError::Cancelled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Call context
//!
//! A [`QueryContext`] is created by the caller of a querier operation and
//! passed by reference. Clones share the same token, so a context handed to
//! background batch tasks is cancelled together with the caller's.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use larder_core::errors::{DatabaseError, DatabaseResult};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cancellation token for querier calls
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    state: Arc<CancelState>,
}

impl QueryContext {
    /// Fresh, uncancelled context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    /// Whether the context has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Run `fut` unless the context is cancelled first
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Cancelled`] if the token fires before `fut`
    /// completes, otherwise whatever `fut` returns.
    pub async fn run<F, T>(&self, fut: F) -> DatabaseResult<T>
    where
        F: Future<Output = DatabaseResult<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(DatabaseError::Cancelled),
            result = fut => result,
        }
    }
}

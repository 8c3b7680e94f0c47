// ABOUTME: Span creation, identifier attachment, and error preparation for querier operations
// ABOUTME: Errors are recorded on the span, logged once, and wrapped with the operation label
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Observability helpers
//!
//! Each querier operation opens one span through [`operation_span`]. The span
//! doubles as the contextual logger: events emitted while it is entered (or
//! with `parent: &span`) carry its `operation`, `entity`, `ids` and `actor_id`
//! fields.

use std::fmt::Write as _;

use larder_core::errors::DatabaseError;
use tracing::field::{display, Empty};
use tracing::{debug, debug_span, error, Span};

/// Open the span for one querier operation
#[must_use]
pub fn operation_span(operation: &'static str, entity: &'static str) -> Span {
    debug_span!(
        "querier",
        operation,
        entity,
        ids = Empty,
        actor_id = Empty,
        batch_begin = Empty,
        batch_end = Empty,
        error = Empty,
        error.message = Empty,
    )
}

/// Render `name=value` pairs for the `ids` span field
#[must_use]
pub fn format_ids(ids: &[(&'static str, u64)]) -> String {
    let mut rendered = String::new();
    for (name, value) in ids {
        if !rendered.is_empty() {
            rendered.push(' ');
        }
        let _ = write!(rendered, "{name}={value}");
    }
    rendered
}

/// Attach identifier arguments to the span
pub fn attach_ids(span: &Span, ids: &[(&'static str, u64)]) {
    if !ids.is_empty() {
        span.record("ids", display(format_ids(ids)));
    }
}

/// Attach the acting user to the span
pub fn attach_actor(span: &Span, actor_id: u64) {
    span.record("actor_id", actor_id);
}

/// Attach a streaming batch range to the span
pub fn attach_batch_range(span: &Span, begin: u64, end: u64) {
    span.record("batch_begin", begin);
    span.record("batch_end", end);
}

/// Note a non-error condition on the span
pub fn note(span: &Span, message: &str) {
    debug!(parent: span, "{message}");
}

/// Record and log an error without changing it
pub fn log_error(err: &DatabaseError, span: &Span, description: &str) {
    span.record("error", true);
    span.record("error.message", display(err));
    error!(parent: span, error = %err, "{description}");
}

/// Record the error on the span, log it, and wrap it with `description`
#[must_use]
pub fn prepare_error(err: DatabaseError, span: &Span, description: &str) -> DatabaseError {
    log_error(&err, span, description);
    err.wrap(description)
}

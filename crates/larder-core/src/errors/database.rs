// ABOUTME: Database error taxonomy for querier operations and their executors
// ABOUTME: Sentinel kinds (invalid id, nil input, no rows) plus execute/scan failures and wrapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Database error types
//!
//! Every data-access operation returns [`DatabaseResult`]. Three kinds are
//! sentinels callers are expected to match on: [`DatabaseError::InvalidId`],
//! [`DatabaseError::NilInput`] and [`DatabaseError::NoRows`]. `NoRows` is kept
//! as a unit variant so it can be compared structurally, and read paths that
//! surface it return it without a wrapping layer.

use std::error::Error as StdError;

use thiserror::Error;

#[cfg(feature = "database-errors")]
use sqlx::Error as SqlxError;

/// Boxed error type carried by [`DatabaseError::Execute`]
pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by the persistence layer
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatabaseError {
    /// A required identifier argument was zero
    #[error("invalid id provided for {field}")]
    InvalidId {
        /// Name of the offending argument
        field: &'static str,
    },

    /// A required input (creation input, updated record, output sink) was absent
    #[error("nil input provided: {what}")]
    NilInput {
        /// Name of the missing input
        what: &'static str,
    },

    /// A required string input was empty
    #[error("empty input provided: {what}")]
    EmptyInput {
        /// Name of the empty input
        what: &'static str,
    },

    /// A helper that requires an in-progress transaction received none
    #[error("no transaction provided")]
    NilTransaction,

    /// The database returned no rows where one was expected
    #[error("no rows in result set")]
    NoRows,

    /// Any other failure from exec, query, begin, commit or rollback
    #[error("executing database statement: {context}")]
    Execute {
        /// What the driver reported
        context: String,
        /// Underlying driver error, when there is one
        #[source]
        source: Option<BoxedSource>,
    },

    /// Row decode, row iteration or row close failure
    #[error("scanning database row: {context}")]
    Scan {
        /// What went wrong while reading the row
        context: String,
    },

    /// The ambient cancellation token fired before the call finished
    #[error("database call cancelled")]
    Cancelled,

    /// An error annotated once at the operation boundary
    #[error("{description}: {source}")]
    Wrapped {
        /// Operation label describing what was being attempted
        description: String,
        /// The error being wrapped
        #[source]
        source: Box<Self>,
    },
}

/// Result alias for data-access operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl DatabaseError {
    /// Invalid id for the named argument
    #[must_use]
    pub const fn invalid_id(field: &'static str) -> Self {
        Self::InvalidId { field }
    }

    /// Missing required input
    #[must_use]
    pub const fn nil_input(what: &'static str) -> Self {
        Self::NilInput { what }
    }

    /// Empty required string input
    #[must_use]
    pub const fn empty_input(what: &'static str) -> Self {
        Self::EmptyInput { what }
    }

    /// Execution failure without an underlying driver error
    pub fn execute(context: impl Into<String>) -> Self {
        Self::Execute {
            context: context.into(),
            source: None,
        }
    }

    /// Execution failure caused by a driver error
    pub fn execute_with_source(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Execute {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Row scan failure
    pub fn scan(context: impl Into<String>) -> Self {
        Self::Scan {
            context: context.into(),
        }
    }

    /// Wrap this error with an operation description
    #[must_use]
    pub fn wrap(self, description: impl Into<String>) -> Self {
        Self::Wrapped {
            description: description.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any wrapping layers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Wrapped { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether this error is, or wraps, the no-rows sentinel
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self.root_cause(), Self::NoRows)
    }

    /// Whether this error is, or wraps, an invalid id
    #[must_use]
    pub fn is_invalid_id(&self) -> bool {
        matches!(self.root_cause(), Self::InvalidId { .. })
    }

    /// Whether this error is, or wraps, a missing input
    #[must_use]
    pub fn is_nil_input(&self) -> bool {
        matches!(self.root_cause(), Self::NilInput { .. })
    }

    /// Whether this error is, or wraps, a missing transaction
    #[must_use]
    pub fn is_nil_transaction(&self) -> bool {
        matches!(self.root_cause(), Self::NilTransaction)
    }

    /// Whether this error is, or wraps, a cancellation
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled)
    }
}

#[cfg(feature = "database-errors")]
impl From<SqlxError> for DatabaseError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::RowNotFound => Self::NoRows,
            SqlxError::ColumnDecode { .. }
            | SqlxError::ColumnNotFound(_)
            | SqlxError::ColumnIndexOutOfBounds { .. }
            | SqlxError::Decode(_) => Self::scan(error.to_string()),
            other => {
                let context = other.to_string();
                Self::execute_with_source(context, other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_root_cause() {
        let err = DatabaseError::NoRows.wrap("fetching API client");
        assert!(err.is_no_rows());
        assert!(!matches!(err, DatabaseError::NoRows));
        assert_eq!(err.to_string(), "fetching API client: no rows in result set");
    }

    #[test]
    fn invalid_id_names_the_argument() {
        let err = DatabaseError::invalid_id("recipe_step_id");
        assert!(err.is_invalid_id());
        assert_eq!(err.to_string(), "invalid id provided for recipe_step_id");
    }
}

// ABOUTME: Entity descriptor traits driving the generic CRUD operations
// ABOUTME: Id sets with left-to-right validation, row scanning, and per-entity builder selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Debug;

use larder_core::errors::{DatabaseError, DatabaseResult};
use larder_core::models::AuditResource;
use serde::Serialize;

use crate::database::{Row, RowReader};
use crate::querybuilding::{EntitySqlQueryBuilder, NameSearchSqlQueryBuilder, SqlQueryBuilder};

/// Identifier arguments of an operation, in signature order
pub trait IdSet: Debug + Send + Sync {
    /// `(argument name, value)` pairs, left to right
    fn ids(&self) -> Vec<(&'static str, u64)>;

    /// Reject the first zero id, scanning left to right
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidId`] naming the first zero argument
    fn validate(&self) -> DatabaseResult<()> {
        match self.ids().into_iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(DatabaseError::invalid_id(name)),
            None => Ok(()),
        }
    }
}

impl IdSet for () {
    fn ids(&self) -> Vec<(&'static str, u64)> {
        Vec::new()
    }
}

/// Declare a struct of named `u64` ids implementing [`IdSet`] in field order
macro_rules! id_set {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name {
            $(
                #[doc = concat!("`", stringify!($field), "` argument")]
                pub $field: u64,
            )+
        }

        impl $crate::querier::IdSet for $name {
            fn ids(&self) -> Vec<(&'static str, u64)> {
                vec![$((stringify!($field), self.$field)),+]
            }
        }
    };
}

pub(crate) use id_set;

id_set! {
    /// Scope or owner argument naming a user
    UserScope { user_id }
}

id_set! {
    /// Scope or owner argument naming an account (household)
    AccountScope { account_id }
}

/// A scanned row plus the list counts that trail it in list queries
#[derive(Debug, Clone, PartialEq)]
pub struct Scanned<T> {
    /// The decoded record
    pub value: T,
    /// Rows matching the list filter (zero outside list queries)
    pub filtered_count: u64,
    /// All non-archived rows (zero outside list queries)
    pub total_count: u64,
}

impl<T> Scanned<T> {
    /// Finish a scan, reading the trailing counts when requested
    ///
    /// # Errors
    ///
    /// Returns a scan error if the count columns are missing or malformed
    pub fn finish(value: T, reader: &mut RowReader<'_>, include_counts: bool) -> DatabaseResult<Self> {
        let (filtered_count, total_count) = if include_counts {
            (reader.read_u64()?, reader.read_u64()?)
        } else {
            (0, 0)
        };
        Ok(Self {
            value,
            filtered_count,
            total_count,
        })
    }
}

/// Types decodable from a result row
pub trait Scannable: Sized + Send + 'static {
    /// Decode a row; list queries carry `filtered_count, total_count` last
    ///
    /// # Errors
    ///
    /// Returns a scan error if the row does not match the column list
    fn scan(row: &Row, include_counts: bool) -> DatabaseResult<Scanned<Self>>;
}

/// Descriptor of one audited entity table
///
/// Generic operations on [`SqlQuerier`](super::SqlQuerier) are instantiated
/// from this: the id sets fix each operation's arguments (and their validation
/// order), `scan` fixes the column list, and `query_builder` picks the
/// entity's builder out of the aggregate.
pub trait Entity: Scannable + Serialize + Clone + Debug + Sync {
    /// Human-readable name used in logs and error descriptions
    const NAME: &'static str;
    /// Resource tag for audit events
    const RESOURCE: AuditResource;

    /// Arguments identifying one row for exists/get
    type Key: IdSet;
    /// Arguments scoping list queries
    type Scope: IdSet;
    /// Arguments scoping bulk fetches by id
    type Owner: IdSet;
    /// Arguments identifying one row for archive
    type ArchiveKey: IdSet;
    /// Caller-supplied fields for create
    type CreationInput: Debug + Send + Sync;

    /// Database id
    fn id(&self) -> u64;

    /// Record returned from create: input plus database id plus process time
    fn from_creation_input(input: &Self::CreationInput, id: u64, created_on: u64) -> Self;

    /// This entity's builder within the aggregate
    fn query_builder(builder: &dyn SqlQueryBuilder) -> &dyn EntitySqlQueryBuilder<Self>;
}

/// Entities that can be looked up by name
pub trait NameSearchable: Entity {
    /// This entity's name lookup builder within the aggregate
    fn name_query_builder(builder: &dyn SqlQueryBuilder) -> &dyn NameSearchSqlQueryBuilder<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    id_set! {
        StepProductKey { recipe_id, recipe_step_id, recipe_step_product_id }
    }

    #[test]
    fn validation_reports_first_zero_from_the_left() {
        let key = StepProductKey {
            recipe_id: 1,
            recipe_step_id: 0,
            recipe_step_product_id: 0,
        };
        let err = key.validate().unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::InvalidId {
                field: "recipe_step_id"
            }
        ));
    }

    #[test]
    fn unit_scope_has_no_ids() {
        assert!(().ids().is_empty());
        assert!(().validate().is_ok());
    }
}

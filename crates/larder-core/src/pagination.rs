// ABOUTME: Query filter and list page types for filtered entity listing
// ABOUTME: Zero-limit sentinel handling, offsets, and count-carrying result pages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Filters and pages for list operations
//!
//! A missing filter means "defaults". A `limit` of zero is a sentinel that
//! query builders replace with [`DEFAULT_QUERY_FILTER_LIMIT`].

use serde::{Deserialize, Serialize};

use crate::constants::limits::{DEFAULT_QUERY_FILTER_LIMIT, MAX_QUERY_FILTER_LIMIT};

/// Ordering applied to list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Oldest first
    #[default]
    Ascending,
    /// Newest first
    Descending,
}

/// Filter for list operations
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryFilter {
    /// One-based page number
    pub page: u64,
    /// Page size; zero selects the default
    pub limit: u8,
    /// Only rows created after this unix time
    pub created_after: Option<u64>,
    /// Only rows created before this unix time
    pub created_before: Option<u64>,
    /// Only rows updated after this unix time
    pub updated_after: Option<u64>,
    /// Only rows updated before this unix time
    pub updated_before: Option<u64>,
    /// Ordering by creation time
    pub sort_by: SortDirection,
    /// Include archived rows
    pub include_archived: bool,
}

impl QueryFilter {
    /// First page with the default limit
    #[must_use]
    pub const fn default_filter() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_QUERY_FILTER_LIMIT,
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            sort_by: SortDirection::Ascending,
            include_archived: false,
        }
    }

    /// Limit with the zero sentinel replaced and the maximum enforced
    #[must_use]
    pub fn effective_limit(&self) -> u8 {
        match self.limit {
            0 => DEFAULT_QUERY_FILTER_LIMIT,
            limit => limit.min(MAX_QUERY_FILTER_LIMIT),
        }
    }

    /// Row offset of the first row on this page, saturating for huge pages
    #[must_use]
    pub fn query_offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(u64::from(self.effective_limit()))
    }
}

/// A page of list results with the counts needed for pagination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Page as requested
    pub page: u64,
    /// Limit as requested
    pub limit: u8,
    /// Rows matching the filter
    pub filtered_count: u64,
    /// All non-archived rows
    pub total_count: u64,
}

impl<T> ListPage<T> {
    /// Empty page echoing the filter's page and limit, or zeros for no filter
    #[must_use]
    pub fn for_filter(filter: Option<&QueryFilter>) -> Self {
        let (page, limit) = filter.map_or((0, 0), |f| (f.page, f.limit));
        Self {
            items: Vec::new(),
            page,
            limit,
            filtered_count: 0,
            total_count: 0,
        }
    }
}

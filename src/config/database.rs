// ABOUTME: Database configuration types for SQLite and PostgreSQL connections
// ABOUTME: Handles connection URLs, pool sizing, and querier behaviour settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use larder_core::constants::limits::{DEFAULT_BATCH_SIZE, DEFAULT_QUERY_FILTER_LIMIT};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// `PostgreSQL` connection
    PostgreSQL {
        /// `PostgreSQL` connection string
        connection_string: String,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::config_invalid("database URL is empty"));
        }

        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str == ":memory:" {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            Ok(Self::PostgreSQL {
                connection_string: s.to_owned(),
            })
        } else {
            // Bare paths are SQLite files
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::PostgreSQL { connection_string } => connection_string.clone(),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Check if this is a `SQLite` database
    #[must_use]
    pub const fn is_sqlite(&self) -> bool {
        matches!(self, Self::SQLite { .. } | Self::Memory)
    }

    /// Check if this is a `PostgreSQL` database
    #[must_use]
    pub const fn is_postgresql(&self) -> bool {
        matches!(self, Self::PostgreSQL { .. })
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/larder.db"),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Connection pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections kept open
    pub min_connections: u32,
    /// Seconds to wait for a connection before giving up
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
        }
    }
}

impl PoolConfig {
    /// Load pool sizing from environment, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but not a valid number
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", defaults.min_connections)?,
            acquire_timeout_secs: env_or(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            )?,
        })
    }
}

/// How the database reports ids assigned by inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdStrategy {
    /// The insert carries a `RETURNING id` clause and yields one row
    Returning,
    /// The driver reports the last inserted row id
    LastInsertId,
}

impl IdStrategy {
    /// Strategy matching the database behind `url`
    #[must_use]
    pub const fn for_url(url: &DatabaseUrl) -> Self {
        if url.is_postgresql() {
            Self::Returning
        } else {
            Self::LastInsertId
        }
    }
}

/// Behaviour settings for the querier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerierConfig {
    /// How new ids are read back after inserts
    pub id_strategy: IdStrategy,
    /// Limit substituted when a bulk fetch passes zero
    pub default_list_limit: u8,
    /// Batch size substituted when streaming is asked for zero-row batches
    pub default_batch_size: u16,
    /// Upper bound on batch tasks running at once; `None` runs all of them
    pub stream_concurrency_limit: Option<usize>,
}

impl Default for QuerierConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Returning,
            default_list_limit: DEFAULT_QUERY_FILTER_LIMIT,
            default_batch_size: DEFAULT_BATCH_SIZE,
            stream_concurrency_limit: None,
        }
    }
}

impl QuerierConfig {
    /// Defaults suited to the database behind `url`
    #[must_use]
    pub fn for_url(url: &DatabaseUrl) -> Self {
        Self {
            id_strategy: IdStrategy::for_url(url),
            ..Self::default()
        }
    }

    /// Load querier settings from environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but not a valid number
    pub fn from_env(url: &DatabaseUrl) -> AppResult<Self> {
        let defaults = Self::for_url(url);
        let stream_concurrency_limit = match env::var("STREAM_CONCURRENCY_LIMIT") {
            Ok(raw) => Some(parse_env_value("STREAM_CONCURRENCY_LIMIT", &raw)?)
                .filter(|limit: &usize| *limit > 0),
            Err(_) => defaults.stream_concurrency_limit,
        };

        Ok(Self {
            id_strategy: defaults.id_strategy,
            default_list_limit: env_or("QUERY_DEFAULT_LIST_LIMIT", defaults.default_list_limit)?,
            default_batch_size: env_or("STREAM_DEFAULT_BATCH_SIZE", defaults.default_batch_size)?,
            stream_concurrency_limit,
        })
    }
}

/// Database connection and querier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (`SQLite` path or `PostgreSQL` connection string)
    pub url: DatabaseUrl,
    /// Connection pool sizing
    pub pool: PoolConfig,
    /// Querier behaviour
    pub querier: QuerierConfig,
}

impl DatabaseConfig {
    /// Configuration for a given URL with default pool and querier settings
    #[must_use]
    pub fn for_url(url: DatabaseUrl) -> Self {
        let querier = QuerierConfig::for_url(&url);
        Self {
            url,
            pool: PoolConfig::default(),
            querier,
        }
    }

    /// Load database configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if database environment variables are invalid
    pub fn from_env() -> AppResult<Self> {
        let url = match env::var("DATABASE_URL") {
            Ok(raw) => DatabaseUrl::parse_url(&raw)?,
            Err(_) => DatabaseUrl::default(),
        };
        Ok(Self {
            pool: PoolConfig::from_env()?,
            querier: QuerierConfig::from_env(&url)?,
            url,
        })
    }
}

fn env_or<T>(name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    env::var(name).map_or(Ok(default), |raw| parse_env_value(name, &raw))
}

fn parse_env_value<T>(name: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::config_invalid(format!("{name}={raw:?} is not valid: {e}")))
}

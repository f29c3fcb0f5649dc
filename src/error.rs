//! Error types for the fallible edges of the crate.
//!
//! The timeline calculation itself never fails; everything here belongs to
//! calendar construction, configuration loading and snapshot I/O.

use std::io;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("work calendar requires at least one working day")]
    NoWorkingDays,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("invalid config value for `{field}`: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Problems with the shape of a planning snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duplicate developer id '{0}'")]
    DuplicateDeveloper(String),

    #[error("duplicate item id '{0}'")]
    DuplicateItem(String),

    #[error("developer #{0} has an empty id")]
    EmptyDeveloperId(usize),

    #[error("item #{0} has an empty id")]
    EmptyItemId(usize),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

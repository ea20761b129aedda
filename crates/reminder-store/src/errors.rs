//! Error handling for reminder-store
//!
//! Classifies `rusqlite` failures into the core taxonomy and adds
//! store-specific helpers

use reminder_core::errors::{ExError, ExErrorKind};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Store-level failures that do not originate in SQLite itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Timed out after {waited_ms}ms waiting for a pooled connection")]
    PoolTimeout { waited_ms: u64 },

    #[error("Connection pool lock poisoned")]
    PoolPoisoned,

    #[error("Migration {migration_id} failed: {reason}")]
    MigrationFailed {
        migration_id: String,
        reason: String,
    },

    #[error("Checksum mismatch for migration {migration_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        migration_id: String,
        expected: String,
        actual: String,
    },

    #[error("Database records migration {migration_id}, which this build does not know")]
    UnknownMigration { migration_id: String },

    #[error("Stored timestamp {millis} in column {column} is out of range")]
    TimestampOutOfRange { column: &'static str, millis: i64 },
}

impl From<StoreError> for ExError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        let base = match &err {
            StoreError::PoolTimeout { .. } | StoreError::PoolPoisoned => {
                ExError::new(ExErrorKind::StoreUnavailable).with_op("acquire")
            }
            StoreError::MigrationFailed { migration_id, .. }
            | StoreError::ChecksumMismatch { migration_id, .. }
            | StoreError::UnknownMigration { migration_id } => {
                ExError::new(ExErrorKind::Migration)
                    .with_op("migration")
                    .with_entity_id(migration_id.clone())
            }
            StoreError::TimestampOutOfRange { .. } => ExError::new(ExErrorKind::DecodeFailure),
        };
        base.with_message(message)
    }
}

/// Classify a `rusqlite` error
///
/// Row-to-value conversion failures are `DecodeFailure`; everything else
/// (open, busy, locked, I/O, malformed SQL) is `StoreUnavailable`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::InvalidColumnIndex(_)
        | rusqlite::Error::InvalidColumnName(_)
        | rusqlite::Error::IntegralValueOutOfRange(..) => ExErrorKind::DecodeFailure,
        _ => ExErrorKind::StoreUnavailable,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

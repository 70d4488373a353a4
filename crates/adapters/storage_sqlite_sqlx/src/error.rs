//! Storage-layer error type.
//!
//! Everything that goes wrong between this adapter and `SQLite` funnels into
//! [`StorageError`], which services see as [`LumeqError::Storage`] — a
//! loop-level condition handled with backoff, never recorded on a command
//! row.

use lumeq_domain::error::LumeqError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to deserialize a stored JSON value.
    #[error("JSON deserialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for LumeqError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_surface_storage_failures_as_lumeq_storage_errors() {
        let err: LumeqError = StorageError::Database(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, LumeqError::Storage(_)));
    }

    #[test]
    fn should_keep_the_source_chain_intact() {
        let err: LumeqError = StorageError::Database(sqlx::Error::PoolClosed).into();
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "database error");
    }
}

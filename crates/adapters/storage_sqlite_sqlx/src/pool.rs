//! Connection pool setup and embedded migrations.
//!
//! The database file is the shared coordination point for every worker, so
//! setup is deliberately strict: the pool is built once at process start,
//! the file is created on first run, and all pending migrations are applied
//! before any worker touches a table.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::StorageError;

/// Configuration for the `SQLite` storage adapter.
pub struct Config {
    /// Connection URL, e.g. `sqlite:lumeq.db?mode=rwc` or `sqlite::memory:`.
    pub database_url: String,
}

impl Config {
    /// Read configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `LUMEQ_DATABASE_URL` is not set.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            database_url: std::env::var("LUMEQ_DATABASE_URL")?,
        })
    }

    /// Open the database: connect, create the file if missing, and bring the
    /// schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the connection or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let options =
            SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Database { pool })
    }
}

/// Holds the `SQLite` connection pool and provides access to it.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

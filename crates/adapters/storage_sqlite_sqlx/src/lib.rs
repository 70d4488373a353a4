//! # lumeq-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the queue, button-event, and directory port traits defined in
//!   `lumeq-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `lumeq-app` (for port traits) and `lumeq-domain` (for domain
//! types). The `app` and `domain` crates must never reference this adapter.

mod button_events;
mod command_queue;
mod directory;
mod error;
mod pool;

pub use button_events::SqliteButtonEventRepository;
pub use command_queue::SqliteCommandQueue;
pub use directory::{SqliteDeviceDirectory, SqliteGroupDirectory};
pub use error::StorageError;
pub use pool::{Config, Database};

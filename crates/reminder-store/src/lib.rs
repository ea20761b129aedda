//! Reminder Store - SQLite persistence for reminder items
//!
//! Provides:
//! - Connection opening and configuration (WAL, busy timeout)
//! - Embedded schema migrations with checksums
//! - A bounded connection pool with scoped acquisition
//! - `SqliteItemStore`, the SQLite implementation of `ItemStore`

pub mod db;
pub mod errors;
pub mod migrations;
pub mod pool;
pub mod repo;

// Re-export key types
pub use errors::{Result, StoreError};
pub use pool::{ConnectionPool, PoolOptions, PoolStatus, PooledConnection};
pub use repo::SqliteItemStore;

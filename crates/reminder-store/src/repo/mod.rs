//! Repository layer persisting reminder items to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteItemStore;

//! Migration framework
//!
//! Provides:
//! - Migration runner with checksums and unknown-migration detection
//! - Idempotent application, one transaction per migration
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use runner::{apply_migrations, applied_migrations};

//! Command orchestration layer.
//!
//! Coordinates the core list engine and write path with the persistence
//! layer. Every public operation is bracketed by structured start / end
//! events.

#![allow(clippy::result_large_err)]

pub mod item_command;
pub mod list_service;

use std::sync::Arc;
use std::time::Instant;

use reminder_core::config::AppConfig;
use reminder_core::errors::Result;
use reminder_core::{log_op_end, log_op_error};
use reminder_store::SqliteItemStore;

use crate::commands::item_command::ItemService;
use crate::commands::list_service::ListService;

/// Store handle shared by the list and command surfaces
pub type SharedStore = Arc<SqliteItemStore>;

/// Both service surfaces over one SQLite store
pub struct Services {
    pub list: ListService<SharedStore>,
    pub items: ItemService<SharedStore>,
    pub store: SharedStore,
}

impl Services {
    /// Open (and migrate) the configured database and wire the services
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` or `Migration` from opening the database.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store: SharedStore = Arc::new(SqliteItemStore::from_config(&config.database)?);
        Ok(Self {
            list: ListService::new(Arc::clone(&store), &config.list),
            items: ItemService::new(Arc::clone(&store)),
            store,
        })
    }
}

/// Run `f`, emitting the end / end_error event for `op` with its duration
///
/// The caller emits the start event so it can attach request fields.
pub(crate) fn finish_logged<T>(
    op: &'static str,
    start: Instant,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let result = f();
    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => log_op_end!(op, duration_ms = elapsed),
        Err(e) => log_op_error!(op, e.clone(), duration_ms = elapsed),
    }
    result
}

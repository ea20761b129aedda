//! Reminder Engine - Orchestration layer
//!
//! Provides the list surface (`ListService`) and the item command surface
//! (`ItemService`) over any `ItemStore`, plus `Services::open` wiring both
//! to the configured SQLite database.

pub mod commands;

pub use commands::item_command::{ItemCommand, ItemCommandResult, ItemService};
pub use commands::list_service::ListService;
pub use commands::{Services, SharedStore};

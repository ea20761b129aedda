//! Reminder Core - list engine and domain kernel of the reminder service
//!
//! This crate provides:
//! - The `Item` model and its write payloads
//! - The Page Query Builder (filter flavors, bound predicates, fixed ordering)
//! - The Pagination Engine and its `PageResult` envelope
//! - The `ItemStore` interface plus an in-memory implementation
//! - Error, logging, configuration and call-context facilities shared by the
//!   other reminder crates

pub mod config;
pub mod context;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod pagination;
pub mod query;
pub mod store;

// Used by the logging macros
#[doc(hidden)]
pub use tracing as __tracing;
pub use reminder_core_types;

// Re-export commonly used types
pub use config::AppConfig;
pub use context::{CallContext, CancelToken};
pub use errors::{ExError, ExErrorKind, ReminderError, Result};
pub use model::{Item, ItemId, ItemUpdate, NewItem, StatusUpdate};
pub use pagination::{PageResult, PaginationEngine, NO_CURSOR};
pub use query::{ListFilter, PagePlan, PageQueryBuilder, PageRequest};
pub use store::ItemStore;

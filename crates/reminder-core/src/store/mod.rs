//! Item Store interface
//!
//! The engine and the command surface talk to persistence only through
//! `ItemStore`. `reminder-store` provides the SQLite implementation;
//! `memory::MemoryItemStore` is an in-process implementation for tests and
//! embedding.

pub mod memory;

use crate::context::CallContext;
use crate::errors::Result;
use crate::model::{Item, ItemId, ItemUpdate, NewItem, StatusUpdate};
use crate::query::{PagePlan, PredicateSet};

/// Item persistence
///
/// Implementations must be safe to share across threads and must honour the
/// `CallContext` on every call: check it before doing work and while reading
/// rows, and return `Cancelled` without partial results when it trips.
#[allow(clippy::result_large_err)]
pub trait ItemStore: Send + Sync {
    /// Execute a page plan, returning at most `plan.fetch_limit()` items in
    /// plan order
    ///
    /// # Errors
    ///
    /// `StoreUnavailable`, `DecodeFailure` or `Cancelled`.
    fn query(&self, plan: &PagePlan, ctx: &CallContext) -> Result<Vec<Item>>;

    /// Number of items matching `predicates`
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` or `Cancelled`.
    fn count(&self, predicates: &PredicateSet, ctx: &CallContext) -> Result<u64>;

    /// Insert a new, open item and return it with its assigned id
    ///
    /// Id assignment and `created_at` must be atomic: the stored
    /// `created_at` is at least that of every existing item. Paging by
    /// `id < cursor` relies on it.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` or `Cancelled`.
    fn insert(&self, item: &NewItem, ctx: &CallContext) -> Result<Item>;

    /// # Errors
    ///
    /// `StoreUnavailable`, `DecodeFailure` or `Cancelled`.
    fn get(&self, id: ItemId, ctx: &CallContext) -> Result<Option<Item>>;

    /// # Errors
    ///
    /// `NotFound` when no item has `id`; otherwise as for `insert`.
    fn update(&self, id: ItemId, update: &ItemUpdate, ctx: &CallContext) -> Result<()>;

    /// # Errors
    ///
    /// `NotFound` when no item has `id`; otherwise as for `insert`.
    fn update_status(&self, id: ItemId, status: &StatusUpdate, ctx: &CallContext) -> Result<()>;

    /// # Errors
    ///
    /// `NotFound` when no item has `id`; otherwise as for `insert`.
    fn delete(&self, id: ItemId, ctx: &CallContext) -> Result<()>;
}

impl<S: ItemStore + ?Sized> ItemStore for std::sync::Arc<S> {
    fn query(&self, plan: &PagePlan, ctx: &CallContext) -> Result<Vec<Item>> {
        (**self).query(plan, ctx)
    }

    fn count(&self, predicates: &PredicateSet, ctx: &CallContext) -> Result<u64> {
        (**self).count(predicates, ctx)
    }

    fn insert(&self, item: &NewItem, ctx: &CallContext) -> Result<Item> {
        (**self).insert(item, ctx)
    }

    fn get(&self, id: ItemId, ctx: &CallContext) -> Result<Option<Item>> {
        (**self).get(id, ctx)
    }

    fn update(&self, id: ItemId, update: &ItemUpdate, ctx: &CallContext) -> Result<()> {
        (**self).update(id, update, ctx)
    }

    fn update_status(&self, id: ItemId, status: &StatusUpdate, ctx: &CallContext) -> Result<()> {
        (**self).update_status(id, status, ctx)
    }

    fn delete(&self, id: ItemId, ctx: &CallContext) -> Result<()> {
        (**self).delete(id, ctx)
    }
}

//! Item command surface (write path).

#![allow(clippy::result_large_err)]

use std::time::Instant;

use chrono::{DateTime, Utc};
use reminder_core::context::CallContext;
use reminder_core::errors::{ExError, ReminderError, Result};
use reminder_core::log_op_start;
use reminder_core::model::{Item, ItemId, ItemUpdate, NewItem, StatusUpdate};
use reminder_core::store::ItemStore;
use serde::Serialize;

use crate::commands::finish_logged;

/// Write-path commands, as dispatched by `ItemService::apply`
#[derive(Debug, Clone)]
pub enum ItemCommand {
    Create(NewItem),
    Update { id: ItemId, update: ItemUpdate },
    /// Complete (`completed = true`) or reopen an item. `finished_at`
    /// defaults to now when completing and is ignored when reopening.
    SetStatus {
        id: ItemId,
        completed: bool,
        finished_at: Option<DateTime<Utc>>,
    },
    Delete { id: ItemId },
}

/// Result of applying an item command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ItemCommandResult {
    /// The item as stored after the command
    Item(Item),
    Deleted { id: ItemId },
}

pub struct ItemService<S> {
    store: S,
}

impl<S: ItemStore> ItemService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// # Errors
    ///
    /// Whatever the dispatched operation returns.
    pub fn apply(&self, cmd: ItemCommand, ctx: &CallContext) -> Result<ItemCommandResult> {
        match cmd {
            ItemCommand::Create(new_item) => self.create(new_item, ctx).map(ItemCommandResult::Item),
            ItemCommand::Update { id, update } => {
                self.update(id, update, ctx).map(ItemCommandResult::Item)
            }
            ItemCommand::SetStatus {
                id,
                completed,
                finished_at,
            } => self
                .set_status(id, completed, finished_at, ctx)
                .map(ItemCommandResult::Item),
            ItemCommand::Delete { id } => self
                .delete(id, ctx)
                .map(|()| ItemCommandResult::Deleted { id }),
        }
    }

    /// # Errors
    ///
    /// `InvalidInput` for an empty description, otherwise store errors.
    pub fn create(&self, new_item: NewItem, ctx: &CallContext) -> Result<Item> {
        log_op_start!("item_create", request_id = ctx.request().request_id.as_str());
        finish_logged("item_create", Instant::now(), || {
            validate_description("item_create", &new_item.description)?;
            self.store.insert(&new_item, ctx)
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no item has `id`, otherwise store errors.
    pub fn get(&self, id: ItemId, ctx: &CallContext) -> Result<Item> {
        log_op_start!("item_get", item_id = id);
        finish_logged("item_get", Instant::now(), || self.fetch("item_get", id, ctx))
    }

    /// Replace description and completion state
    ///
    /// Completion is normalised the same way as `set_status`: a completed
    /// item without `finished_at` is stamped now, a reopened one is cleared.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty description, `NotFound` when no item has
    /// `id`, otherwise store errors.
    pub fn update(&self, id: ItemId, mut update: ItemUpdate, ctx: &CallContext) -> Result<Item> {
        log_op_start!("item_update", item_id = id);
        finish_logged("item_update", Instant::now(), || {
            validate_description("item_update", &update.description)?;
            update.finished_at = finished_at_for(update.completed, update.finished_at);
            self.store.update(id, &update, ctx)?;
            self.fetch("item_update", id, ctx)
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no item has `id`, otherwise store errors.
    pub fn set_status(
        &self,
        id: ItemId,
        completed: bool,
        finished_at: Option<DateTime<Utc>>,
        ctx: &CallContext,
    ) -> Result<Item> {
        log_op_start!("item_set_status", item_id = id, completed = completed);
        finish_logged("item_set_status", Instant::now(), || {
            let status = match finished_at_for(completed, finished_at) {
                Some(at) => StatusUpdate::completed_at(at),
                None => StatusUpdate::reopened(),
            };
            self.store.update_status(id, &status, ctx)?;
            self.fetch("item_set_status", id, ctx)
        })
    }

    /// # Errors
    ///
    /// `NotFound` when no item has `id`, otherwise store errors.
    pub fn delete(&self, id: ItemId, ctx: &CallContext) -> Result<()> {
        log_op_start!("item_delete", item_id = id);
        finish_logged("item_delete", Instant::now(), || self.store.delete(id, ctx))
    }

    fn fetch(&self, op: &str, id: ItemId, ctx: &CallContext) -> Result<Item> {
        self.store
            .get(id, ctx)?
            .ok_or_else(|| ExError::from(ReminderError::ItemNotFound { id }).with_op(op))
    }
}

fn validate_description(op: &str, description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(ExError::from(ReminderError::EmptyDescription).with_op(op));
    }
    Ok(())
}

/// `finished_at` to store for a completion state
fn finished_at_for(completed: bool, requested: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    if completed {
        Some(requested.unwrap_or_else(Utc::now))
    } else {
        None
    }
}

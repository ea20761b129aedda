//! In-memory `ItemStore`
//!
//! Evaluates plans with `PredicateSet::matches` and `compare_items`, the
//! in-memory counterparts of the SQL the SQLite store renders. Timestamps are
//! truncated to milliseconds on insert so both stores hold identical values.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};

use crate::context::CallContext;
use crate::errors::{ExError, ExErrorKind, ReminderError, Result};
use crate::model::{Item, ItemId, ItemUpdate, NewItem, StatusUpdate};
use crate::query::{compare_items, PagePlan, PredicateSet};
use crate::store::ItemStore;

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    last_id: ItemId,
    /// Fault to raise on the next call, then clear
    fail_next: Option<ExErrorKind>,
}

#[derive(Debug, Default)]
pub struct MemoryItemStore {
    state: Mutex<MemoryState>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with `kind`
    pub fn fail_next(&self, kind: ExErrorKind) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next = Some(kind);
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enter(&self, op: &str, ctx: &CallContext) -> Result<MutexGuard<'_, MemoryState>> {
        ctx.check(op)?;
        let mut state = self.state.lock().map_err(|_| {
            ExError::new(ExErrorKind::StoreUnavailable)
                .with_op(op)
                .with_message("memory store lock poisoned")
        })?;
        if let Some(kind) = state.fail_next.take() {
            return Err(ExError::new(kind)
                .with_op(op)
                .with_message("injected failure"));
        }
        Ok(state)
    }
}

fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(at.timestamp_millis())
        .single()
        .unwrap_or(at)
}

fn not_found(op: &str, id: ItemId) -> ExError {
    ExError::from(ReminderError::ItemNotFound { id }).with_op(op)
}

impl ItemStore for MemoryItemStore {
    fn query(&self, plan: &PagePlan, ctx: &CallContext) -> Result<Vec<Item>> {
        let state = self.enter("query", ctx)?;
        let mut candidates: Vec<&Item> = state
            .items
            .values()
            .filter(|item| plan.predicates().matches(item))
            .collect();
        candidates.sort_by(|a, b| compare_items(plan.order(), a, b));

        let mut rows = Vec::with_capacity(plan.fetch_limit().min(candidates.len()));
        for item in candidates.into_iter().take(plan.fetch_limit()) {
            ctx.check("query")?;
            rows.push(item.clone());
        }
        Ok(rows)
    }

    fn count(&self, predicates: &PredicateSet, ctx: &CallContext) -> Result<u64> {
        let state = self.enter("count", ctx)?;
        Ok(state
            .items
            .values()
            .filter(|item| predicates.matches(item))
            .count() as u64)
    }

    fn insert(&self, item: &NewItem, ctx: &CallContext) -> Result<Item> {
        let mut state = self.enter("insert", ctx)?;
        let requested = truncate_to_millis(item.created_at.unwrap_or_else(Utc::now));
        // Highest id holds the newest created_at; never go below it
        let created_at = state
            .items
            .values()
            .next_back()
            .map_or(requested, |newest| newest.created_at.max(requested));
        state.last_id += 1;
        let stored = Item {
            id: state.last_id,
            description: item.description.clone(),
            created_at,
            deadline_at: truncate_to_millis(item.deadline_at),
            finished_at: None,
            completed: false,
        };
        state.items.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: ItemId, ctx: &CallContext) -> Result<Option<Item>> {
        let state = self.enter("get", ctx)?;
        Ok(state.items.get(&id).cloned())
    }

    fn update(&self, id: ItemId, update: &ItemUpdate, ctx: &CallContext) -> Result<()> {
        let mut state = self.enter("update", ctx)?;
        let item = state.items.get_mut(&id).ok_or_else(|| not_found("update", id))?;
        item.description = update.description.clone();
        item.completed = update.completed;
        item.finished_at = update.finished_at.map(truncate_to_millis);
        Ok(())
    }

    fn update_status(&self, id: ItemId, status: &StatusUpdate, ctx: &CallContext) -> Result<()> {
        let mut state = self.enter("update_status", ctx)?;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| not_found("update_status", id))?;
        item.completed = status.completed;
        item.finished_at = status.finished_at.map(truncate_to_millis);
        Ok(())
    }

    fn delete(&self, id: ItemId, ctx: &CallContext) -> Result<()> {
        let mut state = self.enter("delete", ctx)?;
        state
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("delete", id))
    }
}

use serde::{Deserialize, Serialize};

use crate::model::{Item, ItemId};

/// Sentinel cursor: start from the beginning / nothing to continue from
pub const NO_CURSOR: ItemId = 0;

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// At most `limit` items, newest first
    pub items: Vec<Item>,

    /// Id of the last item in `items`; `NO_CURSOR` for an empty page
    pub next_cursor: ItemId,

    /// True when at least one further item matched beyond this page
    pub has_more: bool,

    /// Total items matching the flavor's filter, ignoring the cursor;
    /// populated by `ListAll` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl PageResult {
    /// Build a page from rows over-fetched by one
    ///
    /// `raw` holds at most `limit + 1` rows in list order. A row past
    /// `limit` is dropped and recorded as `has_more`.
    pub fn from_overshot(mut raw: Vec<Item>, limit: usize) -> Self {
        let has_more = raw.len() > limit;
        if has_more {
            raw.truncate(limit);
        }
        let next_cursor = raw.last().map_or(NO_CURSOR, |item| item.id);
        PageResult {
            items: raw,
            next_cursor,
            has_more,
            count: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

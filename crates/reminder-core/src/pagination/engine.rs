//! Pagination Engine
//!
//! Executes a built plan against an `ItemStore` and derives continuation
//! state. Each fetch is one read against the store; the engine keeps no
//! state between calls and never writes.

use std::time::Instant;

use crate::context::CallContext;
use crate::errors::Result;
use crate::pagination::page::PageResult;
use crate::query::{ListFilter, PageQueryBuilder, PageRequest};
use crate::store::ItemStore;
use crate::{log_op_end, log_op_error, log_op_start};

pub struct PaginationEngine<S> {
    store: S,
    builder: PageQueryBuilder,
}

impl<S: ItemStore> PaginationEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_builder(store, PageQueryBuilder::default())
    }

    pub fn with_builder(store: S, builder: PageQueryBuilder) -> Self {
        Self { store, builder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn builder(&self) -> &PageQueryBuilder {
        &self.builder
    }

    /// Fetch one page
    ///
    /// # Errors
    ///
    /// Builder validation errors (`InvalidLimit`, `InvalidCursor`) and store
    /// errors (`StoreUnavailable`, `DecodeFailure`, `Cancelled`) are returned
    /// unchanged.
    pub fn fetch_page(&self, request: &PageRequest, ctx: &CallContext) -> Result<PageResult> {
        log_op_start!(
            "fetch_page",
            filter = request.filter.as_str(),
            limit = request.limit,
            cursor = request.cursor
        );
        let start = Instant::now();

        let result = (|| -> Result<PageResult> {
            let plan = self.builder.build(request)?;
            let rows = self.store.query(&plan, ctx)?;
            Ok(PageResult::from_overshot(rows, plan.page_limit()))
        })();

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(page) => log_op_end!(
                "fetch_page",
                duration_ms = elapsed,
                item_count = page.items.len(),
                next_cursor = page.next_cursor,
                has_more = page.has_more
            ),
            Err(e) => log_op_error!("fetch_page", e.clone(), duration_ms = elapsed),
        }
        result
    }

    /// Total items matching `filter`, ignoring any cursor
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub fn count(&self, filter: ListFilter, ctx: &CallContext) -> Result<u64> {
        self.store
            .count(&PageQueryBuilder::filter_predicates(filter), ctx)
    }
}

//! List Service
//!
//! The three list flavors over the Pagination Engine. Each fixes the filter,
//! fetches one page, and packages the envelope; only `list_all` fills in
//! `count`. No retries: failures are returned as the engine reports them.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use reminder_core::config::ListConfig;
use reminder_core::context::CallContext;
use reminder_core::errors::Result;
use reminder_core::pagination::{PageResult, PaginationEngine};
use reminder_core::query::{ListFilter, PageQueryBuilder, PageRequest};
use reminder_core::store::ItemStore;
use reminder_core::{log_op_end, log_op_error, log_op_start};

pub struct ListService<S> {
    engine: PaginationEngine<S>,
    default_limit: i64,
}

impl<S: ItemStore> ListService<S> {
    pub fn new(store: S, config: &ListConfig) -> Self {
        Self {
            engine: PaginationEngine::with_builder(store, PageQueryBuilder::new(config.max_limit)),
            default_limit: config.default_limit,
        }
    }

    pub fn engine(&self) -> &PaginationEngine<S> {
        &self.engine
    }

    /// Build a request, using the configured page size when `limit` is absent
    pub fn request(&self, limit: Option<i64>, cursor: Option<i64>, filter: ListFilter) -> PageRequest {
        PageRequest::first(limit.unwrap_or(self.default_limit))
            .after(cursor.unwrap_or(0))
            .filtered(filter)
    }

    /// Newest items first, with `count` of every item
    ///
    /// # Errors
    ///
    /// `InvalidLimit`, `InvalidCursor`, `StoreUnavailable`, `DecodeFailure`
    /// or `Cancelled`.
    pub fn list_all(&self, request: &PageRequest, ctx: &CallContext) -> Result<PageResult> {
        self.run("list_all", ListFilter::All, request, ctx)
    }

    /// Completed items only; `count` is `None`
    ///
    /// # Errors
    ///
    /// As for `list_all`.
    pub fn list_completed(&self, request: &PageRequest, ctx: &CallContext) -> Result<PageResult> {
        self.run("list_completed", ListFilter::Completed, request, ctx)
    }

    /// Open items only; `count` is `None`
    ///
    /// # Errors
    ///
    /// As for `list_all`.
    pub fn list_pending(&self, request: &PageRequest, ctx: &CallContext) -> Result<PageResult> {
        self.run("list_pending", ListFilter::Pending, request, ctx)
    }

    /// Dispatch on `request.filter`
    ///
    /// # Errors
    ///
    /// As for `list_all`.
    pub fn list(&self, request: &PageRequest, ctx: &CallContext) -> Result<PageResult> {
        match request.filter {
            ListFilter::All => self.list_all(request, ctx),
            ListFilter::Completed => self.list_completed(request, ctx),
            ListFilter::Pending => self.list_pending(request, ctx),
        }
    }

    fn run(
        &self,
        op: &'static str,
        filter: ListFilter,
        request: &PageRequest,
        ctx: &CallContext,
    ) -> Result<PageResult> {
        let request = request.filtered(filter);
        log_op_start!(
            op,
            request_id = ctx.request().request_id.as_str(),
            limit = request.limit,
            cursor = request.cursor
        );
        let start = Instant::now();

        let result = (|| -> Result<PageResult> {
            let page = self.engine.fetch_page(&request, ctx)?;
            if filter == ListFilter::All {
                let count = self.engine.count(filter, ctx)?;
                return Ok(page.with_count(count));
            }
            Ok(page)
        })();

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(page) => log_op_end!(
                op,
                duration_ms = elapsed,
                item_count = page.items.len(),
                next_cursor = page.next_cursor,
                has_more = page.has_more
            ),
            Err(e) => log_op_error!(op, e.clone(), duration_ms = elapsed),
        }
        result
    }
}

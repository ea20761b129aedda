#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use reminder_core::context::{CallContext, CancelToken};
use reminder_core::errors::{ExErrorKind, Result};
use reminder_core::model::{Item, ItemId, ItemUpdate, NewItem, StatusUpdate};
use reminder_core::query::{ListFilter, PagePlan, PageQueryBuilder, PageRequest, PredicateSet};
use reminder_core::store::memory::MemoryItemStore;
use reminder_core::store::ItemStore;
use reminder_core::{PaginationEngine, NO_CURSOR};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()
}

/// Store with ids 1..=n, `created_at` strictly increasing with id, and the
/// given ids completed
fn seeded_store(n: i64, completed: &[ItemId]) -> MemoryItemStore {
    let store = MemoryItemStore::new();
    let ctx = CallContext::background();
    for i in 1..=n {
        let created = base() + Duration::minutes(i);
        let item = store
            .insert(
                &NewItem::new(format!("todo {i}"), created + Duration::days(1)).created_at(created),
                &ctx,
            )
            .unwrap();
        if completed.contains(&item.id) {
            store
                .update_status(item.id, &StatusUpdate::completed_at(created), &ctx)
                .unwrap();
        }
    }
    store
}

#[test]
fn test_list_all_pages_newest_first() {
    let engine = PaginationEngine::new(seeded_store(5, &[2]));
    let ctx = CallContext::background();

    let first = engine.fetch_page(&PageRequest::first(2), &ctx).unwrap();
    assert_eq!(first.ids(), vec![5, 4]);
    assert_eq!(first.next_cursor, 4);
    assert!(first.has_more);

    let second = engine
        .fetch_page(&PageRequest::first(2).after(4), &ctx)
        .unwrap();
    assert_eq!(second.ids(), vec![3, 2]);
    assert_eq!(second.next_cursor, 2);
    assert!(second.has_more);

    let third = engine
        .fetch_page(&PageRequest::first(2).after(2), &ctx)
        .unwrap();
    assert_eq!(third.ids(), vec![1]);
    assert!(!third.has_more);
}

#[test]
fn test_completed_filter_returns_only_completed() {
    let engine = PaginationEngine::new(seeded_store(5, &[2]));
    let page = engine
        .fetch_page(
            &PageRequest::first(10).filtered(ListFilter::Completed),
            &CallContext::background(),
        )
        .unwrap();
    assert_eq!(page.ids(), vec![2]);
    assert_eq!(page.next_cursor, 2);
    assert!(!page.has_more);
}

#[test]
fn test_pending_filter_excludes_completed() {
    let engine = PaginationEngine::new(seeded_store(5, &[2, 4]));
    let page = engine
        .fetch_page(
            &PageRequest::first(10).filtered(ListFilter::Pending),
            &CallContext::background(),
        )
        .unwrap();
    assert_eq!(page.ids(), vec![5, 3, 1]);
}

#[test]
fn test_empty_store_returns_sentinel_cursor() {
    let engine = PaginationEngine::new(MemoryItemStore::new());
    let page = engine
        .fetch_page(&PageRequest::first(10), &CallContext::background())
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.next_cursor, NO_CURSOR);
    assert!(!page.has_more);
    assert_eq!(page.count, None);
}

#[test]
fn test_exact_fit_page_reports_no_more() {
    let engine = PaginationEngine::new(seeded_store(3, &[]));
    let page = engine
        .fetch_page(&PageRequest::first(3), &CallContext::background())
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(!page.has_more);
}

#[test]
fn test_cursor_past_every_item_is_an_empty_page() {
    let engine = PaginationEngine::new(seeded_store(3, &[]));
    let page = engine
        .fetch_page(&PageRequest::first(3).after(1), &CallContext::background())
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.next_cursor, NO_CURSOR);
}

#[test]
fn test_oversized_limit_is_clamped() {
    let store = seeded_store(5, &[]);
    let engine = PaginationEngine::with_builder(store, PageQueryBuilder::new(2));
    let page = engine
        .fetch_page(&PageRequest::first(1_000_000), &CallContext::background())
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.has_more);
}

#[test]
fn test_validation_errors_are_distinguishable() {
    let engine = PaginationEngine::new(seeded_store(1, &[]));
    let ctx = CallContext::background();

    let err = engine.fetch_page(&PageRequest::first(0), &ctx).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidLimit);

    let err = engine
        .fetch_page(&PageRequest::first(5).after(-1), &ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidCursor);
}

#[test]
fn test_deleted_boundary_item_does_not_break_continuation() {
    let engine = PaginationEngine::new(seeded_store(5, &[]));
    let ctx = CallContext::background();

    let first = engine.fetch_page(&PageRequest::first(2), &ctx).unwrap();
    engine.store().delete(first.next_cursor, &ctx).unwrap();

    let second = engine
        .fetch_page(&PageRequest::first(2).after(first.next_cursor), &ctx)
        .unwrap();
    assert_eq!(second.ids(), vec![3, 2]);
}

#[test]
fn test_items_inserted_after_first_page_do_not_appear_in_continuation() {
    let engine = PaginationEngine::new(seeded_store(4, &[]));
    let ctx = CallContext::background();

    let first = engine.fetch_page(&PageRequest::first(2), &ctx).unwrap();
    engine
        .store()
        .insert(&NewItem::new("late", base()), &ctx)
        .unwrap();

    let second = engine
        .fetch_page(&PageRequest::first(10).after(first.next_cursor), &ctx)
        .unwrap();
    assert_eq!(second.ids(), vec![2, 1]);
}

#[test]
fn test_backdated_insert_is_not_hidden_behind_the_cursor() {
    let store = MemoryItemStore::new();
    let ctx = CallContext::background();
    for minutes in [200, 100] {
        let created = base() + Duration::minutes(minutes);
        store
            .insert(&NewItem::new("backdated", created).created_at(created), &ctx)
            .unwrap();
    }
    let engine = PaginationEngine::new(store);

    let first = engine.fetch_page(&PageRequest::first(1), &ctx).unwrap();
    assert_eq!(first.ids(), vec![2]);
    assert!(first.has_more);

    let second = engine
        .fetch_page(&PageRequest::first(1).after(first.next_cursor), &ctx)
        .unwrap();
    assert_eq!(second.ids(), vec![1]);
    assert!(!second.has_more);
}

#[test]
fn test_count_ignores_cursor_and_respects_filter() {
    let engine = PaginationEngine::new(seeded_store(5, &[1, 2]));
    let ctx = CallContext::background();
    assert_eq!(engine.count(ListFilter::All, &ctx).unwrap(), 5);
    assert_eq!(engine.count(ListFilter::Completed, &ctx).unwrap(), 2);
    assert_eq!(engine.count(ListFilter::Pending, &ctx).unwrap(), 3);
}

#[test]
fn test_cancelled_call_returns_no_partial_page() {
    let token = CancelToken::new();
    token.cancel();
    let engine = PaginationEngine::new(seeded_store(5, &[]));
    let ctx = CallContext::background().with_cancel_token(token);

    let err = engine.fetch_page(&PageRequest::first(5), &ctx).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Cancelled);
}

/// Store that trips the caller's token once the inner query has produced
/// rows, as if cancellation arrived while the page was being assembled
struct CancelDuringQuery {
    inner: MemoryItemStore,
    token: CancelToken,
}

impl ItemStore for CancelDuringQuery {
    fn query(&self, plan: &PagePlan, ctx: &CallContext) -> Result<Vec<Item>> {
        let rows = self.inner.query(plan, ctx)?;
        self.token.cancel();
        ctx.check("query")?;
        Ok(rows)
    }

    fn count(&self, predicates: &PredicateSet, ctx: &CallContext) -> Result<u64> {
        self.inner.count(predicates, ctx)
    }

    fn insert(&self, item: &NewItem, ctx: &CallContext) -> Result<Item> {
        self.inner.insert(item, ctx)
    }

    fn get(&self, id: ItemId, ctx: &CallContext) -> Result<Option<Item>> {
        self.inner.get(id, ctx)
    }

    fn update(&self, id: ItemId, update: &ItemUpdate, ctx: &CallContext) -> Result<()> {
        self.inner.update(id, update, ctx)
    }

    fn update_status(&self, id: ItemId, status: &StatusUpdate, ctx: &CallContext) -> Result<()> {
        self.inner.update_status(id, status, ctx)
    }

    fn delete(&self, id: ItemId, ctx: &CallContext) -> Result<()> {
        self.inner.delete(id, ctx)
    }
}

#[test]
fn test_cancellation_mid_fetch_discards_rows() {
    let token = CancelToken::new();
    let engine = PaginationEngine::new(CancelDuringQuery {
        inner: seeded_store(5, &[]),
        token: token.clone(),
    });
    let ctx = CallContext::background().with_cancel_token(token);

    let err = engine.fetch_page(&PageRequest::first(3), &ctx).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Cancelled);
}

#[test]
fn test_fetch_never_mutates_the_store() {
    let engine = PaginationEngine::new(seeded_store(4, &[3]));
    let ctx = CallContext::background();
    let before = engine.store().len();
    for filter in ListFilter::ALL {
        engine
            .fetch_page(&PageRequest::first(2).filtered(filter), &ctx)
            .unwrap();
    }
    assert_eq!(engine.store().len(), before);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Items as (minutes since previous item, completed). Zero gaps produce
/// `created_at` ties that the id tie-break must order.
fn arb_items() -> impl Strategy<Value = Vec<(i64, bool)>> {
    prop::collection::vec((0i64..3, any::<bool>()), 0..40)
}

fn arb_filter() -> impl Strategy<Value = ListFilter> {
    prop::sample::select(ListFilter::ALL.to_vec())
}

fn build_store(layout: &[(i64, bool)]) -> MemoryItemStore {
    let store = MemoryItemStore::new();
    let ctx = CallContext::background();
    let mut created = base();
    for (gap, completed) in layout {
        created += Duration::minutes(*gap);
        let item = store
            .insert(&NewItem::new("p", created).created_at(created), &ctx)
            .unwrap();
        if *completed {
            store
                .update_status(item.id, &StatusUpdate::completed_at(created), &ctx)
                .unwrap();
        }
    }
    store
}

fn expected_ids(layout: &[(i64, bool)], filter: ListFilter) -> Vec<ItemId> {
    // created_at is non-decreasing with id, so list order is id descending
    let mut ids: Vec<ItemId> = layout
        .iter()
        .enumerate()
        .filter(|(_, (_, completed))| match filter {
            ListFilter::All => true,
            ListFilter::Completed => *completed,
            ListFilter::Pending => !*completed,
        })
        .map(|(i, _)| i as ItemId + 1)
        .collect();
    ids.reverse();
    ids
}

/// Items as (requested minute, completed) with no ordering between
/// neighbours; repeats produce ties
fn arb_skewed_items() -> impl Strategy<Value = Vec<(i64, bool)>> {
    prop::collection::vec((0i64..6, any::<bool>()), 0..40)
}

fn build_skewed_store(layout: &[(i64, bool)]) -> MemoryItemStore {
    let store = MemoryItemStore::new();
    let ctx = CallContext::background();
    for (minute, completed) in layout {
        let created = base() + Duration::minutes(*minute);
        let item = store
            .insert(&NewItem::new("s", created).created_at(created), &ctx)
            .unwrap();
        if *completed {
            store
                .update_status(item.id, &StatusUpdate::completed_at(created), &ctx)
                .unwrap();
        }
    }
    store
}

fn walk(engine: &PaginationEngine<MemoryItemStore>, limit: i64, filter: ListFilter) -> Vec<Item> {
    let ctx = CallContext::background();
    let mut seen = Vec::new();
    let mut cursor = 0;
    loop {
        let page = engine
            .fetch_page(&PageRequest::first(limit).after(cursor).filtered(filter), &ctx)
            .unwrap();
        let empty = page.items.is_empty();
        seen.extend(page.items);
        if !page.has_more {
            break;
        }
        assert!(!empty, "has_more on an empty page");
        cursor = page.next_cursor;
    }
    seen
}

proptest! {
    #[test]
    fn prop_walking_pages_visits_every_match_once_in_order(
        layout in arb_items(),
        filter in arb_filter(),
        limit in 1i64..8,
    ) {
        let engine = PaginationEngine::new(build_store(&layout));
        let ctx = CallContext::background();

        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let page = engine
                .fetch_page(&PageRequest::first(limit).after(cursor).filtered(filter), &ctx)
                .unwrap();
            prop_assert!(page.items.len() as i64 <= limit);
            prop_assert_eq!(page.next_cursor, page.items.last().map_or(NO_CURSOR, |i| i.id));
            if cursor > 0 {
                prop_assert!(page.items.iter().all(|i| i.id < cursor));
            }
            seen.extend(page.ids());
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }

        prop_assert_eq!(seen, expected_ids(&layout, filter));
    }

    #[test]
    fn prop_every_page_is_sorted_and_filtered(
        layout in arb_items(),
        filter in arb_filter(),
        limit in 1i64..50,
        cursor in 0i64..45,
    ) {
        let engine = PaginationEngine::new(build_store(&layout));
        let page = engine
            .fetch_page(
                &PageRequest::first(limit).after(cursor).filtered(filter),
                &CallContext::background(),
            )
            .unwrap();

        for pair in page.items.windows(2) {
            prop_assert!(
                (pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id)
            );
        }
        for item in &page.items {
            match filter {
                ListFilter::All => {}
                ListFilter::Completed => prop_assert!(item.completed),
                ListFilter::Pending => prop_assert!(!item.completed),
            }
        }
    }

    #[test]
    fn prop_skewed_creation_times_still_page_completely(
        layout in arb_skewed_items(),
        filter in arb_filter(),
        limit in 1i64..8,
    ) {
        let engine = PaginationEngine::new(build_skewed_store(&layout));
        let ctx = CallContext::background();

        let mut stored: Vec<Item> = (1..=layout.len() as ItemId)
            .map(|id| engine.store().get(id, &ctx).unwrap().unwrap())
            .collect();
        for pair in stored.windows(2) {
            prop_assert!(pair[0].created_at <= pair[1].created_at);
        }

        stored.retain(|item| match filter {
            ListFilter::All => true,
            ListFilter::Completed => item.completed,
            ListFilter::Pending => !item.completed,
        });
        stored.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let expected: Vec<ItemId> = stored.iter().map(|i| i.id).collect();

        let seen: Vec<ItemId> = walk(&engine, limit, filter).iter().map(|i| i.id).collect();
        prop_assert_eq!(seen, expected);
    }
}

//! Page Query Builder
//!
//! Turns a `PageRequest` into a `PagePlan`: the predicate set, the fixed
//! list ordering and the row limit. Validation happens here so that no store
//! ever sees a non-positive limit or a negative cursor.

use serde::{Deserialize, Serialize};

use crate::errors::{ReminderError, Result};
use crate::model::ItemId;
use crate::query::filter::ListFilter;
use crate::query::predicate::{
    render_order_by, OrderTerm, Predicate, PredicateSet, SqlFragment, SqlParam, LIST_ORDER,
};

/// Default ceiling on page size
pub const DEFAULT_MAX_LIMIT: i64 = 1_000;

/// One page request as received from a caller
///
/// `limit` and `cursor` are signed so that out-of-range input arriving from
/// loosely-typed parameters reaches validation instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: i64,
    /// Id of the last item of the previous page; 0 starts from the beginning
    #[serde(default)]
    pub cursor: i64,
    #[serde(default)]
    pub filter: ListFilter,
}

impl PageRequest {
    pub fn first(limit: i64) -> Self {
        Self {
            limit,
            cursor: 0,
            filter: ListFilter::All,
        }
    }

    pub fn after(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn filtered(mut self, filter: ListFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// An executable, store-agnostic query plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    predicates: PredicateSet,
    order: &'static [OrderTerm],
    page_limit: usize,
}

impl PagePlan {
    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn order(&self) -> &'static [OrderTerm] {
        self.order
    }

    /// Items the caller asked for
    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Rows to read from the store: one past the page, so the engine can
    /// tell whether another page exists
    pub fn fetch_limit(&self) -> usize {
        self.page_limit + 1
    }

    /// Render `WHERE ... ORDER BY ... LIMIT ?n` for appending to a
    /// `SELECT <columns> FROM <table>` prefix
    pub fn render_tail(&self) -> SqlFragment {
        let mut out = SqlFragment::default();
        let where_clause = self.predicates.render_where(&mut out);
        let order_by = render_order_by(self.order);
        out.params
            .push(SqlParam::Integer(self.fetch_limit() as i64));
        let limit = format!("LIMIT ?{}", out.params.len());

        out.text = [where_clause.as_str(), order_by.as_str(), limit.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageQueryBuilder {
    max_limit: i64,
}

impl Default for PageQueryBuilder {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl PageQueryBuilder {
    /// Builder clamping limits to `max_limit` (itself at least 1)
    pub fn new(max_limit: i64) -> Self {
        Self {
            max_limit: max_limit.max(1),
        }
    }

    pub fn max_limit(&self) -> i64 {
        self.max_limit
    }

    /// # Errors
    ///
    /// - `InvalidLimit` when `limit <= 0`
    /// - `InvalidCursor` when `cursor < 0`
    pub fn build(&self, request: &PageRequest) -> Result<PagePlan> {
        if request.limit <= 0 {
            return Err(ReminderError::InvalidLimit {
                limit: request.limit,
            }
            .into());
        }
        if request.cursor < 0 {
            return Err(ReminderError::InvalidCursor {
                cursor: request.cursor,
            }
            .into());
        }

        let cursor: ItemId = request.cursor;
        let predicates = Self::filter_predicates(request.filter)
            .and_maybe((cursor > 0).then_some(Predicate::IdBefore(cursor)));

        Ok(PagePlan {
            predicates,
            order: &LIST_ORDER,
            page_limit: request.limit.min(self.max_limit) as usize,
        })
    }

    /// Predicates of a flavor without any continuation; used for counts
    pub fn filter_predicates(filter: ListFilter) -> PredicateSet {
        PredicateSet::new().and_maybe(filter.predicate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    #[test]
    fn test_first_page_of_all_has_no_predicates() {
        let plan = PageQueryBuilder::default()
            .build(&PageRequest::first(2))
            .unwrap();
        assert!(plan.predicates().is_empty());
        assert_eq!(plan.page_limit(), 2);
        assert_eq!(plan.fetch_limit(), 3);

        let sql = plan.render_tail();
        assert_eq!(sql.text, "ORDER BY created_at DESC, id DESC LIMIT ?1");
        assert_eq!(sql.params, vec![SqlParam::Integer(3)]);
    }

    #[test]
    fn test_filter_and_cursor_compose() {
        let plan = PageQueryBuilder::default()
            .build(
                &PageRequest::first(10)
                    .after(4)
                    .filtered(ListFilter::Pending),
            )
            .unwrap();
        assert_eq!(
            plan.predicates().predicates(),
            &[Predicate::Completed(false), Predicate::IdBefore(4)]
        );

        let sql = plan.render_tail();
        assert_eq!(
            sql.text,
            "WHERE completed = ?1 AND id < ?2 ORDER BY created_at DESC, id DESC LIMIT ?3"
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Bool(false),
                SqlParam::Integer(4),
                SqlParam::Integer(11)
            ]
        );
    }

    #[test]
    fn test_ordering_is_identical_for_every_flavor() {
        let builder = PageQueryBuilder::default();
        for filter in ListFilter::ALL {
            let plan = builder
                .build(&PageRequest::first(5).filtered(filter))
                .unwrap();
            assert_eq!(plan.order(), &LIST_ORDER);
        }
    }

    #[test]
    fn test_zero_and_negative_limits_are_rejected() {
        let builder = PageQueryBuilder::default();
        for limit in [0, -1, i64::MIN] {
            let err = builder.build(&PageRequest::first(limit)).unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::InvalidLimit);
        }
    }

    #[test]
    fn test_negative_cursor_is_rejected() {
        let err = PageQueryBuilder::default()
            .build(&PageRequest::first(10).after(-1))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidCursor);
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        let plan = PageQueryBuilder::new(50)
            .build(&PageRequest::first(10_000))
            .unwrap();
        assert_eq!(plan.page_limit(), 50);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: PageRequest = serde_json::from_str(r#"{"limit":5}"#).unwrap();
        assert_eq!(req, PageRequest::first(5));
    }
}

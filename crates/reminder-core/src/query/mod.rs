//! Query planning for list operations
//!
//! Key principles:
//! - Filters are a closed set of variants, never caller-supplied SQL
//! - Every literal travels as a bound parameter
//! - One ordering (`created_at DESC, id DESC`) and one continuation rule
//!   (`id < cursor`) for all list flavors

pub mod builder;
pub mod filter;
pub mod predicate;

pub use builder::{PagePlan, PageQueryBuilder, PageRequest, DEFAULT_MAX_LIMIT};
pub use filter::ListFilter;
pub use predicate::{
    compare_items, OrderTerm, Predicate, PredicateSet, SortKey, SqlFragment, SqlParam, LIST_ORDER,
};

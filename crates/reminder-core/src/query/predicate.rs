//! Composable predicates over the item table
//!
//! A predicate has two renderings that must agree: `matches` evaluates it
//! against an in-memory `Item`, and `render` produces SQL text that names
//! only fixed columns and `?N` placeholders, with every literal pushed to
//! the parameter list.

use std::cmp::Ordering;

use crate::model::{Item, ItemId};

pub const COL_ID: &str = "id";
pub const COL_CREATED_AT: &str = "created_at";
pub const COL_COMPLETED: &str = "completed";

/// A bound parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlParam {
    Integer(i64),
    Bool(bool),
}

/// SQL text plus the parameters its placeholders refer to, in order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqlFragment {
    pub text: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    /// Push a parameter and return its 1-based placeholder
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// `completed = ?`
    Completed(bool),
    /// `id < ?`: continuation past a cursor. Strict, so the boundary row is
    /// not returned twice.
    IdBefore(ItemId),
}

impl Predicate {
    pub fn matches(&self, item: &Item) -> bool {
        match *self {
            Predicate::Completed(completed) => item.completed == completed,
            Predicate::IdBefore(cursor) => item.id < cursor,
        }
    }

    fn render(&self, out: &mut SqlFragment) -> String {
        match *self {
            Predicate::Completed(completed) => {
                let p = out.bind(SqlParam::Bool(completed));
                format!("{COL_COMPLETED} = {p}")
            }
            Predicate::IdBefore(cursor) => {
                let p = out.bind(SqlParam::Integer(cursor));
                format!("{COL_ID} < {p}")
            }
        }
    }
}

/// Conjunction of predicates; empty means `true`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PredicateSet(Vec<Predicate>);

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.0.push(predicate);
        self
    }

    pub fn and_maybe(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(p) => self.and(p),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.0.iter().all(|p| p.matches(item))
    }

    /// Render as a `WHERE` clause (empty text when unrestricted), appending
    /// parameters to `out`
    pub fn render_where(&self, out: &mut SqlFragment) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let clauses: Vec<String> = self.0.iter().map(|p| p.render(out)).collect();
        format!("WHERE {}", clauses.join(" AND "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Id,
}

impl SortKey {
    fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => COL_CREATED_AT,
            SortKey::Id => COL_ID,
        }
    }

    fn compare(self, a: &Item, b: &Item) -> Ordering {
        match self {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub key: SortKey,
    pub descending: bool,
}

/// Ordering shared by every list flavor: newest first, id breaks ties
pub const LIST_ORDER: [OrderTerm; 2] = [
    OrderTerm {
        key: SortKey::CreatedAt,
        descending: true,
    },
    OrderTerm {
        key: SortKey::Id,
        descending: true,
    },
];

pub fn render_order_by(order: &[OrderTerm]) -> String {
    let terms: Vec<String> = order
        .iter()
        .map(|t| {
            let dir = if t.descending { "DESC" } else { "ASC" };
            format!("{} {}", t.key.column(), dir)
        })
        .collect();
    format!("ORDER BY {}", terms.join(", "))
}

/// Compare two items under `order`
pub fn compare_items(order: &[OrderTerm], a: &Item, b: &Item) -> Ordering {
    for term in order {
        let ord = term.key.compare(a, b);
        let ord = if term.descending { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ExError, ReminderError};
use crate::query::predicate::Predicate;

/// List flavor: which items a list query considers before pagination
///
/// Closed set; a new flavor is a new variant plus its predicate in
/// `ListFilter::predicate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl ListFilter {
    pub const ALL: [ListFilter; 3] = [ListFilter::All, ListFilter::Completed, ListFilter::Pending];

    /// The restriction this flavor adds, if any
    pub fn predicate(self) -> Option<Predicate> {
        match self {
            ListFilter::All => None,
            ListFilter::Completed => Some(Predicate::Completed(true)),
            ListFilter::Pending => Some(Predicate::Completed(false)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ListFilter::All => "all",
            ListFilter::Completed => "completed",
            ListFilter::Pending => "pending",
        }
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListFilter {
    type Err = ExError;

    /// Parse a loosely-typed filter parameter. Unknown values are rejected
    /// rather than passed through to the query.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(ListFilter::All),
            "completed" => Ok(ListFilter::Completed),
            "pending" => Ok(ListFilter::Pending),
            _ => Err(ReminderError::UnknownFilter {
                value: s.to_string(),
            }
            .into()),
        }
    }
}

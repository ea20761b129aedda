use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned item identifier
///
/// Strictly increasing in insertion order and never reused.
pub type ItemId = i64;

/// Item - a time-bound reminder ("todo")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier assigned by the store on insert; immutable
    pub id: ItemId,

    /// Free-form text of the reminder
    pub description: String,

    /// Set once at creation; the primary list ordering key
    pub created_at: DateTime<Utc>,

    /// When the reminder is due
    pub deadline_at: DateTime<Utc>,

    /// Set when the item transitions to completed
    pub finished_at: Option<DateTime<Utc>>,

    pub completed: bool,
}

impl Item {
    /// True when the deadline has passed and the item is still open
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline_at < now
    }
}

/// Payload for inserting a new item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub description: String,
    pub deadline_at: DateTime<Utc>,
    /// Requested creation time; defaults to the insertion time when absent.
    ///
    /// Stores raise it to the newest stored `created_at`, so creation time
    /// never decreases as ids increase.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewItem {
    pub fn new(description: impl Into<String>, deadline_at: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            deadline_at,
            created_at: None,
        }
    }

    /// Request a creation timestamp (seed data, imports, tests); an earlier
    /// value than the newest stored item is raised to it
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Full update of the mutable fields of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub description: String,
    pub completed: bool,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Completion status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub completed: bool,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Mark completed at `at`
    pub fn completed_at(at: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            finished_at: Some(at),
        }
    }

    /// Reopen; clears `finished_at`
    pub fn reopened() -> Self {
        Self {
            completed: false,
            finished_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(completed: bool) -> Item {
        Item {
            id: 1,
            description: "pay rent".to_string(),
            created_at: Utc.with_ymd_and_hms(2023, 4, 1, 1, 0, 0).unwrap(),
            deadline_at: Utc.with_ymd_and_hms(2023, 4, 2, 1, 0, 0).unwrap(),
            finished_at: None,
            completed,
        }
    }

    #[test]
    fn test_open_item_past_deadline_is_overdue() {
        let now = Utc.with_ymd_and_hms(2023, 4, 3, 0, 0, 0).unwrap();
        assert!(item(false).is_overdue(now));
        assert!(!item(true).is_overdue(now));
    }

    #[test]
    fn test_new_item_created_at_defaults_to_none() {
        let input: NewItem = serde_json::from_str(
            r#"{"description":"call mum","deadline_at":"2023-04-01T01:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(input.description, "call mum");
        assert!(input.created_at.is_none());
    }

    #[test]
    fn test_status_update_helpers() {
        let at = Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap();
        assert_eq!(StatusUpdate::completed_at(at).finished_at, Some(at));
        let reopened = StatusUpdate::reopened();
        assert!(!reopened.completed);
        assert!(reopened.finished_at.is_none());
    }
}

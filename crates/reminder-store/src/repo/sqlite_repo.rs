//! SQLite item store
//!
//! Implements `ItemStore` over the `todo` table. Every call checks out one
//! pooled connection for the duration of a single statement.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, TimeZone, Utc};
use reminder_core::config::DatabaseConfig;
use reminder_core::context::CallContext;
use reminder_core::errors::{ExError, ReminderError};
use reminder_core::model::{Item, ItemId, ItemUpdate, NewItem, StatusUpdate};
use reminder_core::query::{PagePlan, PredicateSet, SqlFragment, SqlParam};
use reminder_core::store::ItemStore;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension};

use crate::errors::{from_rusqlite, Result, StoreError};
use crate::pool::{ConnectionPool, PooledConnection};

const SELECT_ITEM: &str =
    "SELECT id, description, created_at, deadline_at, finished_at, completed FROM todo";

// One statement so the id and the clamped created_at are assigned under the
// same write lock
const INSERT_ITEM: &str = "INSERT INTO todo (description, created_at, deadline_at, completed)
     VALUES (?1, MAX(?2, COALESCE((SELECT MAX(created_at) FROM todo), ?2)), ?3, 0)
     RETURNING id, created_at";

/// Columns as stored, before timestamp decoding
struct ItemRow {
    id: ItemId,
    description: String,
    created_at: i64,
    deadline_at: i64,
    finished_at: Option<i64>,
    completed: bool,
}

impl ItemRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            description: row.get(1)?,
            created_at: row.get(2)?,
            deadline_at: row.get(3)?,
            finished_at: row.get(4)?,
            completed: row.get(5)?,
        })
    }

    fn into_item(self) -> Result<Item> {
        Ok(Item {
            id: self.id,
            description: self.description,
            created_at: from_millis("created_at", self.created_at)?,
            deadline_at: from_millis("deadline_at", self.deadline_at)?,
            finished_at: self
                .finished_at
                .map(|ms| from_millis("finished_at", ms))
                .transpose()?,
            completed: self.completed,
        })
    }
}

fn from_millis(column: &'static str, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::TimestampOutOfRange { column, millis }.into())
}

fn bind(params: &[SqlParam]) -> Vec<Value> {
    params
        .iter()
        .map(|p| match *p {
            SqlParam::Integer(v) => Value::Integer(v),
            SqlParam::Bool(v) => Value::Integer(i64::from(v)),
        })
        .collect()
}

fn sql_err(op: &'static str) -> impl Fn(rusqlite::Error) -> ExError {
    move |e| from_rusqlite(e).with_op(op)
}

fn not_found(op: &str, id: ItemId) -> ExError {
    ExError::from(ReminderError::ItemNotFound { id }).with_op(op)
}

/// SQLite-backed `ItemStore`
pub struct SqliteItemStore {
    pool: ConnectionPool,
}

impl SqliteItemStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open (and migrate) the configured database
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` or `Migration`.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::new(ConnectionPool::from_config(config)?))
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn conn(&self, op: &'static str, ctx: &CallContext) -> Result<PooledConnection<'_>> {
        ctx.check(op)?;
        self.pool.acquire(ctx)
    }

    /// Remove every item; ids already handed out are still never reused
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` or `Cancelled`.
    pub fn truncate(&self, ctx: &CallContext) -> Result<u64> {
        let conn = self.conn("truncate", ctx)?;
        let removed = conn
            .execute("DELETE FROM todo", [])
            .map_err(sql_err("truncate"))?;
        tracing::debug!(removed, "truncated todo table");
        Ok(removed as u64)
    }

    fn execute_for_id(
        &self,
        op: &'static str,
        id: ItemId,
        sql: &str,
        params: &[Value],
        ctx: &CallContext,
    ) -> Result<()> {
        let conn = self.conn(op, ctx)?;
        let changed = conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(sql_err(op))?;
        if changed == 0 {
            return Err(not_found(op, id));
        }
        Ok(())
    }
}

impl ItemStore for SqliteItemStore {
    fn query(&self, plan: &PagePlan, ctx: &CallContext) -> Result<Vec<Item>> {
        let SqlFragment { text, params } = plan.render_tail();
        let sql = format!("{SELECT_ITEM} {text}");

        let conn = self.conn("query", ctx)?;
        let mut stmt = conn.prepare_cached(&sql).map_err(sql_err("query"))?;
        let mut rows = stmt
            .query(params_from_iter(bind(&params)))
            .map_err(sql_err("query"))?;

        let mut items = Vec::with_capacity(plan.fetch_limit());
        while let Some(row) = rows.next().map_err(sql_err("query"))? {
            // Dropping `items` on a trip discards the partial page
            ctx.check("query")?;
            let item = ItemRow::read(row)
                .map_err(sql_err("query"))?
                .into_item()
                .map_err(|e| e.with_op("query"))?;
            items.push(item);
        }
        Ok(items)
    }

    fn count(&self, predicates: &PredicateSet, ctx: &CallContext) -> Result<u64> {
        let mut fragment = SqlFragment::default();
        let where_clause = predicates.render_where(&mut fragment);
        let sql = format!("SELECT COUNT(*) FROM todo {where_clause}");

        let conn = self.conn("count", ctx)?;
        let count: i64 = conn
            .query_row(&sql, params_from_iter(bind(&fragment.params)), |row| {
                row.get(0)
            })
            .map_err(sql_err("count"))?;
        Ok(count.max(0) as u64)
    }

    fn insert(&self, item: &NewItem, ctx: &CallContext) -> Result<Item> {
        let deadline_ms = item.deadline_at.timestamp_millis();

        let conn = self.conn("insert", ctx)?;
        let requested_ms = item.created_at.unwrap_or_else(Utc::now).timestamp_millis();
        let (id, created_ms): (ItemId, i64) = conn
            .prepare_cached(INSERT_ITEM)
            .and_then(|mut stmt| {
                stmt.query_row(
                    rusqlite::params![item.description, requested_ms, deadline_ms],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .map_err(sql_err("insert"))?;

        ItemRow {
            id,
            description: item.description.clone(),
            created_at: created_ms,
            deadline_at: deadline_ms,
            finished_at: None,
            completed: false,
        }
        .into_item()
    }

    fn get(&self, id: ItemId, ctx: &CallContext) -> Result<Option<Item>> {
        let conn = self.conn("get", ctx)?;
        let row = conn
            .query_row(&format!("{SELECT_ITEM} WHERE id = ?1"), [id], ItemRow::read)
            .optional()
            .map_err(sql_err("get"))?;
        row.map(ItemRow::into_item).transpose()
    }

    fn update(&self, id: ItemId, update: &ItemUpdate, ctx: &CallContext) -> Result<()> {
        self.execute_for_id(
            "update",
            id,
            "UPDATE todo SET description = ?1, completed = ?2, finished_at = ?3 WHERE id = ?4",
            &[
                Value::Text(update.description.clone()),
                Value::Integer(i64::from(update.completed)),
                update
                    .finished_at
                    .map_or(Value::Null, |at| Value::Integer(at.timestamp_millis())),
                Value::Integer(id),
            ],
            ctx,
        )
    }

    fn update_status(&self, id: ItemId, status: &StatusUpdate, ctx: &CallContext) -> Result<()> {
        self.execute_for_id(
            "update_status",
            id,
            "UPDATE todo SET completed = ?1, finished_at = ?2 WHERE id = ?3",
            &[
                Value::Integer(i64::from(status.completed)),
                status
                    .finished_at
                    .map_or(Value::Null, |at| Value::Integer(at.timestamp_millis())),
                Value::Integer(id),
            ],
            ctx,
        )
    }

    fn delete(&self, id: ItemId, ctx: &CallContext) -> Result<()> {
        self.execute_for_id(
            "delete",
            id,
            "DELETE FROM todo WHERE id = ?1",
            &[Value::Integer(id)],
            ctx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolOptions;
    use reminder_core::errors::ExErrorKind;

    fn store() -> (tempfile::TempDir, SqliteItemStore) {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(dir.path().join("t.db"), PoolOptions::default()).unwrap();
        (dir, SqliteItemStore::new(pool))
    }

    #[test]
    fn test_insert_then_get_round_trips_millis() {
        let (_dir, store) = store();
        let ctx = CallContext::background();
        let at = Utc.timestamp_millis_opt(1_680_310_800_123).unwrap();
        let created = store
            .insert(&NewItem::new("pay rent", at).created_at(at), &ctx)
            .unwrap();
        assert_eq!(created.id, 1);
        assert!(!created.completed);

        let fetched = store.get(created.id, &ctx).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.created_at, at);
    }

    #[test]
    fn test_insert_raises_created_at_to_newest_stored() {
        let (_dir, store) = store();
        let ctx = CallContext::background();
        let later = Utc.timestamp_millis_opt(1_680_310_900_000).unwrap();
        let earlier = Utc.timestamp_millis_opt(1_680_310_800_000).unwrap();

        store
            .insert(&NewItem::new("a", later).created_at(later), &ctx)
            .unwrap();
        let second = store
            .insert(&NewItem::new("b", earlier).created_at(earlier), &ctx)
            .unwrap();
        assert_eq!(second.created_at, later);
        assert_eq!(store.get(second.id, &ctx).unwrap().unwrap().created_at, later);
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.get(42, &CallContext::background()).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.delete(42, &CallContext::background()).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert_eq!(err.op(), Some("delete"));
    }

    #[test]
    fn test_out_of_range_timestamp_is_decode_failure() {
        let (_dir, store) = store();
        let ctx = CallContext::background();
        {
            let conn = store.pool().acquire(&ctx).unwrap();
            conn.execute(
                "INSERT INTO todo (description, created_at, deadline_at) VALUES ('x', ?1, 0)",
                [i64::MAX],
            )
            .unwrap();
        }
        let err = store.get(1, &ctx).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DecodeFailure);
    }

    #[test]
    fn test_text_in_integer_column_is_decode_failure() {
        let (_dir, store) = store();
        let ctx = CallContext::background();
        {
            let conn = store.pool().acquire(&ctx).unwrap();
            conn.execute(
                "INSERT INTO todo (description, created_at, deadline_at) VALUES ('x', 'yesterday', 0)",
                [],
            )
            .unwrap();
        }
        let err = store.get(1, &ctx).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DecodeFailure);
    }
}

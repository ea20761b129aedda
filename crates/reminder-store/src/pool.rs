//! Bounded connection pool
//!
//! Connections are opened lazily up to `max_size`. `acquire` hands out a
//! `PooledConnection` guard that returns the connection to the pool when it
//! drops, so every exit path (including `?` and panics) releases it.
//! Waiting for a free connection honours both the pool's acquire timeout and
//! the caller's `CallContext`.

#![allow(clippy::result_large_err)]

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use reminder_core::config::DatabaseConfig;
use reminder_core::context::CallContext;
use rusqlite::Connection;

use crate::db;
use crate::errors::{Result, StoreError};
use crate::migrations::apply_migrations;

/// Longest single wait between cancellation checks
const WAIT_SLICE: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub max_size: usize,
    pub acquire_timeout: Duration,
    pub busy_timeout: Duration,
}

impl From<&DatabaseConfig> for PoolOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_size: config.pool_size.max(1),
            acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub open: usize,
    pub idle: usize,
}

impl PoolStatus {
    pub fn in_use(&self) -> usize {
        self.open - self.idle
    }
}

#[derive(Default)]
struct PoolState {
    idle: Vec<Connection>,
    /// Connections that exist, idle or checked out
    open: usize,
}

pub struct ConnectionPool {
    path: PathBuf,
    options: PoolOptions,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl ConnectionPool {
    /// Open the database at `path`, bring its schema up to date, and keep
    /// that first connection in the pool
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the database cannot be opened, `Migration` if
    /// the schema cannot be brought up to date.
    pub fn open(path: impl AsRef<Path>, options: PoolOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut conn = db::open(&path)?;
        db::configure(&conn, options.busy_timeout)?;
        apply_migrations(&mut conn)?;

        tracing::debug!(path = %path.display(), max_size = options.max_size, "opened connection pool");
        Ok(Self {
            path,
            options,
            state: Mutex::new(PoolState {
                idle: vec![conn],
                open: 1,
            }),
            available: Condvar::new(),
        })
    }

    /// # Errors
    ///
    /// As for `open`.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::open(&config.path, PoolOptions::from(config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> PoolStatus {
        self.state
            .lock()
            .map(|s| PoolStatus {
                open: s.open,
                idle: s.idle.len(),
            })
            .unwrap_or(PoolStatus { open: 0, idle: 0 })
    }

    /// Check out a connection
    ///
    /// # Errors
    ///
    /// `Cancelled` when `ctx` trips before or while waiting;
    /// `StoreUnavailable` when no connection frees up within the acquire
    /// timeout or a new connection cannot be opened.
    pub fn acquire(&self, ctx: &CallContext) -> Result<PooledConnection<'_>> {
        ctx.check("acquire")?;
        let started = Instant::now();
        let mut state = self.lock()?;

        loop {
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection::new(self, conn));
            }

            if state.open < self.options.max_size {
                state.open += 1;
                drop(state);
                return match self.connect() {
                    Ok(conn) => Ok(PooledConnection::new(self, conn)),
                    Err(e) => {
                        self.forget_one();
                        Err(e)
                    }
                };
            }

            let waited = started.elapsed();
            if waited >= self.options.acquire_timeout {
                return Err(StoreError::PoolTimeout {
                    waited_ms: waited.as_millis() as u64,
                }
                .into());
            }

            let mut slice = (self.options.acquire_timeout - waited).min(WAIT_SLICE);
            if let Some(remaining) = ctx.remaining() {
                slice = slice.min(remaining);
            }
            state = self
                .available
                .wait_timeout(state, slice)
                .map_err(|_| StoreError::PoolPoisoned)?
                .0;
            ctx.check("acquire")?;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>> {
        Ok(self.state.lock().map_err(|_| StoreError::PoolPoisoned)?)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = db::open(&self.path)?;
        db::configure(&conn, self.options.busy_timeout)?;
        tracing::debug!(path = %self.path.display(), "opened pooled connection");
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut state) = self.state.lock() {
            state.idle.push(conn);
        }
        self.available.notify_one();
    }

    /// A checked-out slot will not come back (failed open)
    fn forget_one(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.open = state.open.saturating_sub(1);
        }
        self.available.notify_one();
    }
}

/// A checked-out connection; returned to its pool on drop
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl<'a> PooledConnection<'a> {
    fn new(pool: &'a ConnectionPool, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
        }
    }
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    #[allow(clippy::expect_used)]
    fn deref(&self) -> &Connection {
        // Only taken in drop
        self.conn.as_ref().expect("pooled connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    #[allow(clippy::expect_used)]
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reminder_core::context::CancelToken;
    use reminder_core::errors::ExErrorKind;

    fn pool(max_size: usize, acquire_timeout_ms: u64) -> (tempfile::TempDir, ConnectionPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(
            dir.path().join("pool.db"),
            PoolOptions {
                max_size,
                acquire_timeout: Duration::from_millis(acquire_timeout_ms),
                busy_timeout: Duration::from_millis(100),
            },
        )
        .unwrap();
        (dir, pool)
    }

    #[test]
    fn test_connection_returns_to_pool_on_drop() {
        let (_dir, pool) = pool(2, 100);
        let ctx = CallContext::background();
        {
            let _a = pool.acquire(&ctx).unwrap();
            let _b = pool.acquire(&ctx).unwrap();
            assert_eq!(pool.status().in_use(), 2);
        }
        assert_eq!(pool.status(), PoolStatus { open: 2, idle: 2 });
    }

    #[test]
    fn test_exhausted_pool_times_out_as_store_unavailable() {
        let (_dir, pool) = pool(1, 30);
        let ctx = CallContext::background();
        let _held = pool.acquire(&ctx).unwrap();

        let err = pool.acquire(&ctx).err().unwrap();
        assert_eq!(err.kind(), ExErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_waiting_acquire_observes_cancellation() {
        let (_dir, pool) = pool(1, 5_000);
        let token = CancelToken::new();
        let ctx = CallContext::background().with_cancel_token(token.clone());
        let held = pool.acquire(&ctx).unwrap();

        let err = std::thread::scope(|s| {
            let waiter = s.spawn(|| pool.acquire(&ctx).err());
            std::thread::sleep(Duration::from_millis(50));
            token.cancel();
            waiter.join().unwrap()
        })
        .unwrap();
        assert_eq!(err.kind(), ExErrorKind::Cancelled);
        drop(held);
    }

    #[test]
    fn test_released_connection_wakes_a_waiter() {
        let (_dir, pool) = pool(1, 5_000);
        let ctx = CallContext::background();
        let held = pool.acquire(&ctx).unwrap();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| pool.acquire(&ctx).map(|_| ()));
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
            assert!(waiter.join().unwrap().is_ok());
        });
    }
}

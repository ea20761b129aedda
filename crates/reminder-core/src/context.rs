//! Per-call control: cancellation and deadlines
//!
//! Every store round-trip takes a `CallContext`. Stores check it before
//! acquiring a connection, while waiting for one, and after each row they
//! decode; a tripped context turns into `ExErrorKind::Cancelled` and any rows
//! already read are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reminder_core_types::RequestContext;

use crate::errors::{ExError, ReminderError, Result};

/// Cloneable cancellation flag shared between a caller and in-flight calls
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Deadline, cancellation and correlation for one call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    token: Option<CancelToken>,
    request: RequestContext,
}

impl CallContext {
    /// A context that never trips
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = request;
        self
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when no deadline is set
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail with `Cancelled` if the token fired or the deadline passed
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Cancelled`, tagged with `op` and the request id.
    pub fn check(&self, op: &str) -> Result<()> {
        let reason = if self.token.as_ref().is_some_and(CancelToken::is_cancelled) {
            Some(ReminderError::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(ReminderError::DeadlineExceeded)
        } else {
            None
        };

        match reason {
            None => Ok(()),
            Some(reason) => Err(ExError::from(reason)
                .with_op(op)
                .with_request_id(self.request.request_id.clone())),
        }
    }
}

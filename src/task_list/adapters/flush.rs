//! Flush execution helpers shared by the Unit-of-Work adapters.
//!
//! Flush transactions run on the blocking thread pool so synchronous store
//! drivers never stall the async executor. Each flush carries a
//! [`FlushDeadline`] that the transaction checks before every operation and
//! before committing, so an expired or abandoned flush rolls back instead of
//! committing late. The awaiting side is bounded by the same timeout: once it
//! elapses the caller gets [`TaskListRepositoryError::FlushTimeout`] even if
//! the transaction is still waiting for a lock or a connection.

use crate::task_list::ports::{TaskListRepositoryError, TaskListRepositoryResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Time budget applied to every flush of a repository instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    timeout: Duration,
}

impl FlushPolicy {
    /// Timeout used when none is configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a policy with the given timeout.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the flush timeout.
    #[must_use]
    pub const fn timeout(self) -> Duration {
        self.timeout
    }
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

const RUNNING: u8 = 0;
const COMMITTING: u8 = 1;
const CANCELLED: u8 = 2;

/// Deadline and cancellation state observed by a running flush.
///
/// A flush either reaches its commit point or is cancelled, never both.
#[derive(Debug, Clone)]
pub struct FlushDeadline {
    timeout: Duration,
    expires_at: Option<Instant>,
    state: Arc<AtomicU8>,
}

impl FlushDeadline {
    /// Starts a deadline `timeout` from now.
    #[must_use]
    pub fn start(timeout: Duration) -> Self {
        Self {
            timeout,
            expires_at: Instant::now().checked_add(timeout),
            state: Arc::new(AtomicU8::new(RUNNING)),
        }
    }

    /// Fails when the flush has been cancelled or has run out of time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::FlushCancelled`] or
    /// [`TaskListRepositoryError::FlushTimeout`].
    pub fn check(&self) -> TaskListRepositoryResult<()> {
        if self.state.load(Ordering::Acquire) == CANCELLED {
            return Err(TaskListRepositoryError::FlushCancelled);
        }
        if self
            .expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
        {
            return Err(TaskListRepositoryError::FlushTimeout(self.timeout));
        }
        Ok(())
    }

    /// Returns the full time budget of the flush.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the time left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires_at.map_or(Duration::MAX, |expires_at| {
            expires_at.saturating_duration_since(Instant::now())
        })
    }

    /// Claims the commit point for the transaction.
    ///
    /// After this succeeds the flush can no longer be cancelled, so the
    /// transaction must commit right away.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::FlushCancelled`] or
    /// [`TaskListRepositoryError::FlushTimeout`] when the transaction must
    /// roll back instead.
    pub fn begin_commit(&self) -> TaskListRepositoryResult<()> {
        self.check()?;
        self.state
            .compare_exchange(RUNNING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| TaskListRepositoryError::FlushCancelled)
    }

    /// Marks the flush as cancelled unless it already reached its commit
    /// point.
    pub fn cancel(&self) {
        self.try_cancel();
    }

    fn try_cancel(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Cancels the deadline when the awaiting future is dropped.
struct CancelOnDrop(FlushDeadline);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Runs a flush transaction on the blocking thread pool.
///
/// The transaction must call [`FlushDeadline::begin_commit`] right before
/// committing. Dropping the returned future before completion cancels the
/// deadline, so the transaction rolls back at its next checkpoint. When the
/// timeout elapses first the flush is cancelled the same way and the caller
/// gets [`TaskListRepositoryError::FlushTimeout`] without waiting for the
/// transaction to notice; a transaction that already claimed its commit
/// point is awaited instead.
pub(super) async fn run_flush<F>(policy: FlushPolicy, transaction: F) -> TaskListRepositoryResult<()>
where
    F: FnOnce(&FlushDeadline) -> TaskListRepositoryResult<()> + Send + 'static,
{
    let deadline = FlushDeadline::start(policy.timeout());
    let guard = CancelOnDrop(deadline.clone());
    let worker = deadline.clone();
    let mut handle = tokio::task::spawn_blocking(move || transaction(&worker));
    let joined = match tokio::time::timeout(policy.timeout(), &mut handle).await {
        Ok(joined) => joined,
        Err(_) if deadline.try_cancel() => {
            tracing::warn!(
                timeout_ms = policy.timeout().as_millis(),
                "flush deadline elapsed, abandoning transaction"
            );
            return Err(TaskListRepositoryError::FlushTimeout(policy.timeout()));
        }
        Err(_) => handle.await,
    };
    drop(guard);
    joined.map_err(TaskListRepositoryError::persistence)?
}

/// Runs a blocking read on the blocking thread pool.
pub(super) async fn run_blocking<F, T>(f: F) -> TaskListRepositoryResult<T>
where
    F: FnOnce() -> TaskListRepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(TaskListRepositoryError::persistence)?
}

//! Unit-of-Work repository port for task list persistence.

use crate::task_list::domain::{TaskList, TaskListId};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for task list repository operations.
pub type TaskListRepositoryResult<T> = Result<T, TaskListRepositoryError>;

/// Kind of a staged, not yet flushed, repository operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A whole aggregate will be inserted.
    Insert,
    /// An existing aggregate will be replaced.
    Update,
    /// An existing aggregate will be deleted.
    Delete,
}

impl OperationKind {
    /// Returns the upper-case tag used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task list persistence contract with Unit-of-Work semantics.
///
/// Writes (`add`, `update`, `remove`) are only staged; nothing reaches the
/// store until [`TaskListRepository::flush`] applies the whole batch in one
/// transaction. Reads go straight to the store and never observe staged
/// work, including the caller's own.
///
/// Staging and flushing take `&mut self`: one instance serves one logical
/// request at a time. Callers that need concurrency use one instance per
/// request.
#[async_trait]
pub trait TaskListRepository: Send + Sync {
    /// Stages an insert of the whole aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::InvalidAggregate`] when the
    /// aggregate cannot be mapped to its persisted form.
    fn add(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()>;

    /// Loads a task list from the store.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::NotFound`] when no list has the
    /// identifier, or a persistence error when the read fails.
    async fn find_by_id(&self, id: TaskListId) -> TaskListRepositoryResult<TaskList>;

    /// Loads every task list from the store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the read fails.
    async fn find_all(&self) -> TaskListRepositoryResult<Vec<TaskList>>;

    /// Stages a full replace of an existing aggregate.
    ///
    /// A missing record is only detected by [`TaskListRepository::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::InvalidAggregate`] when the
    /// aggregate cannot be mapped to its persisted form.
    fn update(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()>;

    /// Stages a delete of the aggregate with the given identifier.
    ///
    /// A missing record is only detected by [`TaskListRepository::flush`].
    ///
    /// # Errors
    ///
    /// Implementations currently never fail here; the result is kept for
    /// symmetry with the other staging operations.
    fn remove(&mut self, id: TaskListId) -> TaskListRepositoryResult<()>;

    /// Applies every staged operation in one transaction, in staging order.
    ///
    /// An empty queue returns immediately without opening a transaction. On
    /// success the queue is cleared. On failure the transaction is rolled
    /// back and the queue is left intact.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing operation,
    /// [`TaskListRepositoryError::FlushTimeout`] when the transaction
    /// outlives the configured timeout, or a persistence error when the
    /// transaction cannot be opened or committed.
    async fn flush(&mut self) -> TaskListRepositoryResult<()>;

    /// Discards every staged operation without applying it.
    fn clear(&mut self);

    /// Returns the number of staged operations.
    fn pending_count(&self) -> usize;

    /// Returns the kinds of the staged operations, in staging order.
    fn pending_operation_kinds(&self) -> Vec<OperationKind>;
}

#[async_trait]
impl<R> TaskListRepository for Box<R>
where
    R: TaskListRepository + ?Sized,
{
    fn add(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        (**self).add(task_list)
    }

    async fn find_by_id(&self, id: TaskListId) -> TaskListRepositoryResult<TaskList> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> TaskListRepositoryResult<Vec<TaskList>> {
        (**self).find_all().await
    }

    fn update(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        (**self).update(task_list)
    }

    fn remove(&mut self, id: TaskListId) -> TaskListRepositoryResult<()> {
        (**self).remove(id)
    }

    async fn flush(&mut self) -> TaskListRepositoryResult<()> {
        (**self).flush().await
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn pending_count(&self) -> usize {
        (**self).pending_count()
    }

    fn pending_operation_kinds(&self) -> Vec<OperationKind> {
        (**self).pending_operation_kinds()
    }
}

/// Errors returned by task list repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskListRepositoryError {
    /// No task list has the identifier.
    #[error("task list not found: {0}")]
    NotFound(TaskListId),

    /// A task list with the same identifier already exists.
    #[error("duplicate task list identifier: {0}")]
    DuplicateTaskList(TaskListId),

    /// The aggregate cannot be mapped to its persisted form.
    #[error("invalid task list {id}: {reason}")]
    InvalidAggregate {
        /// Offending task list.
        id: TaskListId,
        /// Description of the structural problem.
        reason: String,
    },

    /// A persisted record cannot be turned back into an aggregate.
    #[error("corrupt task list record {id}: {reason}")]
    CorruptRecord {
        /// Identifier of the damaged record.
        id: String,
        /// Description of the inconsistency.
        reason: String,
    },

    /// The flush transaction exceeded its time budget and was rolled back.
    #[error("flush exceeded its {0:?} timeout and was rolled back")]
    FlushTimeout(Duration),

    /// The flush was abandoned by its caller and was rolled back.
    #[error("flush was cancelled and rolled back")]
    FlushCancelled,

    /// Storage-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskListRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Builds a [`TaskListRepositoryError::CorruptRecord`].
    pub fn corrupt(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

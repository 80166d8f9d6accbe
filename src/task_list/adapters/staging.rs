//! Ordered queue of deferred repository operations.

use super::record::TaskListRecord;
use crate::task_list::{
    domain::{TaskList, TaskListId},
    ports::{OperationKind, TaskListRepositoryResult},
};

/// A deferred write, interpreted by an adapter at flush time.
///
/// Records are snapshots taken at staging time: later changes to the
/// aggregate do not leak into an already staged operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    /// Insert the record as a new task list.
    Insert(TaskListRecord),
    /// Replace the stored task list with the same identifier.
    Update(TaskListRecord),
    /// Delete the stored task list with the identifier.
    Delete(TaskListId),
}

impl PendingOperation {
    /// Returns the operation kind tag.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Insert(_) => OperationKind::Insert,
            Self::Update(_) => OperationKind::Update,
            Self::Delete(_) => OperationKind::Delete,
        }
    }

    /// Returns the identifier of the task list the operation targets.
    #[must_use]
    pub const fn target(&self) -> TaskListId {
        match self {
            Self::Insert(record) | Self::Update(record) => record.task_list_id(),
            Self::Delete(id) => *id,
        }
    }
}

/// Append-only queue of staged operations owned by one Unit of Work.
///
/// The queue only shrinks through [`StagedOperations::clear`], which
/// adapters call after a committed flush or on an explicit discard.
#[derive(Debug, Clone, Default)]
pub struct StagedOperations {
    operations: Vec<PendingOperation>,
}

impl StagedOperations {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Stages an insert of `task_list`.
    ///
    /// # Errors
    ///
    /// Propagates mapping failures from [`TaskListRecord::from_domain`].
    pub fn stage_insert(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        let record = TaskListRecord::from_domain(task_list)?;
        self.push(PendingOperation::Insert(record));
        Ok(())
    }

    /// Stages a full replace of `task_list`.
    ///
    /// # Errors
    ///
    /// Propagates mapping failures from [`TaskListRecord::from_domain`].
    pub fn stage_update(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        let record = TaskListRecord::from_domain(task_list)?;
        self.push(PendingOperation::Update(record));
        Ok(())
    }

    /// Stages a delete of the task list `id`.
    pub fn stage_delete(&mut self, id: TaskListId) {
        self.push(PendingOperation::Delete(id));
    }

    fn push(&mut self, operation: PendingOperation) {
        tracing::debug!(
            kind = %operation.kind(),
            task_list_id = %operation.target(),
            position = self.operations.len(),
            "staged task list operation"
        );
        self.operations.push(operation);
    }

    /// Returns `true` when nothing is staged.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the number of staged operations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns the staged operation kinds in staging order.
    #[must_use]
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.operations.iter().map(PendingOperation::kind).collect()
    }

    /// Returns the staged operations in staging order.
    #[must_use]
    pub fn operations(&self) -> &[PendingOperation] {
        &self.operations
    }

    /// Returns an owned copy of the batch for execution off the caller's
    /// thread.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PendingOperation> {
        self.operations.clone()
    }

    /// Drops every staged operation.
    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

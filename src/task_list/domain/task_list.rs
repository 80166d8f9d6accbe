//! Task list aggregate root.

use super::task::normalize_title;
use super::{Task, TaskDomainError, TaskId, TaskListId, TaskStatus, TaskStatusCounts};
use serde::{Deserialize, Serialize};

/// Aggregate root owning an ordered sequence of tasks.
///
/// Insertion order is the display and persistence order. Tasks are appended
/// with [`TaskList::add_task`] and are never removed individually; they go
/// away only when the whole list is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    id: TaskListId,
    title: String,
    #[serde(default)]
    description: String,
    tasks: Vec<Task>,
}

/// Parameter object for reconstructing a persisted task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskListData {
    /// Persisted list identifier.
    pub id: TaskListId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted tasks in list order.
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Creates an empty task list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskListTitle`] when the title is
    /// blank.
    pub fn new(title: impl Into<String>) -> Result<Self, TaskDomainError> {
        Ok(Self {
            id: TaskListId::new(),
            title: normalize_title(title.into()).ok_or(TaskDomainError::EmptyTaskListTitle)?,
            description: String::new(),
            tasks: Vec::new(),
        })
    }

    /// Sets the list description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Reconstructs a task list from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskListData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            tasks: data.tasks,
        }
    }

    /// Returns the list identifier.
    #[must_use]
    pub const fn id(&self) -> TaskListId {
        self.id
    }

    /// Returns the list title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the list description, which may be empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the tasks in list order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the task identifiers in list order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(Task::id).collect()
    }

    /// Renames the list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskListTitle`] when the title is
    /// blank; the current title is kept.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), TaskDomainError> {
        self.title = normalize_title(title.into()).ok_or(TaskDomainError::EmptyTaskListTitle)?;
        Ok(())
    }

    /// Appends a task to the end of the list.
    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Returns the task with the given identifier.
    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == task_id)
    }

    /// Returns a mutable handle to the task with the given identifier.
    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id() == task_id)
    }

    /// Returns the tasks currently in `status`, in list order.
    #[must_use]
    pub fn tasks_with_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.status() == status)
            .collect()
    }

    /// Counts the tasks of this list per status.
    #[must_use]
    pub fn status_counts(&self) -> TaskStatusCounts {
        self.tasks
            .iter()
            .fold(TaskStatusCounts::default(), |mut counts, task| {
                counts.record(task.status());
                counts
            })
    }
}

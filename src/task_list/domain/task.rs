//! Task entity owned by a task list.

use super::{TaskDomainError, TaskId, TaskSchedule, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A unit of work inside a task list.
///
/// A task starts [`TaskStatus::Pending`] and changes status only through
/// [`Task::change_status`]. Tasks created with [`Task::new_timed`] also carry
/// a [`TaskSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule: Option<TaskSchedule>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted schedule, for timed tasks.
    pub schedule: Option<TaskSchedule>,
}

impl Task {
    /// Creates a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskTitle`] when the title is blank.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        Ok(Self {
            id: TaskId::new(),
            title: normalize_title(title.into()).ok_or(TaskDomainError::EmptyTaskTitle)?,
            description: description.into(),
            status: TaskStatus::Pending,
            schedule: None,
        })
    }

    /// Creates a pending task bounded by a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskTitle`] when the title is blank.
    pub fn new_timed(
        title: impl Into<String>,
        description: impl Into<String>,
        schedule: TaskSchedule,
    ) -> Result<Self, TaskDomainError> {
        let mut task = Self::new(title, description)?;
        task.schedule = Some(schedule);
        Ok(task)
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            schedule: data.schedule,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, which may be empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the schedule of a timed task.
    #[must_use]
    pub const fn schedule(&self) -> Option<&TaskSchedule> {
        self.schedule.as_ref()
    }

    /// Returns `true` when the task carries a schedule.
    #[must_use]
    pub const fn is_timed(&self) -> bool {
        self.schedule.is_some()
    }

    /// Returns `true` when the task has been completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Moves the task to `new_status`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::FinalStatus`] when the task is already
    /// completed or cancelled; the status is left unchanged.
    pub const fn change_status(&mut self, new_status: TaskStatus) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(new_status) {
            return Err(TaskDomainError::FinalStatus {
                task_id: self.id,
                status: self.status,
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// Moves the start of a timed task's schedule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Unscheduled`] for tasks without a schedule,
    /// otherwise the errors of [`TaskSchedule::change_start_date`].
    pub fn change_start_date(
        &mut self,
        new_start: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let task_id = self.id;
        self.schedule
            .as_mut()
            .ok_or(TaskDomainError::Unscheduled(task_id))?
            .change_start_date(new_start, clock.utc())
    }

    /// Moves the end of a timed task's schedule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Unscheduled`] for tasks without a schedule,
    /// otherwise the errors of [`TaskSchedule::change_end_date`].
    pub fn change_end_date(
        &mut self,
        new_end: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let task_id = self.id;
        self.schedule
            .as_mut()
            .ok_or(TaskDomainError::Unscheduled(task_id))?
            .change_end_date(new_end, clock.utc())
    }
}

/// Trims a title, returning `None` when nothing remains.
pub(super) fn normalize_title(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() == raw.len() {
        return Some(raw);
    }
    Some(trimmed.to_owned())
}

//! Task manager use cases over the task list repository port.

use crate::task_list::{
    domain::{Task, TaskDomainError, TaskId, TaskList, TaskListId, TaskSchedule, TaskStatus},
    ports::{TaskListRepository, TaskListRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Request payload for creating a task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskListRequest {
    title: String,
    description: Option<String>,
}

impl CreateTaskListRequest {
    /// Creates a request with the list title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Sets the list description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for adding a task to a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    schedule: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl CreateTaskRequest {
    /// Creates a request with the task title and an empty description.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            schedule: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Makes the task a timed task spanning `start_date..=end_date`.
    #[must_use]
    pub const fn with_schedule(mut self, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        self.schedule = Some((start_date, end_date));
        self
    }
}

/// Request payload for moving a timed task's schedule.
///
/// Unset dates are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescheduleTaskRequest {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl RescheduleTaskRequest {
    /// Creates a request that changes nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            start_date: None,
            end_date: None,
        }
    }

    /// Moves the start date.
    #[must_use]
    pub const fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Moves the end date.
    #[must_use]
    pub const fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

/// Service-level errors for task manager operations.
#[derive(Debug, Error)]
pub enum TaskManagerError {
    /// No task list matches the identifier.
    #[error("task list not found: {0}")]
    TaskListNotFound(String),

    /// The list has no task with the identifier.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// The caller supplied an unknown status token.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskListRepositoryError),
}

/// Result type for task manager operations.
pub type TaskManagerResult<T> = Result<T, TaskManagerError>;

/// Task list orchestration service.
///
/// The service owns one Unit of Work. Use cases that write take `&mut self`
/// and finish with a flush; when that flush fails the staged operations are
/// discarded before the error is returned.
///
/// This differs from the bare repository contract, where a failed
/// [`TaskListRepository::flush`] leaves the queue intact for a retry. A use
/// case that fails is not retried by the service, so keeping its staged work
/// would only leak it into the next use case's flush. Callers that want to
/// retry a batch drive the repository directly.
pub struct TaskManagerService<R, C>
where
    R: TaskListRepository,
    C: Clock + Send + Sync,
{
    repository: R,
    clock: Arc<C>,
}

impl<R, C> TaskManagerService<R, C>
where
    R: TaskListRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task manager service.
    #[must_use]
    pub const fn new(repository: R, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns the underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Consumes the service and returns its repository.
    #[must_use]
    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Creates and persists a new task list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::Domain`] for a blank title or
    /// [`TaskManagerError::Repository`] when persistence fails.
    #[instrument(skip(self))]
    pub async fn create_task_list(
        &mut self,
        request: CreateTaskListRequest,
    ) -> TaskManagerResult<TaskList> {
        let mut task_list = TaskList::new(request.title)?;
        if let Some(description) = request.description {
            task_list = task_list.with_description(description);
        }

        self.repository.add(&task_list)?;
        self.commit().await?;
        tracing::info!(task_list_id = %task_list.id(), "created task list");
        Ok(task_list)
    }

    /// Loads a task list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::TaskListNotFound`] when the identifier is
    /// malformed or unknown, and passes other repository failures through.
    #[instrument(skip(self))]
    pub async fn get_task_list(&self, list_id: &str) -> TaskManagerResult<TaskList> {
        let id = parse_list_id(list_id)?;
        self.repository
            .find_by_id(id)
            .await
            .map_err(|err| list_error(list_id, err))
    }

    /// Lists every stored task list, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::Repository`] when the read fails.
    #[instrument(skip(self))]
    pub async fn list_task_lists(&self) -> TaskManagerResult<Vec<TaskList>> {
        Ok(self.repository.find_all().await?)
    }

    /// Appends a new pending task to a list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::TaskListNotFound`] when the list does not
    /// exist, [`TaskManagerError::Domain`] for a blank title or an invalid
    /// schedule, or [`TaskManagerError::Repository`] when persistence fails.
    #[instrument(skip(self))]
    pub async fn add_task_to_list(
        &mut self,
        list_id: &str,
        request: CreateTaskRequest,
    ) -> TaskManagerResult<Task> {
        let mut task_list = self.get_task_list(list_id).await?;

        let task = match request.schedule {
            Some((start_date, end_date)) => Task::new_timed(
                request.title,
                request.description,
                TaskSchedule::new(start_date, end_date)?,
            )?,
            None => Task::new(request.title, request.description)?,
        };
        task_list.add_task(task.clone());

        self.repository.update(&task_list)?;
        self.commit()
            .await
            .map_err(|err| list_error(list_id, err))?;
        tracing::info!(task_list_id = %task_list.id(), task_id = %task.id(), "added task");
        Ok(task)
    }

    /// Returns the pending tasks of a list in list order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::TaskListNotFound`] when the list does not
    /// exist.
    pub async fn get_pending_tasks(&self, list_id: &str) -> TaskManagerResult<Vec<Task>> {
        let task_list = self.get_task_list(list_id).await?;
        Ok(owned(task_list.tasks_with_status(TaskStatus::Pending)))
    }

    /// Returns the tasks of a list with the given status, in list order.
    ///
    /// The status token is validated before the list is read.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::InvalidStatus`] for an unknown token or
    /// [`TaskManagerError::TaskListNotFound`] when the list does not exist.
    #[instrument(skip(self))]
    pub async fn get_tasks_by_status(
        &self,
        list_id: &str,
        status: &str,
    ) -> TaskManagerResult<Vec<Task>> {
        let wanted = parse_status(status)?;
        let task_list = self.get_task_list(list_id).await?;
        Ok(owned(task_list.tasks_with_status(wanted)))
    }

    /// Changes the status of one task and persists the list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::InvalidStatus`] for an unknown token,
    /// [`TaskManagerError::TaskListNotFound`] or
    /// [`TaskManagerError::TaskNotFound`] for unknown identifiers,
    /// [`TaskManagerError::Domain`] when the task is already final, or
    /// [`TaskManagerError::Repository`] when persistence fails.
    #[instrument(skip(self))]
    pub async fn update_task_status(
        &mut self,
        list_id: &str,
        task_id: &str,
        status: &str,
    ) -> TaskManagerResult<Task> {
        let target = parse_status(status)?;
        let mut task_list = self.get_task_list(list_id).await?;

        let task = find_task_mut(&mut task_list, task_id)?;
        let previous = task.status();
        task.change_status(target)?;
        let updated = task.clone();

        self.repository.update(&task_list)?;
        self.commit()
            .await
            .map_err(|err| list_error(list_id, err))?;
        tracing::info!(
            task_list_id = %task_list.id(),
            task_id = %updated.id(),
            from = %previous,
            to = %target,
            "changed task status"
        );
        Ok(updated)
    }

    /// Moves the schedule of a timed task, validating against the service
    /// clock.
    ///
    /// When both dates move and the new start lies after the current end,
    /// the end is moved first so the window never inverts mid-update.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::TaskListNotFound`] or
    /// [`TaskManagerError::TaskNotFound`] for unknown identifiers,
    /// [`TaskManagerError::Domain`] for untimed tasks and date-ordering
    /// violations, or [`TaskManagerError::Repository`] when persistence
    /// fails.
    #[instrument(skip(self))]
    pub async fn reschedule_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        request: RescheduleTaskRequest,
    ) -> TaskManagerResult<Task> {
        let mut task_list = self.get_task_list(list_id).await?;
        let clock = Arc::clone(&self.clock);

        let task = find_task_mut(&mut task_list, task_id)?;
        match (request.start_date, request.end_date) {
            (Some(start), Some(end))
                if task
                    .schedule()
                    .is_some_and(|schedule| start > schedule.end_date()) =>
            {
                task.change_end_date(end, &*clock)?;
                task.change_start_date(start, &*clock)?;
            }
            (new_start, new_end) => {
                if let Some(start) = new_start {
                    task.change_start_date(start, &*clock)?;
                }
                if let Some(end) = new_end {
                    task.change_end_date(end, &*clock)?;
                }
            }
        }
        let updated = task.clone();

        self.repository.update(&task_list)?;
        self.commit()
            .await
            .map_err(|err| list_error(list_id, err))?;
        Ok(updated)
    }

    /// Deletes a task list and all of its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::TaskListNotFound`] when the list does not
    /// exist, or [`TaskManagerError::Repository`] when persistence fails.
    #[instrument(skip(self))]
    pub async fn delete_task_list(&mut self, list_id: &str) -> TaskManagerResult<()> {
        let id = parse_list_id(list_id)?;
        self.repository.remove(id)?;
        self.commit()
            .await
            .map_err(|err| list_error(list_id, err))?;
        tracing::info!(task_list_id = %id, "deleted task list");
        Ok(())
    }

    /// Loads a task list for statistics.
    ///
    /// Counting is left to the caller, see [`TaskList::status_counts`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskManagerError::TaskListNotFound`] when the list does not
    /// exist.
    pub async fn get_task_list_for_stats(&self, list_id: &str) -> TaskManagerResult<TaskList> {
        self.get_task_list(list_id).await
    }

    async fn commit(&mut self) -> Result<(), TaskListRepositoryError> {
        if let Err(err) = self.repository.flush().await {
            let discarded = self.repository.pending_count();
            self.repository.clear();
            tracing::warn!(discarded, error = %err, "flush failed, discarded staged operations");
            return Err(err);
        }
        Ok(())
    }
}

fn parse_list_id(list_id: &str) -> TaskManagerResult<TaskListId> {
    list_id
        .parse()
        .map_err(|_| TaskManagerError::TaskListNotFound(list_id.to_owned()))
}

fn parse_status(status: &str) -> TaskManagerResult<TaskStatus> {
    TaskStatus::try_from(status).map_err(|err| TaskManagerError::InvalidStatus(err.0))
}

fn find_task_mut<'a>(task_list: &'a mut TaskList, task_id: &str) -> TaskManagerResult<&'a mut Task> {
    let id = task_id
        .parse::<TaskId>()
        .map_err(|_| TaskManagerError::TaskNotFound(task_id.to_owned()))?;
    task_list
        .task_mut(id)
        .ok_or_else(|| TaskManagerError::TaskNotFound(task_id.to_owned()))
}

fn list_error(list_id: &str, err: TaskListRepositoryError) -> TaskManagerError {
    match err {
        TaskListRepositoryError::NotFound(_) => TaskManagerError::TaskListNotFound(list_id.to_owned()),
        other => TaskManagerError::Repository(other),
    }
}

fn owned(tasks: Vec<&Task>) -> Vec<Task> {
    tasks.into_iter().cloned().collect()
}

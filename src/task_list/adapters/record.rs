//! Storage-neutral persisted representation of a task list.
//!
//! Both adapters stage these records and translate them into rows or
//! documents at flush time. The root record is `{id, title, description,
//! task_ids}`; child task records travel alongside it so reads can hydrate
//! the full aggregate.

use crate::task_list::{
    domain::{
        PersistedTaskData, PersistedTaskListData, Task, TaskId, TaskList, TaskListId,
        TaskSchedule, TaskStatus,
    },
    ports::{TaskListRepositoryError, TaskListRepositoryResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Persisted root record of a task list with its child task records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListRecord {
    /// Task list identifier.
    pub id: Uuid,
    /// Task list title.
    pub title: String,
    /// Task list description.
    #[serde(default)]
    pub description: String,
    /// Child task identifiers in list order.
    pub task_ids: Vec<Uuid>,
    /// Child task records.
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// Persisted child task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: Uuid,
    /// Task title.
    pub title: String,
    /// Task description.
    #[serde(default)]
    pub description: String,
    /// Canonical status token.
    pub status: String,
    /// Schedule start for timed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Schedule end for timed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl TaskListRecord {
    /// Maps a task list aggregate to its persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::InvalidAggregate`] when two tasks
    /// of the list share an identifier.
    pub fn from_domain(task_list: &TaskList) -> TaskListRepositoryResult<Self> {
        let mut seen = HashSet::with_capacity(task_list.tasks().len());
        for task in task_list.tasks() {
            if !seen.insert(task.id()) {
                return Err(TaskListRepositoryError::InvalidAggregate {
                    id: task_list.id(),
                    reason: format!("task {} appears more than once", task.id()),
                });
            }
        }

        Ok(Self {
            id: task_list.id().into_inner(),
            title: task_list.title().to_owned(),
            description: task_list.description().to_owned(),
            task_ids: task_list
                .task_ids()
                .into_iter()
                .map(TaskId::into_inner)
                .collect(),
            tasks: task_list.tasks().iter().map(TaskRecord::from_domain).collect(),
        })
    }

    /// Returns the typed task list identifier.
    #[must_use]
    pub const fn task_list_id(&self) -> TaskListId {
        TaskListId::from_uuid(self.id)
    }

    /// Rebuilds the aggregate, ordering tasks by `task_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListRepositoryError::CorruptRecord`] when a listed task
    /// has no record, a task record is not listed, or a task record holds an
    /// unknown status or an inconsistent schedule.
    pub fn into_domain(self) -> TaskListRepositoryResult<TaskList> {
        let Self {
            id,
            title,
            description,
            task_ids,
            tasks,
        } = self;

        if tasks.len() != task_ids.len() {
            return Err(TaskListRepositoryError::corrupt(
                id,
                format!(
                    "{} task ids listed but {} task records stored",
                    task_ids.len(),
                    tasks.len()
                ),
            ));
        }

        let mut by_id: HashMap<Uuid, TaskRecord> =
            tasks.into_iter().map(|task| (task.id, task)).collect();
        let mut ordered = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            let record = by_id.remove(&task_id).ok_or_else(|| {
                TaskListRepositoryError::corrupt(id, format!("missing record for task {task_id}"))
            })?;
            ordered.push(record.into_domain(id)?);
        }

        Ok(TaskList::from_persisted(PersistedTaskListData {
            id: TaskListId::from_uuid(id),
            title,
            description,
            tasks: ordered,
        }))
    }
}

impl TaskRecord {
    /// Maps a task to its persisted form.
    #[must_use]
    pub fn from_domain(task: &Task) -> Self {
        let schedule = task.schedule();
        Self {
            id: task.id().into_inner(),
            title: task.title().to_owned(),
            description: task.description().to_owned(),
            status: task.status().as_str().to_owned(),
            start_date: schedule.map(TaskSchedule::start_date),
            end_date: schedule.map(TaskSchedule::end_date),
        }
    }

    fn into_domain(self, list_id: Uuid) -> TaskListRepositoryResult<Task> {
        let status = TaskStatus::try_from(self.status.as_str())
            .map_err(|err| TaskListRepositoryError::corrupt(list_id, err.to_string()))?;
        let schedule = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(
                TaskSchedule::new(start, end)
                    .map_err(|err| TaskListRepositoryError::corrupt(list_id, err.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(TaskListRepositoryError::corrupt(
                    list_id,
                    format!("task {} has a half-set schedule", self.id),
                ));
            }
        };

        Ok(Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            title: self.title,
            description: self.description,
            status,
            schedule,
        }))
    }
}

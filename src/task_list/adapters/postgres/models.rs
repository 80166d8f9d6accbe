//! Diesel row models for task list persistence.

use super::schema::{task_lists, tasks};
use crate::task_list::adapters::record::{TaskListRecord, TaskRecord};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Query result row for task list roots.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskListRow {
    /// Task list identifier.
    pub id: Uuid,
    /// Task list title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Child task identifiers in list order.
    pub task_ids: Vec<Uuid>,
}

/// Insert model for task list roots.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_lists)]
pub struct NewTaskListRow {
    /// Task list identifier.
    pub id: Uuid,
    /// Task list title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Child task identifiers in list order.
    pub task_ids: Vec<Uuid>,
}

impl From<&TaskListRecord> for NewTaskListRow {
    fn from(record: &TaskListRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            task_ids: record.task_ids.clone(),
        }
    }
}

/// Query result row for child tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Owning task list.
    pub task_list_id: Uuid,
    /// Position inside the owning list.
    pub position: i32,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Canonical status token.
    pub status: String,
    /// Schedule start.
    pub start_date: Option<DateTime<Utc>>,
    /// Schedule end.
    pub end_date: Option<DateTime<Utc>>,
}

impl From<TaskRow> for TaskRecord {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

/// Insert model for child tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Owning task list.
    pub task_list_id: Uuid,
    /// Position inside the owning list.
    pub position: i32,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Canonical status token.
    pub status: String,
    /// Schedule start.
    pub start_date: Option<DateTime<Utc>>,
    /// Schedule end.
    pub end_date: Option<DateTime<Utc>>,
}

impl NewTaskRow {
    /// Builds the row for `task` at `position` inside list `task_list_id`.
    #[must_use]
    pub fn new(task_list_id: Uuid, position: i32, task: &TaskRecord) -> Self {
        Self {
            id: task.id,
            task_list_id,
            position,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.clone(),
            start_date: task.start_date,
            end_date: task.end_date,
        }
    }
}

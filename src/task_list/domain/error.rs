//! Error types for task list domain validation and parsing.

use super::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing or mutating task list domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task list title is empty after trimming.
    #[error("task list title must not be empty")]
    EmptyTaskListTitle,

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The task is in a final status and cannot change any further.
    #[error("cannot change status of task {task_id}: {status} is a final status")]
    FinalStatus {
        /// Task whose status change was rejected.
        task_id: TaskId,
        /// Final status the task is locked in.
        status: TaskStatus,
    },

    /// The requested start date falls after the scheduled end date.
    #[error("start date {start} cannot be after end date {end}")]
    StartAfterEnd {
        /// Rejected start date.
        start: DateTime<Utc>,
        /// Current end date.
        end: DateTime<Utc>,
    },

    /// The requested start date is in the past.
    #[error("start date {0} cannot be before the current date")]
    StartBeforeNow(DateTime<Utc>),

    /// The requested end date falls before the scheduled start date.
    #[error("end date {end} cannot be before start date {start}")]
    EndBeforeStart {
        /// Current start date.
        start: DateTime<Utc>,
        /// Rejected end date.
        end: DateTime<Utc>,
    },

    /// The requested end date is in the past.
    #[error("end date {0} cannot be before the current date")]
    EndBeforeNow(DateTime<Utc>),

    /// Date changes were requested for a task without a schedule.
    #[error("task {0} has no schedule")]
    Unscheduled(TaskId),
}

impl TaskDomainError {
    /// Returns `true` for the date-ordering family of errors raised by timed
    /// tasks.
    #[must_use]
    pub const fn is_date_ordering(&self) -> bool {
        matches!(
            self,
            Self::StartAfterEnd { .. }
                | Self::StartBeforeNow(_)
                | Self::EndBeforeStart { .. }
                | Self::EndBeforeNow(_)
        )
    }
}

/// Error returned while parsing a task status token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

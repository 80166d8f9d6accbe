//! Domain model for task lists.
//!
//! A [`TaskList`] is the aggregate root: it owns its [`Task`]s and is the
//! only value the repository persists. Task status changes go through the
//! state machine on [`Task::change_status`]. No infrastructure types cross
//! this boundary.

mod error;
mod ids;
mod schedule;
mod status;
mod task;
mod task_list;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, TaskListId};
pub use schedule::TaskSchedule;
pub use status::{TaskStatus, TaskStatusCounts};
pub use task::{PersistedTaskData, Task};
pub use task_list::{PersistedTaskListData, TaskList};

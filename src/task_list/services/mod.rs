//! Application services for task list orchestration.

mod task_manager;

pub use task_manager::{
    CreateTaskListRequest, CreateTaskRequest, RescheduleTaskRequest, TaskManagerError,
    TaskManagerResult, TaskManagerService,
};

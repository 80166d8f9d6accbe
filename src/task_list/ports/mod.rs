//! Port contracts for task list persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the task manager
//! service.

pub mod repository;

pub use repository::{
    OperationKind, TaskListRepository, TaskListRepositoryError, TaskListRepositoryResult,
};

//! `PostgreSQL` adapters for task list persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskListRepository, TaskListPgPool};

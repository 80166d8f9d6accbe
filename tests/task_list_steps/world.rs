//! Shared world state for task list BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tasklists::task_list::{
    adapters::document::{DocumentStore, DocumentTaskListRepository},
    domain::{Task, TaskList},
    services::{TaskManagerResult, TaskManagerService},
};

/// Service type used by the BDD world.
pub type TestTaskManager = TaskManagerService<DocumentTaskListRepository, DefaultClock>;

/// Scenario world for task list behaviour tests.
pub struct TaskListWorld {
    /// The task manager under test.
    pub service: TestTaskManager,
    /// Identifier of the list the scenario works on.
    pub list_id: Option<String>,
    /// Task identifiers keyed by title.
    pub task_ids: HashMap<String, String>,
    /// Result of the last status update.
    pub last_update_result: Option<TaskManagerResult<Task>>,
    /// Result of the last list lookup.
    pub last_lookup_result: Option<TaskManagerResult<TaskList>>,
}

impl TaskListWorld {
    /// Creates a world over an empty in-memory document store.
    #[must_use]
    pub fn new() -> Self {
        let service = TaskManagerService::new(
            DocumentTaskListRepository::new(DocumentStore::in_memory()),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            list_id: None,
            task_ids: HashMap::new(),
            last_update_result: None,
            last_lookup_result: None,
        }
    }

    /// Returns the scenario's list identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when no list has been created yet.
    pub fn list_id(&self) -> Result<String, eyre::Report> {
        self.list_id
            .clone()
            .ok_or_else(|| eyre::eyre!("missing task list in scenario world"))
    }

    /// Returns the identifier of the task with `title`.
    ///
    /// # Errors
    ///
    /// Returns an error when no task with the title was added.
    pub fn task_id(&self, title: &str) -> Result<String, eyre::Report> {
        self.task_ids
            .get(title)
            .cloned()
            .ok_or_else(|| eyre::eyre!("no task titled '{title}' in scenario world"))
    }
}

impl Default for TaskListWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskListWorld {
    TaskListWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Splits a comma-separated list of titles.
pub fn titles(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
        .collect()
}

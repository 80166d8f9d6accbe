//! Walks through the Unit-of-Work repository against the configured store.
//!
//! Usage:
//!
//! ```text
//! tasklists-demo [config.toml]
//! ```
//!
//! Without a file the in-memory document store is used. Environment
//! variables prefixed with `TASKLISTS__` override file values, for example
//! `TASKLISTS__STORE__BACKEND=postgres` with
//! `TASKLISTS__STORE__DATABASE_URL=postgres://...`.

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use std::sync::Arc;
use tasklists::config::Settings;
use tasklists::store::StoreHandle;
use tasklists::task_list::{
    domain::TaskList,
    ports::TaskListRepository,
    services::{CreateTaskListRequest, CreateTaskRequest, TaskManagerService},
};
use tasklists::telemetry;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config_path = std::env::args().nth(1).map(Utf8PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    telemetry::init(&settings.log_filter)?;

    let store = StoreHandle::open(&settings.store)?;
    let policy = settings.flush_policy();

    let mut repository = store.unit_of_work(policy);
    walk_unit_of_work(repository.as_mut()).await?;

    let mut service = TaskManagerService::new(store.unit_of_work(policy), Arc::new(DefaultClock));
    walk_task_manager(&mut service).await?;

    store.close();
    Ok(())
}

async fn walk_unit_of_work(repository: &mut dyn TaskListRepository) -> Result<(), BoxError> {
    let mut groceries = TaskList::new("Supermarket shopping")?;
    let chores = TaskList::new("House chores")?;
    let projects = TaskList::new("Personal projects")?;

    repository.add(&groceries)?;
    repository.add(&chores)?;
    repository.add(&projects)?;
    tracing::info!(
        pending = repository.pending_count(),
        kinds = ?repository.pending_operation_kinds(),
        "staged inserts"
    );

    repository.flush().await?;
    log_lists("after first flush", &repository.find_all().await?);

    groceries.rename("Updated shopping list")?;
    repository.update(&groceries)?;
    repository.remove(projects.id())?;
    tracing::info!(
        pending = repository.pending_count(),
        kinds = ?repository.pending_operation_kinds(),
        "staged update and delete"
    );

    repository.flush().await?;
    log_lists("after second flush", &repository.find_all().await?);
    Ok(())
}

async fn walk_task_manager(
    service: &mut TaskManagerService<Box<dyn TaskListRepository>, DefaultClock>,
) -> Result<(), BoxError> {
    let list = service
        .create_task_list(CreateTaskListRequest::new("Groceries"))
        .await?;
    let list_id = list.id().to_string();

    let task = service
        .add_task_to_list(&list_id, CreateTaskRequest::new("Buy milk"))
        .await?;
    service
        .update_task_status(&list_id, &task.id().to_string(), "completed")
        .await?;

    let pending = service.get_pending_tasks(&list_id).await?;
    let counts = service
        .get_task_list_for_stats(&list_id)
        .await?
        .status_counts();
    tracing::info!(
        pending = pending.len(),
        total = counts.total,
        completed = counts.completed,
        "groceries statistics"
    );
    Ok(())
}

fn log_lists(stage: &str, lists: &[TaskList]) {
    tracing::info!(stage, total = lists.len(), "task lists in store");
    for list in lists {
        tracing::info!(id = %list.id(), title = list.title(), "task list");
    }
}

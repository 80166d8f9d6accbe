//! Task manager use cases against the `PostgreSQL` adapter.

use crate::postgres::helpers::{PostgresContext, database};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use tasklists::task_list::{
    domain::{TaskDomainError, TaskStatus},
    ports::TaskListRepository,
    services::{CreateTaskListRequest, CreateTaskRequest, TaskManagerError, TaskManagerService},
};

#[rstest]
fn groceries_statistics_survive_a_new_unit_of_work(database: PostgresContext) {
    let mut service = TaskManagerService::new(database.repository(), Arc::new(DefaultClock));

    let list_id = database
        .rt
        .block_on(service.create_task_list(CreateTaskListRequest::new("Groceries")))
        .expect("create list")
        .id()
        .to_string();
    let milk = database
        .rt
        .block_on(service.add_task_to_list(&list_id, CreateTaskRequest::new("Buy milk")))
        .expect("add milk");
    database
        .rt
        .block_on(service.add_task_to_list(&list_id, CreateTaskRequest::new("Buy bread")))
        .expect("add bread");
    database
        .rt
        .block_on(service.update_task_status(&list_id, &milk.id().to_string(), "completed"))
        .expect("complete milk");

    let reader = TaskManagerService::new(database.repository(), Arc::new(DefaultClock));
    let counts = database
        .rt
        .block_on(reader.get_task_list_for_stats(&list_id))
        .expect("stats")
        .status_counts();
    let pending = database
        .rt
        .block_on(reader.get_pending_tasks(&list_id))
        .expect("pending tasks");

    assert_eq!((counts.total, counts.completed, counts.pending), (2, 1, 1));
    assert_eq!(
        pending.iter().map(|task| task.title()).collect::<Vec<_>>(),
        vec!["Buy bread"]
    );
}

#[rstest]
fn final_status_and_missing_lists_are_reported(database: PostgresContext) {
    let mut service = TaskManagerService::new(database.repository(), Arc::new(DefaultClock));
    let list_id = database
        .rt
        .block_on(service.create_task_list(CreateTaskListRequest::new("Chores")))
        .expect("create list")
        .id()
        .to_string();
    let task_id = database
        .rt
        .block_on(service.add_task_to_list(&list_id, CreateTaskRequest::new("Mop floor")))
        .expect("add task")
        .id()
        .to_string();
    database
        .rt
        .block_on(service.update_task_status(&list_id, &task_id, "cancelled"))
        .expect("cancel task");

    let reopened = database
        .rt
        .block_on(service.update_task_status(&list_id, &task_id, "in_progress"));
    assert!(matches!(
        reopened,
        Err(TaskManagerError::Domain(TaskDomainError::FinalStatus {
            status: TaskStatus::Cancelled,
            ..
        }))
    ));

    database
        .rt
        .block_on(service.delete_task_list(&list_id))
        .expect("delete list");
    assert!(matches!(
        database.rt.block_on(service.delete_task_list(&list_id)),
        Err(TaskManagerError::TaskListNotFound(_))
    ));
    assert_eq!(service.repository().pending_count(), 0);
}

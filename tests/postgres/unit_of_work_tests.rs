//! Unit-of-Work behaviour of the `PostgreSQL` repository.

use crate::postgres::helpers::{PostgresContext, database};
use chrono::{Duration, Utc};
use rstest::rstest;
use tasklists::task_list::{
    adapters::FlushPolicy,
    domain::{Task, TaskList, TaskListId, TaskSchedule, TaskStatus},
    ports::{OperationKind, TaskListRepository, TaskListRepositoryError},
};

fn list(title: &str) -> TaskList {
    TaskList::new(title).expect("valid task list")
}

fn shopping_list() -> TaskList {
    let mut groceries = list("Groceries").with_description("weekly");
    let now = Utc::now();
    let schedule =
        TaskSchedule::new(now + Duration::days(1), now + Duration::days(2)).expect("ordered");
    let mut bread = Task::new("Buy bread", "").expect("valid task");
    bread
        .change_status(TaskStatus::InProgress)
        .expect("pending task can start");
    groceries.add_task(Task::new("Buy milk", "semi-skimmed").expect("valid task"));
    groceries.add_task(bread);
    groceries.add_task(Task::new_timed("Order cake", "", schedule).expect("valid task"));
    groceries
}

#[rstest]
fn flushed_aggregate_is_hydrated_in_order(database: PostgresContext) {
    let mut repository = database.repository();
    let groceries = shopping_list();

    repository.add(&groceries).expect("stage insert");
    database
        .rt
        .block_on(repository.flush())
        .expect("flush succeeds");

    let stored = database
        .rt
        .block_on(database.repository().find_by_id(groceries.id()))
        .expect("stored list");
    assert_eq!(stored, groceries);
    assert_eq!(repository.pending_count(), 0);
}

#[rstest]
fn reads_do_not_see_staged_work(database: PostgresContext) {
    let mut repository = database.repository();
    let groceries = list("Groceries");

    repository.add(&groceries).expect("stage insert");

    assert!(matches!(
        database.rt.block_on(repository.find_by_id(groceries.id())),
        Err(TaskListRepositoryError::NotFound(_))
    ));
    assert!(
        database
            .rt
            .block_on(repository.find_all())
            .expect("read all")
            .is_empty()
    );
}

#[rstest]
fn failed_batch_rolls_back_and_keeps_queue(database: PostgresContext) {
    let mut repository = database.repository();
    let missing = TaskListId::new();
    let groceries = shopping_list();

    repository.add(&groceries).expect("stage insert");
    repository.remove(missing).expect("stage delete");

    let result = database.rt.block_on(repository.flush());

    assert!(matches!(
        result,
        Err(TaskListRepositoryError::NotFound(id)) if id == missing
    ));
    assert!(
        database
            .rt
            .block_on(repository.find_all())
            .expect("read all")
            .is_empty()
    );
    assert_eq!(
        repository.pending_operation_kinds(),
        vec![OperationKind::Insert, OperationKind::Delete]
    );
}

#[rstest]
fn duplicate_insert_is_rejected(database: PostgresContext) {
    let mut repository = database.repository();
    let groceries = list("Groceries");
    repository.add(&groceries).expect("stage insert");
    database
        .rt
        .block_on(repository.flush())
        .expect("first flush");

    repository.add(&groceries).expect("stage insert again");

    assert!(matches!(
        database.rt.block_on(repository.flush()),
        Err(TaskListRepositoryError::DuplicateTaskList(id)) if id == groceries.id()
    ));
}

#[rstest]
fn update_replaces_tasks_and_delete_cascades(database: PostgresContext) {
    let mut repository = database.repository();
    let mut groceries = shopping_list();
    let chores = list("House chores");
    repository.add(&groceries).expect("stage insert");
    repository.add(&chores).expect("stage insert");
    database.rt.block_on(repository.flush()).expect("insert flush");

    groceries.rename("Updated shopping list").expect("valid title");
    groceries.add_task(Task::new("Buy eggs", "").expect("valid task"));
    repository.update(&groceries).expect("stage update");
    repository.remove(chores.id()).expect("stage delete");
    database.rt.block_on(repository.flush()).expect("mixed flush");

    let all = database
        .rt
        .block_on(repository.find_all())
        .expect("read all");
    assert_eq!(all, vec![groceries.clone()]);

    repository.remove(groceries.id()).expect("stage delete");
    database.rt.block_on(repository.flush()).expect("delete flush");
    database
        .execute("DO $$ BEGIN IF EXISTS (SELECT 1 FROM tasks) THEN RAISE EXCEPTION 'orphan tasks'; END IF; END $$")
        .expect("tasks are removed with their list");
}

#[rstest]
fn long_titles_round_trip(database: PostgresContext) {
    let title = "x".repeat(300);
    let mut repository = database.repository();
    let mut groceries = list(&title);
    groceries.add_task(Task::new(title.as_str(), "").expect("valid task"));

    repository.add(&groceries).expect("stage insert");
    database
        .rt
        .block_on(repository.flush())
        .expect("flush succeeds");

    let stored = database
        .rt
        .block_on(database.repository().find_by_id(groceries.id()))
        .expect("stored list");
    assert_eq!(stored, groceries);
}

#[rstest]
fn update_of_missing_list_is_not_found(database: PostgresContext) {
    let mut repository = database.repository();
    let ghost = list("Never stored");

    repository.update(&ghost).expect("stage update");

    assert!(matches!(
        database.rt.block_on(repository.flush()),
        Err(TaskListRepositoryError::NotFound(id)) if id == ghost.id()
    ));
}

#[rstest]
fn expired_deadline_rolls_back(database: PostgresContext) {
    let mut repository =
        database.repository_with_policy(FlushPolicy::new(std::time::Duration::ZERO));

    repository.add(&list("Groceries")).expect("stage insert");

    assert!(matches!(
        database.rt.block_on(repository.flush()),
        Err(TaskListRepositoryError::FlushTimeout(_))
    ));
    assert_eq!(repository.pending_count(), 1);
    assert!(
        database
            .rt
            .block_on(database.repository().find_all())
            .expect("read all")
            .is_empty()
    );
}

#[rstest]
fn corrupt_rows_surface_as_corrupt_records(database: PostgresContext) {
    let id = TaskListId::new();
    database
        .execute(&format!(
            "INSERT INTO task_lists (id, title, task_ids) VALUES ('{id}', 'Broken', ARRAY['{}']::uuid[])",
            uuid::Uuid::now_v7()
        ))
        .expect("seed broken row");

    assert!(matches!(
        database.rt.block_on(database.repository().find_by_id(id)),
        Err(TaskListRepositoryError::CorruptRecord { .. })
    ));
}

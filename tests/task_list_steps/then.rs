//! Then steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async, titles};
use rstest_bdd_macros::then;
use tasklists::task_list::{domain::TaskDomainError, services::TaskManagerError};

#[then("the list has {total:usize} tasks with {completed:usize} completed")]
fn list_has_counts(
    world: &TaskListWorld,
    total: usize,
    completed: usize,
) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    let counts = run_async(world.service.get_task_list_for_stats(&list_id))
        .map_err(|err| eyre::eyre!("load statistics failed: {err}"))?
        .status_counts();
    if (counts.total, counts.completed) != (total, completed) {
        return Err(eyre::eyre!(
            "expected {total} tasks with {completed} completed, found {counts:?}"
        ));
    }
    Ok(())
}

#[then(r#"the pending tasks are "{names}""#)]
fn pending_tasks_are(world: &TaskListWorld, names: String) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    let pending: Vec<String> = run_async(world.service.get_pending_tasks(&list_id))
        .map_err(|err| eyre::eyre!("load pending tasks failed: {err}"))?
        .iter()
        .map(|task| task.title().to_owned())
        .collect();
    let expected = titles(&names);
    if pending != expected {
        return Err(eyre::eyre!("expected pending {expected:?}, found {pending:?}"));
    }
    Ok(())
}

#[then("the update fails with an invalid status error")]
fn update_fails_with_invalid_status(world: &TaskListWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_update_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing update result"))?;
    if !matches!(result, Err(TaskManagerError::InvalidStatus(_))) {
        return Err(eyre::eyre!("expected InvalidStatus error, got {result:?}"));
    }
    Ok(())
}

#[then("the update fails with a final status error")]
fn update_fails_with_final_status(world: &TaskListWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_update_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing update result"))?;
    if !matches!(
        result,
        Err(TaskManagerError::Domain(TaskDomainError::FinalStatus { .. }))
    ) {
        return Err(eyre::eyre!("expected FinalStatus error, got {result:?}"));
    }
    Ok(())
}

#[then("loading the list fails with a not found error")]
fn loading_fails_with_not_found(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    let result = run_async(world.service.get_task_list(&list_id));
    let not_found = matches!(result, Err(TaskManagerError::TaskListNotFound(_)));
    world.last_lookup_result = Some(result);
    if !not_found {
        return Err(eyre::eyre!("expected TaskListNotFound, got {:?}", world.last_lookup_result));
    }
    Ok(())
}

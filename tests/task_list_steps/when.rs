//! When steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"task "{title}" is marked "{status}""#)]
fn task_is_marked(
    world: &mut TaskListWorld,
    title: String,
    status: String,
) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    let task_id = world.task_id(&title)?;
    let result = run_async(
        world
            .service
            .update_task_status(&list_id, &task_id, &status),
    );
    world.last_update_result = Some(result);
    Ok(())
}

#[when("the list is deleted")]
fn the_list_is_deleted(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    run_async(world.service.delete_task_list(&list_id)).wrap_err("delete task list")?;
    Ok(())
}

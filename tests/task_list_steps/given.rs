//! Given steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async, titles};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasklists::task_list::services::{CreateTaskListRequest, CreateTaskRequest};

#[given(r#"a task list titled "{title}""#)]
fn a_task_list_titled(world: &mut TaskListWorld, title: String) -> Result<(), eyre::Report> {
    let created = run_async(
        world
            .service
            .create_task_list(CreateTaskListRequest::new(title)),
    )
    .wrap_err("create task list for scenario")?;
    world.list_id = Some(created.id().to_string());
    Ok(())
}

#[given(r#"the list has tasks "{names}""#)]
fn the_list_has_tasks(world: &mut TaskListWorld, names: String) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    for title in titles(&names) {
        let task = run_async(
            world
                .service
                .add_task_to_list(&list_id, CreateTaskRequest::new(title.clone())),
        )
        .wrap_err_with(|| format!("add task '{title}' for scenario"))?;
        world.task_ids.insert(title, task.id().to_string());
    }
    Ok(())
}

#[given(r#"task "{title}" has been marked "{status}""#)]
fn task_has_been_marked(
    world: &mut TaskListWorld,
    title: String,
    status: String,
) -> Result<(), eyre::Report> {
    let list_id = world.list_id()?;
    let task_id = world.task_id(&title)?;
    run_async(
        world
            .service
            .update_task_status(&list_id, &task_id, &status),
    )
    .wrap_err("prepare task status for scenario")?;
    Ok(())
}

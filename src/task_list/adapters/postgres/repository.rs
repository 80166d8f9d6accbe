//! `PostgreSQL` Unit-of-Work repository for task lists.

use super::{
    models::{NewTaskListRow, NewTaskRow, TaskListRow, TaskRow},
    schema::{task_lists, tasks},
};
use crate::task_list::{
    adapters::{
        flush::{FlushDeadline, FlushPolicy, run_blocking, run_flush},
        record::{TaskListRecord, TaskRecord},
        staging::{PendingOperation, StagedOperations},
    },
    domain::{TaskList, TaskListId},
    ports::{OperationKind, TaskListRepository, TaskListRepositoryError, TaskListRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by task list adapters.
pub type TaskListPgPool = Pool<ConnectionManager<PgConnection>>;

/// Largest value `statement_timeout` accepts, in milliseconds.
const MAX_STATEMENT_TIMEOUT_MS: u128 = 2_147_483_647;

impl From<DieselError> for TaskListRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed task list repository.
///
/// Each instance owns its own queue of staged operations and shares the
/// connection pool. A flush runs on one pooled connection inside a single
/// transaction.
#[derive(Debug, Clone)]
pub struct PostgresTaskListRepository {
    pool: TaskListPgPool,
    staged: StagedOperations,
    policy: FlushPolicy,
}

impl PostgresTaskListRepository {
    /// Creates a repository with the default flush policy.
    #[must_use]
    pub fn new(pool: TaskListPgPool) -> Self {
        Self::with_policy(pool, FlushPolicy::default())
    }

    /// Creates a repository with an explicit flush policy.
    #[must_use]
    pub const fn with_policy(pool: TaskListPgPool, policy: FlushPolicy) -> Self {
        Self {
            pool,
            staged: StagedOperations::new(),
            policy,
        }
    }

    async fn with_connection<F, T>(&self, f: F) -> TaskListRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskListRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(move || {
            let mut connection = pool.get().map_err(TaskListRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
    }
}

#[async_trait]
impl TaskListRepository for PostgresTaskListRepository {
    fn add(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        self.staged.stage_insert(task_list)
    }

    async fn find_by_id(&self, id: TaskListId) -> TaskListRepositoryResult<TaskList> {
        self.with_connection(move |connection| {
            let row = task_lists::table
                .find(id.into_inner())
                .select(TaskListRow::as_select())
                .first::<TaskListRow>(connection)
                .optional()?
                .ok_or(TaskListRepositoryError::NotFound(id))?;
            let task_rows = tasks::table
                .filter(tasks::task_list_id.eq(row.id))
                .order(tasks::position.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows_to_record(row, task_rows).into_domain()
        })
        .await
    }

    async fn find_all(&self) -> TaskListRepositoryResult<Vec<TaskList>> {
        self.with_connection(|connection| {
            let rows = task_lists::table
                .order(task_lists::id.asc())
                .select(TaskListRow::as_select())
                .load::<TaskListRow>(connection)?;
            let list_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
            let all_task_rows = tasks::table
                .filter(tasks::task_list_id.eq_any(list_ids))
                .order((tasks::task_list_id.asc(), tasks::position.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;

            let mut tasks_by_list: HashMap<Uuid, Vec<TaskRow>> = HashMap::new();
            for task_row in all_task_rows {
                tasks_by_list
                    .entry(task_row.task_list_id)
                    .or_default()
                    .push(task_row);
            }

            rows.into_iter()
                .map(|row| {
                    let task_rows = tasks_by_list.remove(&row.id).unwrap_or_default();
                    rows_to_record(row, task_rows).into_domain()
                })
                .collect()
        })
        .await
    }

    fn update(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        self.staged.stage_update(task_list)
    }

    fn remove(&mut self, id: TaskListId) -> TaskListRepositoryResult<()> {
        self.staged.stage_delete(id);
        Ok(())
    }

    async fn flush(&mut self) -> TaskListRepositoryResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let pool = self.pool.clone();
        let operations = self.staged.snapshot();
        let count = operations.len();
        run_flush(self.policy, move |deadline| {
            let mut connection = checkout(&pool, deadline)?;
            connection.transaction::<_, TaskListRepositoryError, _>(|conn| {
                apply_statement_timeout(conn, deadline)?;
                for (position, operation) in operations.iter().enumerate() {
                    deadline.check()?;
                    apply_operation(conn, operation)
                        .map_err(|err| classify_timeout(err, deadline))
                        .inspect_err(|err| {
                            tracing::warn!(
                                position,
                                kind = %operation.kind(),
                                task_list_id = %operation.target(),
                                error = %err,
                                "postgres flush failed, rolling back"
                            );
                        })?;
                }
                deadline.begin_commit()
            })
        })
        .await?;

        self.staged.clear();
        tracing::info!(operations = count, "postgres flush committed");
        Ok(())
    }

    fn clear(&mut self) {
        self.staged.clear();
    }

    fn pending_count(&self) -> usize {
        self.staged.len()
    }

    fn pending_operation_kinds(&self) -> Vec<OperationKind> {
        self.staged.kinds()
    }
}

/// Checks a connection out of the pool, waiting no longer than the flush
/// deadline allows.
fn checkout(
    pool: &TaskListPgPool,
    deadline: &FlushDeadline,
) -> TaskListRepositoryResult<PooledConnection<ConnectionManager<PgConnection>>> {
    let wait = deadline.remaining().min(pool.connection_timeout());
    pool.get_timeout(wait).map_err(|err| {
        deadline
            .check()
            .err()
            .unwrap_or_else(|| TaskListRepositoryError::persistence(err))
    })
}

/// Bounds every statement of the current transaction by the time left on
/// the flush deadline.
fn apply_statement_timeout(
    connection: &mut PgConnection,
    deadline: &FlushDeadline,
) -> TaskListRepositoryResult<()> {
    let millis = deadline
        .remaining()
        .as_millis()
        .clamp(1, MAX_STATEMENT_TIMEOUT_MS);
    diesel::sql_query("SELECT set_config('statement_timeout', $1, true)")
        .bind::<diesel::sql_types::Text, _>(millis.to_string())
        .execute(connection)?;
    Ok(())
}

fn classify_timeout(err: TaskListRepositoryError, deadline: &FlushDeadline) -> TaskListRepositoryError {
    let timed_out = match &err {
        TaskListRepositoryError::Persistence(source) => matches!(
            source.downcast_ref::<DieselError>(),
            Some(DieselError::DatabaseError(_, info))
                if info.message().contains("statement timeout")
        ),
        _ => false,
    };
    if timed_out {
        TaskListRepositoryError::FlushTimeout(deadline.timeout())
    } else {
        err
    }
}

fn apply_operation(
    connection: &mut PgConnection,
    operation: &PendingOperation,
) -> TaskListRepositoryResult<()> {
    match operation {
        PendingOperation::Insert(record) => {
            diesel::insert_into(task_lists::table)
                .values(&NewTaskListRow::from(record))
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskListRepositoryError::DuplicateTaskList(record.task_list_id())
                    }
                    other => other.into(),
                })?;
            insert_tasks(connection, record)
        }
        PendingOperation::Update(record) => {
            let updated = diesel::update(task_lists::table.find(record.id))
                .set((
                    task_lists::title.eq(&record.title),
                    task_lists::description.eq(&record.description),
                    task_lists::task_ids.eq(&record.task_ids),
                ))
                .execute(connection)?;
            if updated == 0 {
                return Err(TaskListRepositoryError::NotFound(record.task_list_id()));
            }
            diesel::delete(tasks::table.filter(tasks::task_list_id.eq(record.id)))
                .execute(connection)?;
            insert_tasks(connection, record)
        }
        PendingOperation::Delete(id) => {
            let deleted =
                diesel::delete(task_lists::table.find(id.into_inner())).execute(connection)?;
            if deleted == 0 {
                return Err(TaskListRepositoryError::NotFound(*id));
            }
            Ok(())
        }
    }
}

fn insert_tasks(connection: &mut PgConnection, record: &TaskListRecord) -> TaskListRepositoryResult<()> {
    if record.tasks.is_empty() {
        return Ok(());
    }
    let rows = record
        .tasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            let position = i32::try_from(index).map_err(|_| {
                TaskListRepositoryError::InvalidAggregate {
                    id: record.task_list_id(),
                    reason: "too many tasks in one list".to_owned(),
                }
            })?;
            Ok(NewTaskRow::new(record.id, position, task))
        })
        .collect::<TaskListRepositoryResult<Vec<_>>>()?;
    diesel::insert_into(tasks::table)
        .values(&rows)
        .execute(connection)?;
    Ok(())
}

fn rows_to_record(row: TaskListRow, task_rows: Vec<TaskRow>) -> TaskListRecord {
    TaskListRecord {
        id: row.id,
        title: row.title,
        description: row.description,
        task_ids: row.task_ids,
        tasks: task_rows.into_iter().map(TaskRecord::from).collect(),
    }
}

//! Shared test helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use pg_embedded_setup_unpriv::TestCluster;
use rstest::fixture;
use tasklists::task_list::adapters::{
    FlushPolicy,
    postgres::{PostgresTaskListRepository, TaskListPgPool},
};
use tokio::runtime::Runtime;

pub use pg_embedded_setup_unpriv::test_support::shared_test_cluster;

/// Boxed error type used by the helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the task list schema.
pub const CREATE_TASK_LISTS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_task_lists/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "tasklists_test_template";

/// Creates a tokio runtime for driving async repository calls.
///
/// # Errors
///
/// Returns an error when the runtime cannot be built.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Box::new(err) as BoxError)
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_TASK_LISTS_SQL)
                .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Drops the per-test database when the test finishes, even on panic.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl CleanupGuard {
    /// Creates a guard for `db_name`.
    #[must_use]
    pub const fn new(cluster: &'static TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.db_name.as_str()) {
            tracing::warn!(db_name = %self.db_name, error = %err, "failed to drop test database");
        }
    }
}

/// Per-test database with a pool and runtime ready to use.
pub struct PostgresContext {
    /// Pool over the per-test database.
    pub pool: TaskListPgPool,
    /// Runtime used to drive async calls.
    pub rt: Runtime,
    _guard: CleanupGuard,
}

impl PostgresContext {
    /// Returns a fresh Unit of Work over the test database.
    #[must_use]
    pub fn repository(&self) -> PostgresTaskListRepository {
        PostgresTaskListRepository::new(self.pool.clone())
    }

    /// Returns a fresh Unit of Work with an explicit flush policy.
    #[must_use]
    pub fn repository_with_policy(&self, policy: FlushPolicy) -> PostgresTaskListRepository {
        PostgresTaskListRepository::with_policy(self.pool.clone(), policy)
    }

    /// Runs raw SQL against the test database.
    ///
    /// # Errors
    ///
    /// Returns an error when no connection is available or the SQL fails.
    pub fn execute(&self, sql: &str) -> Result<(), BoxError> {
        let mut conn = self.pool.get().map_err(|err| Box::new(err) as BoxError)?;
        conn.batch_execute(sql)
            .map_err(|err| Box::new(err) as BoxError)
    }
}

/// Creates a database from the template and returns a ready context.
///
/// # Errors
///
/// Returns an error if the template, database, or pool cannot be set up.
pub fn setup_context(cluster: &'static TestCluster) -> Result<PostgresContext, BoxError> {
    ensure_template(cluster)?;
    let db_name = format!("test_tasklists_{}", uuid::Uuid::now_v7().simple());
    cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let guard = CleanupGuard::new(cluster, db_name.clone());

    let url = cluster.connection().database_url(&db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(PostgresContext {
        pool,
        rt: test_runtime()?,
        _guard: guard,
    })
}

/// Fixture providing a migrated per-test database.
#[fixture]
pub fn database(shared_test_cluster: &'static TestCluster) -> PostgresContext {
    setup_context(shared_test_cluster).expect("postgres test database")
}

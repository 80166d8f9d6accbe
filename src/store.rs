//! Explicitly owned handle to the configured backing store.
//!
//! The handle is opened once at start-up, hands out one Unit of Work per
//! logical request, and is released with [`StoreHandle::close`].

use crate::config::StoreSettings;
use crate::task_list::{
    adapters::{
        FlushPolicy,
        document::{DocumentStore, DocumentStoreError, DocumentTaskListRepository},
        postgres::{PostgresTaskListRepository, TaskListPgPool},
    },
    ports::TaskListRepository,
};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// Errors raised while opening a store.
#[derive(Debug, Error)]
pub enum StoreOpenError {
    /// The `PostgreSQL` pool could not be built.
    #[error("failed to open postgres pool: {0}")]
    Pool(#[from] PoolError),

    /// The document store could not be opened.
    #[error("failed to open document store: {0}")]
    Document(#[from] DocumentStoreError),
}

/// Open connection to one backing store.
#[derive(Debug, Clone)]
pub enum StoreHandle {
    /// Relational backend.
    Postgres(TaskListPgPool),
    /// Embedded document backend.
    Document(DocumentStore),
}

impl StoreHandle {
    /// Opens the store described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreOpenError`] when the pool cannot reach the database or
    /// the document directory cannot be loaded.
    pub fn open(settings: &StoreSettings) -> Result<Self, StoreOpenError> {
        let handle = match settings {
            StoreSettings::Postgres {
                database_url,
                pool_size,
            } => {
                let manager = ConnectionManager::<PgConnection>::new(database_url.as_str());
                let pool = Pool::builder().max_size(*pool_size).build(manager)?;
                Self::Postgres(pool)
            }
            StoreSettings::Document { path: Some(path) } => {
                Self::Document(DocumentStore::open(path)?)
            }
            StoreSettings::Document { path: None } => Self::Document(DocumentStore::in_memory()),
        };
        tracing::info!(backend = handle.backend_name(), "opened store");
        Ok(handle)
    }

    /// Returns a short name of the backend.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Document(_) => "document",
        }
    }

    /// Creates a fresh Unit of Work with an empty staging queue.
    #[must_use]
    pub fn unit_of_work(&self, policy: FlushPolicy) -> Box<dyn TaskListRepository> {
        match self {
            Self::Postgres(pool) => {
                Box::new(PostgresTaskListRepository::with_policy(pool.clone(), policy))
            }
            Self::Document(store) => {
                Box::new(DocumentTaskListRepository::with_policy(store.clone(), policy))
            }
        }
    }

    /// Releases the handle.
    ///
    /// Pooled connections close once the last Unit of Work created from the
    /// handle is dropped.
    pub fn close(self) {
        tracing::info!(backend = self.backend_name(), "closed store");
    }
}

//! Document-store Unit-of-Work repository for task lists.

use super::store::{DocumentSession, DocumentStore, DocumentStoreError, ID_FIELD};
use crate::task_list::{
    adapters::{
        flush::{FlushPolicy, run_blocking, run_flush},
        record::{TaskListRecord, TaskRecord},
        staging::{PendingOperation, StagedOperations},
    },
    domain::{TaskList, TaskListId},
    ports::{OperationKind, TaskListRepository, TaskListRepositoryError, TaskListRepositoryResult},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Collection holding task list documents.
pub const TASK_LISTS_COLLECTION: &str = "task_lists";

/// Task list as stored in the document store.
///
/// Child tasks are embedded next to the ordered `task_ids` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TaskListDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    task_ids: Vec<String>,
    #[serde(default)]
    tasks: Vec<TaskRecord>,
}

impl From<&TaskListRecord> for TaskListDocument {
    fn from(record: &TaskListRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title.clone(),
            description: record.description.clone(),
            task_ids: record.task_ids.iter().map(Uuid::to_string).collect(),
            tasks: record.tasks.clone(),
        }
    }
}

impl TaskListDocument {
    fn into_record(self) -> TaskListRepositoryResult<TaskListRecord> {
        let id = parse_uuid(&self.id, &self.id)?;
        let task_ids = self
            .task_ids
            .iter()
            .map(|task_id| parse_uuid(&self.id, task_id))
            .collect::<TaskListRepositoryResult<Vec<_>>>()?;
        Ok(TaskListRecord {
            id,
            title: self.title,
            description: self.description,
            task_ids,
            tasks: self.tasks,
        })
    }
}

fn parse_uuid(document_id: &str, value: &str) -> TaskListRepositoryResult<Uuid> {
    Uuid::parse_str(value).map_err(|err| {
        TaskListRepositoryError::corrupt(document_id, format!("invalid identifier '{value}': {err}"))
    })
}

impl From<DocumentStoreError> for TaskListRepositoryError {
    fn from(err: DocumentStoreError) -> Self {
        Self::persistence(err)
    }
}

/// Task list repository backed by a [`DocumentStore`].
///
/// Each instance owns its own queue of staged operations; the store handle
/// itself is shared. A flush runs as a single document store transaction.
#[derive(Debug, Clone)]
pub struct DocumentTaskListRepository {
    store: DocumentStore,
    staged: StagedOperations,
    policy: FlushPolicy,
}

impl DocumentTaskListRepository {
    /// Creates a repository over `store` with the default flush policy.
    #[must_use]
    pub fn new(store: DocumentStore) -> Self {
        Self::with_policy(store, FlushPolicy::default())
    }

    /// Creates a repository over `store` with an explicit flush policy.
    #[must_use]
    pub const fn with_policy(store: DocumentStore, policy: FlushPolicy) -> Self {
        Self {
            store,
            staged: StagedOperations::new(),
            policy,
        }
    }

    /// Returns the underlying store handle.
    #[must_use]
    pub const fn store(&self) -> &DocumentStore {
        &self.store
    }
}

#[async_trait]
impl TaskListRepository for DocumentTaskListRepository {
    fn add(&mut self, task_list: &TaskList) -> TaskListRepositoryResult<()> {
        self.staged.stage_insert(task_list)
    }

    async fn find_by_id(&self, id: TaskListId) -> TaskListRepositoryResult<TaskList> {
        let store = self.store.clone();
        run_blocking(move || {
            let document = store
                .find_one(TASK_LISTS_COLLECTION, &id.to_string())?
                .ok_or(TaskListRepositoryError::NotFound(id))?;
            document_to_task_list(document)
        })
        .await
    }

    async fn find_all(&self) -> TaskListRepositoryResult<Vec<TaskList>> {
        let store = self.store.clone();
        run_blocking(move || {
            store
                .find_all(TASK_LISTS_COLLECTION)?
                .into_iter()
                .map(document_to_task_list)
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

        let store = self.store.clone();
        let operations = self.staged.snapshot();
        let count = operations.len();
        run_flush(self.policy, move |deadline| {
            store.with_transaction(|session| {
                for (position, operation) in operations.iter().enumerate() {
                    deadline.check()?;
                    apply_operation(session, operation).inspect_err(|err| {
                        tracing::warn!(
                            position,
                            kind = %operation.kind(),
                            task_list_id = %operation.target(),
                            error = %err,
                            "document flush failed, rolling back"
                        );
                    })?;
                }
                deadline.begin_commit()
            })
        })
        .await?;

        self.staged.clear();
        tracing::info!(operations = count, "document flush committed");
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

fn apply_operation(
    session: &mut DocumentSession,
    operation: &PendingOperation,
) -> TaskListRepositoryResult<()> {
    match operation {
        PendingOperation::Insert(record) => {
            let document = serde_json::to_value(TaskListDocument::from(record))
                .map_err(TaskListRepositoryError::persistence)?;
            session
                .insert_one(TASK_LISTS_COLLECTION, document)
                .map_err(|err| match err {
                    DocumentStoreError::DuplicateKey { .. } => {
                        TaskListRepositoryError::DuplicateTaskList(record.task_list_id())
                    }
                    other => other.into(),
                })
        }
        PendingOperation::Update(record) => {
            let Value::Object(mut fields) = serde_json::to_value(TaskListDocument::from(record))
                .map_err(TaskListRepositoryError::persistence)?
            else {
                return Err(TaskListRepositoryError::InvalidAggregate {
                    id: record.task_list_id(),
                    reason: "document did not serialize to an object".to_owned(),
                });
            };
            fields.remove(ID_FIELD);
            let matched = session.update_one(TASK_LISTS_COLLECTION, &record.id.to_string(), fields);
            if matched == 0 {
                return Err(TaskListRepositoryError::NotFound(record.task_list_id()));
            }
            Ok(())
        }
        PendingOperation::Delete(id) => {
            let deleted = session.delete_one(TASK_LISTS_COLLECTION, &id.to_string());
            if deleted == 0 {
                return Err(TaskListRepositoryError::NotFound(*id));
            }
            Ok(())
        }
    }
}

fn document_to_task_list(document: Value) -> TaskListRepositoryResult<TaskList> {
    let document_id = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let parsed = serde_json::from_value::<TaskListDocument>(document)
        .map_err(|err| TaskListRepositoryError::corrupt(&document_id, err.to_string()))?;
    parsed.into_record()?.into_domain()
}

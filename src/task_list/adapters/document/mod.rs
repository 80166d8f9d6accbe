//! Document-store adapters for task list persistence.

mod repository;
mod store;

pub use repository::{DocumentTaskListRepository, TASK_LISTS_COLLECTION};
pub use store::{DocumentSession, DocumentStore, DocumentStoreError, ID_FIELD};

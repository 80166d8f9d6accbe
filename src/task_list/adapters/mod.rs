//! Adapter implementations of the task list repository port.
//!
//! Both backends share the staged-operation queue, the persisted record
//! mapping, and the flush deadline machinery; they differ only in how a
//! batch is written and how records are read back.

pub mod document;
pub mod flush;
pub mod postgres;
pub mod record;
pub mod staging;

pub use flush::{FlushDeadline, FlushPolicy};
pub use record::{TaskListRecord, TaskRecord};
pub use staging::{PendingOperation, StagedOperations};

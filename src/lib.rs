//! Tasklists: task list aggregates behind a Unit-of-Work repository.
//!
//! Task lists and their tasks are loaded from a swappable backing store
//! (`PostgreSQL` or an embedded document store), changed in memory, and
//! written back by one atomic flush per logical request.
//!
//! # Architecture
//!
//! Tasklists follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, document store)
//!
//! # Modules
//!
//! - [`task_list`]: Domain, repository port, adapters, and task manager service
//! - [`store`]: Store handle opened at start-up and closed at shutdown
//! - [`config`]: Layered settings
//! - [`telemetry`]: Structured logging set-up

pub mod config;
pub mod store;
pub mod task_list;
pub mod telemetry;

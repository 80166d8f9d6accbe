//! Task lists and their tasks behind a Unit-of-Work repository.
//!
//! A task list aggregate is loaded, changed in memory, staged on a
//! repository, and written back by a single flush that either applies every
//! staged operation or none of them. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

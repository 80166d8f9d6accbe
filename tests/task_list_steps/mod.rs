//! Step definitions for task list BDD scenarios.

mod given;
mod then;
mod when;
pub mod world;

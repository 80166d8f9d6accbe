//! Unit tests for task list domain, adapters, and service.

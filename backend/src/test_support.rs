//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`. Compiled
//! only for tests or when the `test-support` feature is enabled.

pub mod clock;
pub mod memory;
pub mod push;

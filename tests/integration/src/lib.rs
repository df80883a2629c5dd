//! Integration test utilities for the chapter management API
//!
//! Spawns the API in-process and seeds the accounts the tests log in with.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;

//! Command implementations

pub mod accounts;
pub mod maintenance;
pub mod scoring;

//! Route handlers
//!
//! All HTTP request handlers organized by resource.

pub mod auth;
pub mod chapters;
pub mod health;
pub mod members;
pub mod scoring;

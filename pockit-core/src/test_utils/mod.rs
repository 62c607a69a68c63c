//! Test utilities and helpers for Pockit
//!
//! Shared fixtures for unit tests here and the CLI integration tests.

pub mod async_helpers;
pub mod fixtures;

pub use async_helpers::*;
pub use fixtures::*;

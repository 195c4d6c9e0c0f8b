//! Test utilities and helpers for chatstream
//!
//! This module provides common testing utilities, fixtures, and helper functions
//! shared by unit tests and the integration tests under `tests/`.

pub mod async_helpers;
pub mod fixtures;

pub use async_helpers::*;
pub use fixtures::*;

//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A scriptable billing provider mock
//! - A builder for constructing `AppState` with test dependencies

mod app_state_builder;
mod billing_mocks;
mod factories;
mod storage_mocks;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use factories::*;
pub use storage_mocks::*;

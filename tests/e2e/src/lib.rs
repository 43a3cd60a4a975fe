//! End-to-end test support for the VeritasVault dashboard engine
//!
//! - [`harness`]: isolated, temporary persisted stores
//! - [`mocks`]: scripted dashboard services and event fixtures

pub mod harness;
pub mod mocks;

pub use harness::TestStoreManager;
pub use mocks::{EventFixtures, FailingService, ScriptedService};

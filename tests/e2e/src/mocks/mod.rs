//! Mock services and fixtures

mod fixtures;
mod services;

pub use fixtures::EventFixtures;
pub use services::{FailingService, ScriptedService};

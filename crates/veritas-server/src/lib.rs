//! Veritas Server Library
//!
//! HTTP and WebSocket front end for `veritas-core`, shared by the
//! `veritas-server` binary and integration tests.

pub mod dashboard;

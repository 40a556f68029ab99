//! Integration tests for the debugger bridge
//!
//! These tests drive a full app with the debugger installed over an
//! in-memory transport.

#[path = "../common/mod.rs"]
pub mod common;

pub mod asset_snapshot;
pub mod observe_flow;
pub mod replay_flow;
pub mod write_suppression;

//! Utility modules

pub mod paths;

pub use paths::{home_dir, resolve_from_cwd};

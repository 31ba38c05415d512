//! Logging and small shared types used across the workspace.

pub mod logger;

pub use logger::{create_root_logger, create_test_logger, Logger};

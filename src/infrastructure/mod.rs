//! Infrastructure layer for filesystem and environment interactions.
//!
//! This module resolves where the tool keeps its files and expands
//! user-supplied paths.

pub mod paths;

pub use paths::{data_dir, default_log_file, expand_tilde};

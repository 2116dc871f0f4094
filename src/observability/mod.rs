//! Log output for the library and the CLI.
//!
//! All crate code logs through `tracing` macros and spans. This module installs
//! the subscriber that turns them into formatted lines.
//!
//! # Destinations
//!
//! - **stderr** (default): human-readable lines
//! - **Log file** (`log_file` config option): same lines without colour,
//!   rotated at 10MB with 3 backups kept
//!
//! # Configuration
//!
//! Level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Usage
//!
//! ```rust
//! use actionhooks::observability::init_tracing;
//! use actionhooks::Config;
//!
//! init_tracing(&Config::default());
//! tracing::debug!("tracing is now active");
//! ```
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `file_writer`: Rotating file writer with size-based rotation

mod file_writer;
mod init;

pub use file_writer::FileWriter;
pub use init::init_tracing;

//! Application layer tying registries and hooks together.
//!
//! This module sits between the entry points (`main.rs`, [`crate::initialize`])
//! and the registry/hook layers. It owns the long-lived state of a process: the
//! registries and the hooks currently contributing to them.
//!
//! # Lifecycle
//!
//! ```text
//! new(config) → load_hook()* → resolve per request → unload_hook()* → shutdown()
//! ```
//!
//! # Modules
//!
//! - [`host`]: [`ActionHost`], the owner of registries and loaded hooks

pub mod host;

pub use host::{ActionHost, HookSummary};

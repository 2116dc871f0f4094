//! Extension hooks contributing actions to the registries.
//!
//! # Modules
//!
//! - [`descriptor`]: Legacy dictionary records and their translation
//! - [`hook`]: [`ActionHook`] activation and teardown
//! - [`manifest`]: Hooks declared in TOML or JSON files

pub mod descriptor;
pub mod hook;
pub mod manifest;

pub use descriptor::LegacyDescriptor;
pub use hook::{ActionHook, HookEntry, HookKind, RegistryTarget, TeardownPolicy};
pub use manifest::{HookManifest, HookSpec};

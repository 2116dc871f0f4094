//! Action registry: ordered storage, nesting and per-request resolution.
//!
//! # Modules
//!
//! - `store`: [`ActionRegistry`] and its copy-on-write [`RegistrySnapshot`]
//! - `resolve`: Context-filtered resolution into [`ResolvedAction`] trees
//! - [`defaults`]: Built-in review request actions

pub mod defaults;
mod resolve;
mod store;

pub use resolve::{Resolved, ResolvedAction};
pub use store::{ActionRegistry, LookupAttr, RegistrySnapshot};

//! Domain layer for the action registry.
//!
//! This module contains the core domain types shared by the registry, hooks and
//! host, independent of storage, logging or configuration concerns.
//!
//! # Organization
//!
//! - [`action`]: Action model, identifiers and context-dependent behaviours
//! - [`context`]: Per-request render context handed to behaviours
//! - [`error`]: Error types and result aliases
//! - [`node`]: Nested action trees used for bulk registration
//!
//! # Examples
//!
//! ```
//! use actionhooks::domain::{Action, ActionNode, Result};
//!
//! fn update_menu() -> Result<ActionNode> {
//!     Ok(ActionNode::menu(
//!         Action::menu("update-review-request-action", "Update"),
//!         vec![Action::item("upload-file-action", "Add File").into()],
//!     ))
//! }
//! ```

pub mod action;
pub mod context;
pub mod error;
pub mod node;

pub use action::{Action, ActionId, ActionKind, ContextFn, DEFAULT_URL};
pub use context::{RenderContext, ReviewRequestInfo, ReviewRequestStatus, DIFF_VIEWER_URL_NAMES};
pub use error::{ActionError, ParentRejection, Result};
pub use node::{ActionNode, MAX_DEPTH};

//! Error types for action registration and hook dispatch.
//!
//! This module defines the centralized error type [`ActionError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.

use thiserror::Error;

/// The main error type for registry and hook operations.
///
/// Registry variants are raised to extension authors at load time and are not
/// recoverable automatically: the caller has to pick a different ID, register
/// the parent first, or flatten its menu.
///
/// # Examples
///
/// ```
/// use actionhooks::{ActionError, ActionRegistry, Action};
///
/// let registry = ActionRegistry::new("header");
/// registry.register(Action::item("help", "Help"), None)?;
///
/// let err = registry.register(Action::item("help", "Help"), None).unwrap_err();
/// assert!(matches!(err, ActionError::DuplicateId { .. }));
/// # Ok::<(), ActionError>(())
/// ```
#[derive(Debug, Error)]
pub enum ActionError {
    /// An action with the same ID is already registered.
    #[error("could not register action {action_id}: it is already registered")]
    DuplicateId {
        /// The colliding identifier.
        action_id: String,
    },

    /// The requested parent is not registered or is not a menu.
    #[error("could not register action {action_id}: parent {parent_id} {reason}")]
    UnknownParent {
        /// The action being registered.
        action_id: String,
        /// The parent that failed to resolve.
        parent_id: String,
        /// Why the parent was rejected.
        reason: ParentRejection,
    },

    /// The action would be nested deeper than the registry allows.
    #[error("{action_id} exceeds the maximum depth limit of {limit}")]
    DepthLimitExceeded {
        /// The action being registered.
        action_id: String,
        /// Maximum allowed depth.
        limit: usize,
    },

    /// No registered action matched the lookup.
    #[error("no action with {attr_name} = {attr_value:?} registered")]
    NotFound {
        /// Attribute used for the lookup (usually `action_id`).
        attr_name: String,
        /// Value that failed to match.
        attr_value: String,
    },

    /// Children were requested for an action that is not a menu.
    #[error("could not retrieve children of action {action_id}: it is not a menu action")]
    NotAMenu {
        /// The item action.
        action_id: String,
    },

    /// Lookup by an attribute the registry does not index.
    #[error("actions cannot be looked up by attribute {0:?}")]
    UnknownAttribute(String),

    /// A legacy descriptor or typed node could not be translated into an action.
    #[error("invalid action descriptor: {0}")]
    InvalidDescriptor(String),

    /// A hook was activated, deactivated, or loaded in the wrong state.
    #[error("hook {name}: {message}")]
    HookState {
        /// Hook name.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// No loaded hook carries the given name.
    #[error("no hook named {0:?} is loaded")]
    HookNotFound(String),

    /// A hook manifest could not be parsed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Configuration is invalid or missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ActionError {
    /// Builds a [`ActionError::NotFound`] for an `action_id` lookup.
    #[must_use]
    pub fn not_found(action_id: impl Into<String>) -> Self {
        Self::NotFound {
            attr_name: "action_id".to_string(),
            attr_value: action_id.into(),
        }
    }
}

/// Reason a parent ID was rejected during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRejection {
    /// No action with that ID is registered.
    NotRegistered,
    /// The parent exists but is an item, not a menu.
    NotAMenu,
}

impl std::fmt::Display for ParentRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRegistered => f.write_str("is not registered"),
            Self::NotAMenu => f.write_str("is not a menu action"),
        }
    }
}

/// A specialized `Result` type for registry and hook operations.
pub type Result<T> = std::result::Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_parent_message_names_reason() {
        let err = ActionError::UnknownParent {
            action_id: "child".to_string(),
            parent_id: "close-menu".to_string(),
            reason: ParentRejection::NotRegistered,
        };
        assert_eq!(
            err.to_string(),
            "could not register action child: parent close-menu is not registered"
        );
    }

    #[test]
    fn test_not_found_uses_action_id_attribute() {
        let err = ActionError::not_found("missing");
        assert_eq!(
            err.to_string(),
            "no action with action_id = \"missing\" registered"
        );
    }
}

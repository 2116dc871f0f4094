//! Nested action declarations.
//!
//! [`ActionNode`] is the input form for registering a whole menu at once, as
//! used by registry defaults and hooks. The registry flattens it into entries
//! linked by parent ID.

use crate::domain::action::{Action, ActionId};

/// Maximum nesting depth: top-level (0) → submenu (1) → leaf (2).
pub const MAX_DEPTH: usize = 2;

/// A leaf action or a menu with its children.
///
/// # Example
///
/// ```
/// use actionhooks::{Action, ActionNode};
///
/// let close = ActionNode::menu(Action::menu("close", "Close"), vec![
///     ActionNode::leaf(Action::item("submit", "Submitted")),
///     ActionNode::leaf(Action::item("discard", "Discarded")),
/// ]);
/// assert_eq!(close.len(), 3);
/// assert_eq!(close.children().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ActionNode {
    Leaf(Action),
    Menu(Action, Vec<ActionNode>),
}

impl ActionNode {
    #[must_use]
    pub const fn leaf(action: Action) -> Self {
        Self::Leaf(action)
    }

    #[must_use]
    pub const fn menu(action: Action, children: Vec<Self>) -> Self {
        Self::Menu(action, children)
    }

    #[must_use]
    pub const fn action(&self) -> &Action {
        match self {
            Self::Leaf(action) | Self::Menu(action, _) => action,
        }
    }

    #[must_use]
    pub const fn action_id(&self) -> &ActionId {
        &self.action().action_id
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Leaf(_) => &[],
            Self::Menu(_, children) => children,
        }
    }

    /// Total number of actions in the tree, this node included.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children().iter().map(Self::len).sum::<usize>()
    }

    /// Always `false`: a node holds at least its own action.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Applies `f` to this node's own action only.
    #[must_use]
    pub fn map_root(self, f: impl FnOnce(Action) -> Action) -> Self {
        match self {
            Self::Leaf(action) => Self::Leaf(f(action)),
            Self::Menu(action, children) => Self::Menu(f(action), children),
        }
    }
}

impl From<Action> for ActionNode {
    fn from(action: Action) -> Self {
        Self::Leaf(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ActionNode {
        ActionNode::leaf(Action::item(id, id))
    }

    #[test]
    fn test_len_counts_every_action() {
        assert_eq!(item("a").len(), 1);

        let nested = ActionNode::menu(
            Action::menu("m", "M"),
            vec![ActionNode::menu(Action::menu("s", "S"), vec![item("leaf")])],
        );
        assert_eq!(nested.len(), 3);
    }

    #[test]
    fn test_map_root_leaves_children_untouched() {
        let node = ActionNode::menu(Action::menu("m", "M"), vec![item("a")])
            .map_root(|a| a.with_hidden(true));

        assert!(node.action().hidden);
        assert!(!node.children()[0].action().hidden);
    }
}

//! Ordered, nestable action store with copy-on-write snapshots.
//!
//! The registry keeps every entry in one insertion-ordered map. Top-level order
//! is the order of parentless entries in that map; child order is kept per
//! parent. Writes clone the current [`RegistrySnapshot`], mutate the clone and
//! swap it in, so readers never block on each other and never observe a
//! half-applied write.
//!
//! # Concurrency
//!
//! ```text
//! register / unregister ──► write lock ──► clone ──► mutate ──► swap Arc
//! resolve_for_context   ──► read lock  ──► clone Arc ──► iterate lock-free
//! ```

use crate::domain::error::{ActionError, ParentRejection, Result};
use crate::domain::{Action, ActionId, ActionNode, MAX_DEPTH};
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock};

/// A registered action and its position in the tree.
#[derive(Debug, Clone)]
pub(super) struct Entry {
    pub(super) action: Arc<Action>,
    pub(super) parent: Option<ActionId>,
    pub(super) children: Vec<ActionId>,
    pub(super) depth: usize,
}

/// Attributes that actions can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupAttr {
    ActionId,
    Label,
    Url,
    Image,
}

impl LookupAttr {
    /// Parses an attribute name such as `"action_id"`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownAttribute`] for names that are not indexed.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "action_id" | "id" => Ok(Self::ActionId),
            "label" => Ok(Self::Label),
            "url" => Ok(Self::Url),
            "image" => Ok(Self::Image),
            other => Err(ActionError::UnknownAttribute(other.to_string())),
        }
    }

    fn matches(self, action: &Action, value: &str) -> bool {
        match self {
            Self::ActionId => action.action_id.as_str() == value,
            Self::Label => action.label == value,
            Self::Url => action.url.as_deref() == Some(value),
            Self::Image => action.image.as_deref() == Some(value),
        }
    }
}

/// Immutable view of a registry at one point in time.
///
/// Obtained from [`ActionRegistry::snapshot`]. Cheap to clone behind an `Arc`
/// and safe to read from any thread while the registry keeps changing.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub(super) entries: IndexMap<ActionId, Entry>,
}

impl RegistrySnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, action_id: &str) -> bool {
        self.entries.contains_key(action_id)
    }

    #[must_use]
    pub fn get(&self, action_id: &str) -> Option<&Arc<Action>> {
        self.entries.get(action_id).map(|e| &e.action)
    }

    #[must_use]
    pub fn parent_of(&self, action_id: &str) -> Option<&ActionId> {
        self.entries.get(action_id).and_then(|e| e.parent.as_ref())
    }

    /// Nesting depth of an entry; top-level entries have depth 0.
    #[must_use]
    pub fn depth_of(&self, action_id: &str) -> Option<usize> {
        self.entries.get(action_id).map(|e| e.depth)
    }

    /// Every registered action in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.entries.values().map(|e| &e.action)
    }

    /// Top-level actions in display order.
    pub fn roots(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.entries
            .values()
            .filter(|e| e.parent.is_none())
            .map(|e| &e.action)
    }

    /// Child actions of a menu in display order.
    ///
    /// # Errors
    ///
    /// - [`ActionError::NotFound`] if `parent_id` is not registered
    /// - [`ActionError::NotAMenu`] if it is an item action
    pub fn children(&self, parent_id: &str) -> Result<Vec<&Arc<Action>>> {
        let entry = self
            .entries
            .get(parent_id)
            .ok_or_else(|| ActionError::not_found(parent_id))?;

        if !entry.action.is_menu() {
            return Err(ActionError::NotAMenu {
                action_id: parent_id.to_string(),
            });
        }

        Ok(entry
            .children
            .iter()
            .filter_map(|id| self.get(id.as_str()))
            .collect())
    }

    fn find(&self, attr: LookupAttr, value: &str) -> Option<ActionId> {
        self.entries
            .values()
            .find(|e| attr.matches(&e.action, value))
            .map(|e| e.action.action_id.clone())
    }

    fn insert(&mut self, action: Arc<Action>, parent_id: Option<&str>) -> Result<()> {
        let action_id = action.action_id.clone();

        if self.entries.contains_key(action_id.as_str()) {
            return Err(ActionError::DuplicateId {
                action_id: action_id.to_string(),
            });
        }

        let depth = match parent_id {
            None => 0,
            Some(parent_id) => {
                let parent = self.entries.get(parent_id).ok_or_else(|| ActionError::UnknownParent {
                    action_id: action_id.to_string(),
                    parent_id: parent_id.to_string(),
                    reason: ParentRejection::NotRegistered,
                })?;

                if !parent.action.is_menu() {
                    return Err(ActionError::UnknownParent {
                        action_id: action_id.to_string(),
                        parent_id: parent_id.to_string(),
                        reason: ParentRejection::NotAMenu,
                    });
                }

                if parent.depth + 1 > MAX_DEPTH {
                    return Err(ActionError::DepthLimitExceeded {
                        action_id: action_id.to_string(),
                        limit: MAX_DEPTH,
                    });
                }

                parent.depth + 1
            }
        };

        let parent = parent_id.map(ActionId::from);
        if let Some(parent) = &parent {
            if let Some(entry) = self.entries.get_mut(parent.as_str()) {
                entry.children.push(action_id.clone());
            }
        }

        self.entries.insert(
            action_id,
            Entry {
                action,
                parent,
                children: Vec::new(),
                depth,
            },
        );

        Ok(())
    }

    /// Removes an entry and all of its descendants, parent first.
    fn remove(&mut self, action_id: &str) -> Result<Vec<ActionId>> {
        let entry = self
            .entries
            .shift_remove(action_id)
            .ok_or_else(|| ActionError::not_found(action_id))?;

        if let Some(parent) = &entry.parent {
            if let Some(parent) = self.entries.get_mut(parent.as_str()) {
                parent.children.retain(|id| id.as_str() != action_id);
            }
        }

        let mut removed = vec![entry.action.action_id.clone()];
        let mut pending = entry.children;

        while let Some(child_id) = pending.pop() {
            if let Some(child) = self.entries.shift_remove(child_id.as_str()) {
                pending.extend(child.children);
                removed.push(child_id);
            }
        }

        Ok(removed)
    }
}

/// A named, process-wide ordered collection of actions.
///
/// Registration and unregistration are expected during serialized lifecycle
/// phases (extension load and unload); resolution happens per request and may
/// run concurrently with anything.
///
/// # Examples
///
/// ```
/// use actionhooks::{Action, ActionRegistry, RenderContext};
///
/// let registry = ActionRegistry::new("review-request");
/// registry.register(Action::menu("close", "Close"), None)?;
/// registry.register(Action::item("submit", "Submitted"), Some("close"))?;
/// registry.register(Action::item("discard", "Discarded"), Some("close"))?;
///
/// let ids: Vec<_> = registry
///     .child_actions("close")?
///     .iter()
///     .map(|a| a.action_id.to_string())
///     .collect();
/// assert_eq!(ids, ["submit", "discard"]);
///
/// registry.unregister("close")?;
/// assert!(registry.is_empty());
/// # Ok::<(), actionhooks::ActionError>(())
/// ```
#[derive(Debug)]
pub struct ActionRegistry {
    name: String,
    state: RwLock<Arc<RegistrySnapshot>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(Arc::new(RegistrySnapshot::default())),
        }
    }

    /// Creates a registry populated with default actions, in order.
    ///
    /// # Errors
    ///
    /// Returns the first registration error among `defaults`.
    pub fn with_defaults(name: impl Into<String>, defaults: Vec<ActionNode>) -> Result<Self> {
        let registry = Self::new(name);
        let _span = tracing::debug_span!("registry_populate",
            registry = %registry.name,
            count = defaults.len()
        ).entered();

        for node in defaults {
            registry.register_node(node, None)?;
        }

        tracing::debug!(entries = registry.len(), "registry populated");
        Ok(registry)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current state for lock-free reading.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Applies `f` to a copy of the state and publishes it if `f` succeeds.
    ///
    /// The published state is only ever replaced whole, so a poisoned lock still
    /// guards a consistent snapshot.
    fn write<T>(&self, f: impl FnOnce(&mut RegistrySnapshot) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistrySnapshot::clone(&**guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }

    /// Registers an action at the top level or under a menu.
    ///
    /// The action is appended to the end of its parent's children, or to the
    /// end of the top-level sequence.
    ///
    /// # Errors
    ///
    /// - [`ActionError::DuplicateId`] if the ID is already registered
    /// - [`ActionError::UnknownParent`] if the parent is missing or not a menu
    /// - [`ActionError::DepthLimitExceeded`] if the action would nest too deeply
    ///
    /// The registry is unchanged on error.
    pub fn register(&self, action: Action, parent_id: Option<&str>) -> Result<()> {
        self.register_shared(Arc::new(action), parent_id)
    }

    fn register_shared(&self, action: Arc<Action>, parent_id: Option<&str>) -> Result<()> {
        let _span = tracing::debug_span!("registry_register",
            registry = %self.name,
            action_id = %action.action_id,
            parent_id = parent_id.unwrap_or("")
        ).entered();

        self.write(|state| state.insert(action, parent_id))?;

        tracing::debug!("action registered");
        Ok(())
    }

    /// Registers a tree of actions, each menu before its children.
    ///
    /// Not transactional: if a node fails, the nodes registered before it stay
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns the first registration error, or [`ActionError::InvalidDescriptor`]
    /// if children are declared under an item action.
    pub fn register_node(&self, node: ActionNode, parent_id: Option<&str>) -> Result<Vec<ActionId>> {
        let mut registered = Vec::with_capacity(node.len());
        self.register_node_tracked(node, parent_id, &mut registered)?;
        Ok(registered.iter().map(|action| action.action_id.clone()).collect())
    }

    /// Like [`register_node`](Self::register_node), recording each registered
    /// instance so callers keep track of partial progress on error and can later
    /// remove exactly those instances.
    pub(crate) fn register_node_tracked(
        &self,
        node: ActionNode,
        parent_id: Option<&str>,
        registered: &mut Vec<Arc<Action>>,
    ) -> Result<()> {
        match node {
            ActionNode::Leaf(action) => {
                let action = Arc::new(action);
                self.register_shared(Arc::clone(&action), parent_id)?;
                registered.push(action);
            }
            ActionNode::Menu(action, children) => {
                if !action.is_menu() && !children.is_empty() {
                    return Err(ActionError::InvalidDescriptor(format!(
                        "{} declares child actions but is not a menu action",
                        action.action_id
                    )));
                }

                let action = Arc::new(action);
                self.register_shared(Arc::clone(&action), parent_id)?;
                registered.push(Arc::clone(&action));

                for child in children {
                    self.register_node_tracked(child, Some(action.action_id.as_str()), registered)?;
                }
            }
        }

        Ok(())
    }

    /// Unregisters an action and, for menus, every descendant.
    ///
    /// Returns the removed IDs, the requested one first.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::NotFound`] if the ID is not registered.
    pub fn unregister(&self, action_id: &str) -> Result<Vec<ActionId>> {
        let _span = tracing::debug_span!("registry_unregister",
            registry = %self.name,
            action_id = %action_id
        ).entered();

        let removed = self.write(|state| state.remove(action_id))?;

        tracing::debug!(removed = removed.len(), "action unregistered");
        Ok(removed)
    }

    /// Unregisters `action` only if the registry still holds that same instance.
    ///
    /// An entry registered later under the same ID by someone else is a
    /// different instance and is left alone. Menus cascade as in
    /// [`unregister`](Self::unregister).
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::NotFound`] if the ID is missing or now belongs to
    /// another instance.
    pub fn unregister_instance(&self, action: &Arc<Action>) -> Result<Vec<ActionId>> {
        let action_id = action.action_id.as_str();
        let _span = tracing::debug_span!("registry_unregister_instance",
            registry = %self.name,
            action_id = %action_id
        ).entered();

        let removed = self.write(|state| match state.entries.get(action_id) {
            Some(entry) if Arc::ptr_eq(&entry.action, action) => state.remove(action_id),
            _ => Err(ActionError::not_found(action_id)),
        })?;

        tracing::debug!(removed = removed.len(), "action unregistered");
        Ok(removed)
    }

    /// Unregisters the first action, in display order, whose attribute matches.
    ///
    /// Useful when the caller knows an action's label or URL but not the
    /// identifier it was registered under.
    ///
    /// # Errors
    ///
    /// - [`ActionError::UnknownAttribute`] if `attr_name` is not indexed
    /// - [`ActionError::NotFound`] if nothing matches
    pub fn unregister_by_attr(&self, attr_name: &str, value: &str) -> Result<Vec<ActionId>> {
        let attr = LookupAttr::parse(attr_name)?;

        let _span = tracing::debug_span!("registry_unregister_by_attr",
            registry = %self.name,
            attr = %attr_name,
            value = %value
        ).entered();

        let removed = self.write(|state| {
            let action_id = state.find(attr, value).ok_or_else(|| ActionError::NotFound {
                attr_name: attr_name.to_string(),
                attr_value: value.to_string(),
            })?;
            state.remove(action_id.as_str())
        })?;

        tracing::debug!(removed = removed.len(), "action unregistered");
        Ok(removed)
    }

    /// Removes every entry.
    pub fn reset(&self) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(registry = %self.name, removed = guard.len(), "registry reset");
        *guard = Arc::new(RegistrySnapshot::default());
    }

    #[must_use]
    pub fn get_action(&self, action_id: &str) -> Option<Arc<Action>> {
        self.snapshot().get(action_id).cloned()
    }

    #[must_use]
    pub fn contains(&self, action_id: &str) -> bool {
        self.snapshot().contains(action_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    #[must_use]
    pub fn parent_of(&self, action_id: &str) -> Option<ActionId> {
        self.snapshot().parent_of(action_id).cloned()
    }

    /// Top-level actions in display order.
    #[must_use]
    pub fn root_actions(&self) -> Vec<Arc<Action>> {
        self.snapshot().roots().cloned().collect()
    }

    /// Child actions of a menu in display order.
    ///
    /// # Errors
    ///
    /// See [`RegistrySnapshot::children`].
    pub fn child_actions(&self, parent_id: &str) -> Result<Vec<Arc<Action>>> {
        let snapshot = self.snapshot();
        let children = snapshot.children(parent_id)?;
        Ok(children.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(actions: &[Arc<Action>]) -> Vec<String> {
        actions.iter().map(|a| a.action_id.to_string()).collect()
    }

    #[test]
    fn test_register_duplicate_leaves_registry_unchanged() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("a", "First"), None).unwrap();

        let err = registry.register(Action::item("a", "Second"), None).unwrap_err();
        assert!(matches!(err, ActionError::DuplicateId { ref action_id } if action_id == "a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_action("a").unwrap().label, "First");
    }

    #[test]
    fn test_register_with_missing_parent() {
        let registry = ActionRegistry::new("test");

        let err = registry
            .register(Action::item("submit", "Submitted"), Some("close-menu"))
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::UnknownParent { reason: ParentRejection::NotRegistered, .. }
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_under_item_is_rejected() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("item", "Item"), None).unwrap();

        let err = registry.register(Action::item("child", "Child"), Some("item")).unwrap_err();
        assert!(matches!(
            err,
            ActionError::UnknownParent { reason: ParentRejection::NotAMenu, .. }
        ));
    }

    #[test]
    fn test_register_enforces_depth_limit() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::menu("m0", "M0"), None).unwrap();
        registry.register(Action::menu("m1", "M1"), Some("m0")).unwrap();
        registry.register(Action::menu("m2", "M2"), Some("m1")).unwrap();

        let err = registry.register(Action::item("too-deep", "X"), Some("m2")).unwrap_err();
        assert!(matches!(err, ActionError::DepthLimitExceeded { limit: MAX_DEPTH, .. }));
        assert_eq!(registry.snapshot().depth_of("m2"), Some(2));
    }

    #[test]
    fn test_unregister_cascades_to_descendants() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::menu("m", "M"), None).unwrap();
        registry.register(Action::item("a", "A"), Some("m")).unwrap();
        registry.register(Action::menu("s", "S"), Some("m")).unwrap();
        registry.register(Action::item("b", "B"), Some("s")).unwrap();
        registry.register(Action::item("z", "Z"), None).unwrap();

        let removed = registry.unregister("m").unwrap();
        assert_eq!(removed.len(), 4);
        assert_eq!(removed[0].as_str(), "m");
        assert_eq!(ids(&registry.root_actions()), ["z"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_child_detaches_from_parent() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::menu("m", "M"), None).unwrap();
        registry.register(Action::item("a", "A"), Some("m")).unwrap();
        registry.register(Action::item("b", "B"), Some("m")).unwrap();

        registry.unregister("a").unwrap();
        assert_eq!(ids(&registry.child_actions("m").unwrap()), ["b"]);
    }

    #[test]
    fn test_unregister_missing() {
        let registry = ActionRegistry::new("test");
        assert!(matches!(
            registry.unregister("nope").unwrap_err(),
            ActionError::NotFound { .. }
        ));
    }

    #[test]
    fn test_unregister_by_label_and_unknown_attribute() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("a", "Same"), None).unwrap();
        registry.register(Action::item("b", "Same"), None).unwrap();

        let removed = registry.unregister_by_attr("label", "Same").unwrap();
        assert_eq!(removed[0].as_str(), "a");
        assert!(registry.contains("b"));

        assert!(matches!(
            registry.unregister_by_attr("colour", "red").unwrap_err(),
            ActionError::UnknownAttribute(_)
        ));
        assert!(matches!(
            registry.unregister_by_attr("action_id", "a").unwrap_err(),
            ActionError::NotFound { .. }
        ));
    }

    #[test]
    fn test_reregistration_appends_at_end() {
        let registry = ActionRegistry::new("test");
        for id in ["a", "b", "c"] {
            registry.register(Action::item(id, id), None).unwrap();
        }

        registry.unregister("a").unwrap();
        registry.register(Action::item("a", "again"), None).unwrap();

        assert_eq!(ids(&registry.root_actions()), ["b", "c", "a"]);
    }

    #[test]
    fn test_child_actions_errors() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("item", "Item"), None).unwrap();

        assert!(matches!(
            registry.child_actions("missing").unwrap_err(),
            ActionError::NotFound { .. }
        ));
        assert!(matches!(
            registry.child_actions("item").unwrap_err(),
            ActionError::NotAMenu { .. }
        ));
    }

    #[test]
    fn test_register_node_rejects_children_under_item() {
        let registry = ActionRegistry::new("test");
        let node = ActionNode::menu(
            Action::item("not-menu", "X"),
            vec![Action::item("child", "C").into()],
        );

        assert!(matches!(
            registry.register_node(node, None).unwrap_err(),
            ActionError::InvalidDescriptor(_)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_node_keeps_partial_progress() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("taken", "Taken"), None).unwrap();

        let node = ActionNode::menu(
            Action::menu("m", "M"),
            vec![Action::item("a", "A").into(), Action::item("taken", "T").into()],
        );

        let mut registered = Vec::new();
        let err = registry
            .register_node_tracked(node, None, &mut registered)
            .unwrap_err();

        assert!(matches!(err, ActionError::DuplicateId { .. }));
        let ids: Vec<_> = registered.iter().map(|a| a.action_id.as_str()).collect();
        assert_eq!(ids, ["m", "a"]);
        assert!(registry.contains("m"));
        assert!(registry.contains("a"));
    }

    #[test]
    fn test_unregister_instance_ignores_replacements() {
        let registry = ActionRegistry::new("test");
        let mut registered = Vec::new();
        registry
            .register_node_tracked(Action::item("x", "Original").into(), None, &mut registered)
            .unwrap();
        let original = Arc::clone(&registered[0]);

        registry.unregister("x").unwrap();
        registry.register(Action::item("x", "Replacement"), None).unwrap();

        assert!(matches!(
            registry.unregister_instance(&original).unwrap_err(),
            ActionError::NotFound { .. }
        ));
        assert_eq!(registry.get_action("x").unwrap().label, "Replacement");

        let current = registry.get_action("x").unwrap();
        assert_eq!(registry.unregister_instance(&current).unwrap(), [ActionId::from("x")]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_writes() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("a", "A"), None).unwrap();

        let before = registry.snapshot();
        registry.register(Action::item("b", "B"), None).unwrap();
        registry.reset();

        assert_eq!(before.len(), 1);
        assert!(before.contains("a"));
        assert!(registry.is_empty());
    }
}

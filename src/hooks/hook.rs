//! Extension action hooks.
//!
//! A hook is a batch of actions an extension contributes at load time. The hook
//! registers its actions in order when activated and, when deactivated, removes
//! exactly the actions it registered. Actions an extension registered by hand
//! outside a hook are left alone and remain the extension's responsibility.
//!
//! # Lifecycle
//!
//! ```text
//! Inactive ──activate()──► Active ──deactivate()──► Inactive
//! ```
//!
//! Activation is not transactional: if one action fails to register, the ones
//! before it stay registered and are still removed on deactivation.

use crate::domain::error::{ActionError, Result};
use crate::domain::{Action, ActionId, ActionNode, ContextFn, RenderContext};
use crate::hooks::descriptor::LegacyDescriptor;
use crate::registry::ActionRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Which registry a hook contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryTarget {
    /// Actions in the review request box and diff viewer.
    ReviewRequest,
    /// Actions in the page header.
    Header,
}

/// Flavour of hook, determining target registry and accepted input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Top-level review request actions.
    ReviewRequest,
    /// Review request menus; legacy records must carry `items`.
    ReviewRequestDropdown,
    /// Review request actions shown only on diff viewer pages.
    DiffViewer,
    /// Top-level header actions.
    Header,
    /// Header menus; legacy records must carry `items`.
    HeaderDropdown,
}

impl HookKind {
    #[must_use]
    pub const fn target(self) -> RegistryTarget {
        match self {
            Self::ReviewRequest | Self::ReviewRequestDropdown | Self::DiffViewer => RegistryTarget::ReviewRequest,
            Self::Header | Self::HeaderDropdown => RegistryTarget::Header,
        }
    }

    #[must_use]
    pub const fn is_dropdown(self) -> bool {
        matches!(self, Self::ReviewRequestDropdown | Self::HeaderDropdown)
    }
}

/// How deactivation treats hook actions that have disappeared from the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TeardownPolicy {
    /// Log a warning and continue.
    #[default]
    Tolerant,
    /// Finish the teardown, then report the first missing action as an error.
    Strict,
}

/// One action supplied to a hook.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEntry {
    /// Legacy dictionary record, translated at activation time.
    Legacy(LegacyDescriptor),
    /// Typed action or menu tree.
    Typed(ActionNode),
}

impl From<LegacyDescriptor> for HookEntry {
    fn from(descriptor: LegacyDescriptor) -> Self {
        Self::Legacy(descriptor)
    }
}

impl From<ActionNode> for HookEntry {
    fn from(node: ActionNode) -> Self {
        Self::Typed(node)
    }
}

impl From<Action> for HookEntry {
    fn from(action: Action) -> Self {
        Self::Typed(ActionNode::Leaf(action))
    }
}

/// A named batch of actions registered and unregistered together.
///
/// An active hook owns the action instances it registered and is the only one
/// that tears them down, so hooks are not `Clone`.
///
/// # Example
///
/// ```
/// use actionhooks::{Action, ActionHook, ActionRegistry, TeardownPolicy};
///
/// let registry = ActionRegistry::new("review-request");
/// registry.register(Action::item("manual", "Manual"), None)?;
///
/// let mut hook = ActionHook::review_request("my-extension", [
///     Action::item("x", "X"),
///     Action::item("y", "Y"),
/// ]);
/// hook.activate(&registry)?;
/// assert_eq!(registry.len(), 3);
///
/// hook.deactivate(&registry, TeardownPolicy::Tolerant)?;
/// assert_eq!(registry.len(), 1);
/// assert!(registry.contains("manual"));
/// # Ok::<(), actionhooks::ActionError>(())
/// ```
#[derive(Debug)]
pub struct ActionHook {
    name: String,
    kind: HookKind,
    entries: Vec<HookEntry>,
    applies_to: Option<ContextFn<bool>>,
    registered: Vec<Arc<Action>>,
    active: bool,
}

impl ActionHook {
    pub fn new<E: Into<HookEntry>>(
        name: impl Into<String>,
        kind: HookKind,
        entries: impl IntoIterator<Item = E>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            entries: entries.into_iter().map(Into::into).collect(),
            applies_to: None,
            registered: Vec::new(),
            active: false,
        }
    }

    pub fn review_request<E: Into<HookEntry>>(name: impl Into<String>, entries: impl IntoIterator<Item = E>) -> Self {
        Self::new(name, HookKind::ReviewRequest, entries)
    }

    pub fn review_request_dropdown<E: Into<HookEntry>>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = E>,
    ) -> Self {
        Self::new(name, HookKind::ReviewRequestDropdown, entries)
    }

    pub fn diff_viewer<E: Into<HookEntry>>(name: impl Into<String>, entries: impl IntoIterator<Item = E>) -> Self {
        Self::new(name, HookKind::DiffViewer, entries)
    }

    pub fn header<E: Into<HookEntry>>(name: impl Into<String>, entries: impl IntoIterator<Item = E>) -> Self {
        Self::new(name, HookKind::Header, entries)
    }

    pub fn header_dropdown<E: Into<HookEntry>>(name: impl Into<String>, entries: impl IntoIterator<Item = E>) -> Self {
        Self::new(name, HookKind::HeaderDropdown, entries)
    }

    /// Restricts every top-level action of this hook to requests where
    /// `predicate` holds, in addition to the actions' own conditions.
    #[must_use]
    pub fn applies_to(mut self, predicate: impl Fn(&RenderContext) -> bool + Send + Sync + 'static) -> Self {
        let predicate = ContextFn::new(predicate);
        self.applies_to = Some(match self.applies_to.take() {
            Some(existing) => existing.and(&predicate),
            None => predicate,
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> HookKind {
        self.kind
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// IDs this hook has registered, in registration order.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<&ActionId> {
        self.registered.iter().map(|action| &action.action_id).collect()
    }

    fn state_error(&self, message: &str) -> ActionError {
        ActionError::HookState {
            name: self.name.clone(),
            message: message.to_string(),
        }
    }

    /// Predicate applied to every top-level action, if any.
    fn visibility(&self) -> Option<ContextFn<bool>> {
        let diff_viewer = (self.kind == HookKind::DiffViewer).then(|| ContextFn::new(RenderContext::is_diff_viewer));

        match (diff_viewer, &self.applies_to) {
            (Some(a), Some(b)) => Some(a.and(b)),
            (Some(a), None) => Some(a),
            (None, b) => b.clone(),
        }
    }

    fn to_node(&self, entry: &HookEntry) -> Result<ActionNode> {
        match entry {
            HookEntry::Typed(node) => Ok(node.clone()),
            HookEntry::Legacy(descriptor) => {
                if self.kind.is_dropdown() && !descriptor.is_menu() {
                    return Err(ActionError::InvalidDescriptor(format!(
                        "hook {}: dropdown descriptors require \"items\"",
                        self.name
                    )));
                }
                if !self.kind.is_dropdown() && descriptor.is_menu() {
                    return Err(ActionError::InvalidDescriptor(format!(
                        "hook {}: \"items\" is only accepted by dropdown hooks",
                        self.name
                    )));
                }
                descriptor.to_node()
            }
        }
    }

    /// Registers every action of this hook, in order.
    ///
    /// # Errors
    ///
    /// - [`ActionError::HookState`] if the hook is already active
    /// - Any registration or descriptor error; actions registered before the
    ///   failure stay registered and the hook stays active so a later
    ///   [`deactivate`](Self::deactivate) removes them
    pub fn activate(&mut self, registry: &ActionRegistry) -> Result<()> {
        if self.active {
            return Err(self.state_error("already active"));
        }

        let _span = tracing::debug_span!("hook_activate",
            hook = %self.name,
            kind = ?self.kind,
            registry = %registry.name(),
            entries = self.entries.len()
        ).entered();

        if self.entries.iter().any(|e| matches!(e, HookEntry::Legacy(_))) {
            tracing::warn!(hook = %self.name, "legacy dictionary descriptors are deprecated; use typed actions");
        }

        self.active = true;
        let visibility = self.visibility();

        for entry in &self.entries {
            let mut node = self.to_node(entry)?;
            if let Some(predicate) = &visibility {
                node = node.map_root(|action| action.with_visibility(predicate));
            }
            registry.register_node_tracked(node, None, &mut self.registered)?;
        }

        tracing::debug!(registered = self.registered.len(), "hook activated");
        Ok(())
    }

    /// Unregisters exactly the action instances this hook registered.
    ///
    /// An action that was removed and then registered again under the same ID
    /// by someone else belongs to them and is left in place; it counts as
    /// missing.
    ///
    /// # Errors
    ///
    /// - [`ActionError::HookState`] if the hook is not active
    /// - [`ActionError::NotFound`] under [`TeardownPolicy::Strict`] if one of
    ///   the hook's actions was already removed or replaced by someone else; the
    ///   rest of the teardown still runs
    pub fn deactivate(&mut self, registry: &ActionRegistry, policy: TeardownPolicy) -> Result<()> {
        if !self.active {
            return Err(self.state_error("not active"));
        }

        let _span = tracing::debug_span!("hook_deactivate",
            hook = %self.name,
            registry = %registry.name(),
            tracked = self.registered.len()
        ).entered();

        let mut removed: HashSet<ActionId> = HashSet::new();
        let mut first_missing = None;

        for action in std::mem::take(&mut self.registered) {
            if removed.contains(&action.action_id) {
                continue;
            }

            match registry.unregister_instance(&action) {
                Ok(ids) => removed.extend(ids),
                Err(err @ ActionError::NotFound { .. }) => {
                    tracing::warn!(action_id = %action.action_id, "hook action was already unregistered or replaced");
                    if policy == TeardownPolicy::Strict && first_missing.is_none() {
                        first_missing = Some(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        self.active = false;
        tracing::debug!(removed = removed.len(), "hook deactivated");

        first_missing.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy(value: serde_json::Value) -> LegacyDescriptor {
        LegacyDescriptor::from_value(value).unwrap()
    }

    #[test]
    fn test_teardown_leaves_manual_actions() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::review_request("ext", [Action::item("x", "X"), Action::item("y", "Y")]);

        hook.activate(&registry).unwrap();
        registry.register(Action::item("z", "Z"), None).unwrap();
        assert_eq!(hook.registered_ids().len(), 2);

        hook.deactivate(&registry, TeardownPolicy::Strict).unwrap();
        assert!(!registry.contains("x"));
        assert!(!registry.contains("y"));
        assert!(registry.contains("z"));
        assert!(!hook.is_active());
    }

    #[test]
    fn test_legacy_record_registers_equivalent_action() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::review_request(
            "ext",
            [legacy(json!({"id": "foo", "label": "Foo", "url": "#"}))],
        );

        hook.activate(&registry).unwrap();
        assert_eq!(*registry.get_action("foo").unwrap(), Action::item("foo", "Foo").with_url("#"));
    }

    #[test]
    fn test_dropdown_tracks_children_and_skips_cascaded_ids() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::header_dropdown(
            "ext",
            [legacy(json!({"id": "menu", "label": "Menu", "items": [{"id": "a", "label": "A"}, {"id": "b", "label": "B"}]}))],
        );

        hook.activate(&registry).unwrap();
        assert_eq!(hook.registered_ids().len(), 3);

        hook.deactivate(&registry, TeardownPolicy::Strict).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropdown_requires_items() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::review_request_dropdown("ext", [legacy(json!({"id": "flat", "label": "Flat"}))]);

        assert!(matches!(
            hook.activate(&registry).unwrap_err(),
            ActionError::InvalidDescriptor(_)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_flat_hook_rejects_items() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::header("ext", [legacy(json!({"id": "m", "label": "M", "items": []}))]);

        assert!(hook.activate(&registry).is_err());
    }

    #[test]
    fn test_entries_before_a_bad_descriptor_stay_registered() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::header(
            "ext",
            [
                HookEntry::from(Action::item("typed", "Typed")),
                legacy(json!({"id": "bad", "label": "Bad", "items": []})).into(),
                HookEntry::from(Action::item("after", "After")),
            ],
        );

        assert!(matches!(
            hook.activate(&registry).unwrap_err(),
            ActionError::InvalidDescriptor(_)
        ));
        assert!(hook.is_active());
        assert!(registry.contains("typed"));
        assert!(!registry.contains("after"));
        assert_eq!(hook.registered_ids(), vec![&ActionId::from("typed")]);

        hook.deactivate(&registry, TeardownPolicy::Strict).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_partial_activation_is_torn_down() {
        let registry = ActionRegistry::new("test");
        registry.register(Action::item("taken", "Taken"), None).unwrap();

        let mut hook = ActionHook::review_request(
            "ext",
            [Action::item("first", "First"), Action::item("taken", "Again"), Action::item("never", "Never")],
        );

        assert!(matches!(
            hook.activate(&registry).unwrap_err(),
            ActionError::DuplicateId { .. }
        ));
        assert!(hook.is_active());
        assert!(registry.contains("first"));
        assert!(!registry.contains("never"));

        hook.deactivate(&registry, TeardownPolicy::Strict).unwrap();
        assert!(!registry.contains("first"));
        assert!(registry.contains("taken"));
    }

    #[test]
    fn test_missing_action_policy() {
        let registry = ActionRegistry::new("test");
        let mut tolerant = ActionHook::review_request("a", [Action::item("x", "X"), Action::item("y", "Y")]);
        tolerant.activate(&registry).unwrap();
        registry.unregister("x").unwrap();
        tolerant.deactivate(&registry, TeardownPolicy::Tolerant).unwrap();
        assert!(registry.is_empty());

        let mut strict = ActionHook::review_request("b", [Action::item("x", "X"), Action::item("y", "Y")]);
        strict.activate(&registry).unwrap();
        registry.unregister("x").unwrap();
        assert!(matches!(
            strict.deactivate(&registry, TeardownPolicy::Strict).unwrap_err(),
            ActionError::NotFound { .. }
        ));
        assert!(registry.is_empty());
        assert!(!strict.is_active());
    }

    #[test]
    fn test_teardown_spares_action_reregistered_by_another_owner() {
        let registry = ActionRegistry::new("test");
        let mut strict = ActionHook::review_request("a", [Action::item("x", "X")]);
        strict.activate(&registry).unwrap();

        registry.unregister("x").unwrap();
        registry.register(Action::item("x", "Manual"), None).unwrap();

        assert!(matches!(
            strict.deactivate(&registry, TeardownPolicy::Strict).unwrap_err(),
            ActionError::NotFound { .. }
        ));
        assert_eq!(registry.get_action("x").unwrap().label, "Manual");

        let mut tolerant = ActionHook::review_request("b", [Action::item("y", "Y")]);
        tolerant.activate(&registry).unwrap();
        registry.unregister("y").unwrap();
        registry.register(Action::item("y", "Manual"), None).unwrap();

        tolerant.deactivate(&registry, TeardownPolicy::Tolerant).unwrap();
        assert!(registry.contains("x"));
        assert_eq!(registry.get_action("y").unwrap().label, "Manual");
    }

    #[test]
    fn test_activation_state_is_checked() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::review_request("ext", [Action::item("x", "X")]);

        assert!(matches!(
            hook.deactivate(&registry, TeardownPolicy::Tolerant).unwrap_err(),
            ActionError::HookState { .. }
        ));

        hook.activate(&registry).unwrap();
        assert!(matches!(
            hook.activate(&registry).unwrap_err(),
            ActionError::HookState { .. }
        ));

        hook.deactivate(&registry, TeardownPolicy::Tolerant).unwrap();
        hook.activate(&registry).unwrap();
        assert!(registry.contains("x"));
    }

    #[test]
    fn test_diff_viewer_hook_limits_to_diff_pages() {
        let registry = ActionRegistry::new("test");
        let mut hook = ActionHook::diff_viewer("ext", [Action::item("x", "X")])
            .applies_to(RenderContext::is_authenticated);
        hook.activate(&registry).unwrap();

        let visible = |ctx: &RenderContext| registry.resolve_for_context(ctx).count();
        assert_eq!(visible(&RenderContext::new("review-request-detail").with_user(1)), 0);
        assert_eq!(visible(&RenderContext::new("view-diff")), 0);
        assert_eq!(visible(&RenderContext::new("view-diff").with_user(1)), 1);
    }

    #[test]
    fn test_kind_targets() {
        assert_eq!(HookKind::DiffViewer.target(), RegistryTarget::ReviewRequest);
        assert_eq!(HookKind::HeaderDropdown.target(), RegistryTarget::Header);
        assert!(HookKind::ReviewRequestDropdown.is_dropdown());
        assert!(!HookKind::Header.is_dropdown());
    }
}

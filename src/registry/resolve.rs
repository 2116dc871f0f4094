//! Per-request resolution of registered actions.
//!
//! Resolution walks a [`RegistrySnapshot`] in display order and evaluates each
//! action's behaviours against a [`RenderContext`]. Visibility cascades
//! upwards: a menu whose children are all filtered out is dropped as well.

use super::store::{ActionRegistry, RegistrySnapshot};
use crate::domain::{ActionId, ActionKind, RenderContext};
use serde::Serialize;
use std::sync::Arc;

/// An action as it applies to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAction {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResolvedAction>,
}

impl ResolvedAction {
    /// IDs of the direct children, in display order.
    #[must_use]
    pub fn child_ids(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.action_id.as_str()).collect()
    }
}

impl RegistrySnapshot {
    /// Resolves one entry and its subtree, or `None` if it is not visible.
    fn resolve_entry(&self, action_id: &ActionId, ctx: &RenderContext) -> Option<ResolvedAction> {
        let entry = self.entries.get(action_id.as_str())?;
        let action = &entry.action;

        if !action.should_render(ctx) {
            return None;
        }

        let children = if action.is_menu() {
            let children: Vec<_> = entry
                .children
                .iter()
                .filter_map(|child| self.resolve_entry(child, ctx))
                .collect();

            if children.is_empty() {
                tracing::trace!(action_id = %action_id, "menu has no visible children");
                return None;
            }
            children
        } else {
            Vec::new()
        };

        Some(ResolvedAction {
            action_id: action_id.clone(),
            kind: action.kind(),
            label: action.label_for(ctx),
            url: action.url_for(ctx),
            hidden: action.hidden_for(ctx),
            image: action.image.clone(),
            image_width: action.image_width,
            image_height: action.image_height,
            children,
        })
    }
}

/// Lazy iterator over the visible top-level actions for a context.
///
/// Holds its own snapshot, so registrations made while iterating are not seen.
#[derive(Debug)]
pub struct Resolved<'c> {
    snapshot: Arc<RegistrySnapshot>,
    ctx: &'c RenderContext,
    position: usize,
}

impl<'c> Resolved<'c> {
    #[must_use]
    pub const fn new(snapshot: Arc<RegistrySnapshot>, ctx: &'c RenderContext) -> Self {
        Self {
            snapshot,
            ctx,
            position: 0,
        }
    }
}

impl Iterator for Resolved<'_> {
    type Item = ResolvedAction;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((action_id, entry)) = self.snapshot.entries.get_index(self.position) {
            self.position += 1;

            if entry.parent.is_some() {
                continue;
            }

            if let Some(resolved) = self.snapshot.resolve_entry(action_id, self.ctx) {
                return Some(resolved);
            }
        }

        None
    }
}

impl RegistrySnapshot {
    /// Resolves the visible top-level actions of this snapshot.
    #[must_use]
    pub fn resolve<'c>(self: &Arc<Self>, ctx: &'c RenderContext) -> Resolved<'c> {
        Resolved::new(Arc::clone(self), ctx)
    }
}

impl ActionRegistry {
    /// Produces the ordered, filtered top-level actions for a request.
    ///
    /// Nested menu structure is preserved in [`ResolvedAction::children`].
    ///
    /// # Example
    ///
    /// ```
    /// use actionhooks::{Action, ActionRegistry, RenderContext};
    ///
    /// let registry = ActionRegistry::new("header");
    /// registry.register(Action::menu("account", "Account"), None)?;
    /// registry.register(
    ///     Action::item("logout", "Log Out").visible_when(RenderContext::is_authenticated),
    ///     Some("account"),
    /// )?;
    ///
    /// let anonymous = RenderContext::new("dashboard");
    /// assert_eq!(registry.resolve_for_context(&anonymous).count(), 0);
    ///
    /// let user = RenderContext::new("dashboard").with_user(1);
    /// let resolved: Vec<_> = registry.resolve_for_context(&user).collect();
    /// assert_eq!(resolved[0].child_ids(), ["logout"]);
    /// # Ok::<(), actionhooks::ActionError>(())
    /// ```
    #[must_use]
    pub fn resolve_for_context<'c>(&self, ctx: &'c RenderContext) -> Resolved<'c> {
        tracing::trace!(registry = %self.name(), url_name = %ctx.url_name, "resolving actions");
        Resolved::new(self.snapshot(), ctx)
    }
}

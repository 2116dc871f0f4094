//! Action domain model.
//!
//! An [`Action`] is a single clickable UI element (an item with a target URL) or
//! a menu that groups child actions. Actions are immutable once registered and
//! are shared between concurrent readers, so anything that must vary per request
//! is expressed as a behaviour evaluated against a [`RenderContext`] rather than
//! by mutating the action.

use crate::domain::context::RenderContext;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// URL used by item actions that do not set one.
pub const DEFAULT_URL: &str = "#";

/// Unique identifier of an action within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ActionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Whether an action is a clickable item or a container of child actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Item,
    Menu,
}

/// A shareable function of the render context.
///
/// Used for visibility predicates and per-request label, URL and hidden
/// overrides. The wrapped closure must be `Send + Sync` because registries are
/// read from request threads.
pub struct ContextFn<T>(Arc<dyn Fn(&RenderContext) -> T + Send + Sync>);

impl<T> ContextFn<T> {
    pub fn new(f: impl Fn(&RenderContext) -> T + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &RenderContext) -> T {
        (self.0)(ctx)
    }
}

impl ContextFn<bool> {
    /// Combines two predicates; the result holds only when both hold.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        let (a, b) = (Arc::clone(&self.0), Arc::clone(&other.0));
        Self(Arc::new(move |ctx: &RenderContext| a(ctx) && b(ctx)))
    }
}

impl<T> Clone for ContextFn<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for ContextFn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextFn(..)")
    }
}

/// A single UI action.
///
/// Static fields describe what is displayed by default; the optional behaviours
/// override them for a particular request. Equality compares the static fields
/// and kind only, since closures have no meaningful equality.
///
/// # Examples
///
/// ```
/// use actionhooks::{Action, RenderContext};
///
/// let ship_it = Action::item("ship-it-action", "Ship It!")
///     .visible_when(RenderContext::is_authenticated);
///
/// assert!(!ship_it.should_render(&RenderContext::new("review-request-detail")));
/// assert!(ship_it.should_render(&RenderContext::new("review-request-detail").with_user(1)));
/// ```
#[derive(Debug, Clone)]
pub struct Action {
    /// Identifier, unique within a registry.
    pub action_id: ActionId,

    /// Default display text.
    pub label: String,

    /// Default target URL. Always set for items, usually `None` for menus.
    pub url: Option<String>,

    /// Optional icon URL.
    pub image: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,

    /// Rendered but initially hidden from the user.
    pub hidden: bool,

    kind: ActionKind,
    visibility: Option<ContextFn<bool>>,
    label_override: Option<ContextFn<String>>,
    url_override: Option<ContextFn<String>>,
    hidden_override: Option<ContextFn<bool>>,
}

impl Action {
    fn with_kind(action_id: ActionId, label: String, kind: ActionKind) -> Self {
        let url = match kind {
            ActionKind::Item => Some(DEFAULT_URL.to_string()),
            ActionKind::Menu => None,
        };

        Self {
            action_id,
            label,
            url,
            image: None,
            image_width: None,
            image_height: None,
            hidden: false,
            kind,
            visibility: None,
            label_override: None,
            url_override: None,
            hidden_override: None,
        }
    }

    /// Creates a clickable item pointing at [`DEFAULT_URL`].
    #[must_use]
    pub fn item(action_id: impl Into<ActionId>, label: impl Into<String>) -> Self {
        Self::with_kind(action_id.into(), label.into(), ActionKind::Item)
    }

    /// Creates a menu with no target URL.
    #[must_use]
    pub fn menu(action_id: impl Into<ActionId>, label: impl Into<String>) -> Self {
        Self::with_kind(action_id.into(), label.into(), ActionKind::Menu)
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>, width: Option<u32>, height: Option<u32>) -> Self {
        self.image = Some(image.into());
        self.image_width = width;
        self.image_height = height;
        self
    }

    #[must_use]
    pub const fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Shows the action only when `predicate` holds for the request.
    ///
    /// Calling this again adds another condition rather than replacing the
    /// first one.
    #[must_use]
    pub fn visible_when(self, predicate: impl Fn(&RenderContext) -> bool + Send + Sync + 'static) -> Self {
        self.with_visibility(&ContextFn::new(predicate))
    }

    /// Adds an already-shared predicate as a visibility condition.
    #[must_use]
    pub fn with_visibility(mut self, predicate: &ContextFn<bool>) -> Self {
        self.visibility = Some(match self.visibility.take() {
            Some(existing) => existing.and(predicate),
            None => predicate.clone(),
        });
        self
    }

    #[must_use]
    pub fn label_when(mut self, f: impl Fn(&RenderContext) -> String + Send + Sync + 'static) -> Self {
        self.label_override = Some(ContextFn::new(f));
        self
    }

    #[must_use]
    pub fn url_when(mut self, f: impl Fn(&RenderContext) -> String + Send + Sync + 'static) -> Self {
        self.url_override = Some(ContextFn::new(f));
        self
    }

    #[must_use]
    pub fn hidden_when(mut self, f: impl Fn(&RenderContext) -> bool + Send + Sync + 'static) -> Self {
        self.hidden_override = Some(ContextFn::new(f));
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    #[must_use]
    pub fn is_menu(&self) -> bool {
        self.kind == ActionKind::Menu
    }

    /// Whether the action applies to the request at all.
    #[must_use]
    pub fn should_render(&self, ctx: &RenderContext) -> bool {
        self.visibility.as_ref().map_or(true, |p| p.call(ctx))
    }

    #[must_use]
    pub fn label_for(&self, ctx: &RenderContext) -> String {
        self.label_override
            .as_ref()
            .map_or_else(|| self.label.clone(), |f| f.call(ctx))
    }

    #[must_use]
    pub fn url_for(&self, ctx: &RenderContext) -> Option<String> {
        self.url_override
            .as_ref()
            .map_or_else(|| self.url.clone(), |f| Some(f.call(ctx)))
    }

    #[must_use]
    pub fn hidden_for(&self, ctx: &RenderContext) -> bool {
        self.hidden_override
            .as_ref()
            .map_or(self.hidden, |f| f.call(ctx))
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.action_id == other.action_id
            && self.label == other.label
            && self.url == other.url
            && self.image == other.image
            && self.image_width == other.image_width
            && self.image_height == other.image_height
            && self.hidden == other.hidden
            && self.kind == other.kind
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ActionKind::Item => "Action",
            ActionKind::Menu => "MenuAction",
        };
        write!(f, "<{kind}(action_id={})>", self.action_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults_to_hash_url() {
        let action = Action::item("foo", "Foo");
        assert_eq!(action.url.as_deref(), Some(DEFAULT_URL));
        assert_eq!(action.kind(), ActionKind::Item);
        assert!(!action.hidden);
    }

    #[test]
    fn test_menu_has_no_url() {
        let menu = Action::menu("close", "Close");
        assert!(menu.is_menu());
        assert!(menu.url.is_none());
        assert_eq!(menu.url_for(&RenderContext::default()), None);
    }

    #[test]
    fn test_visibility_conditions_accumulate() {
        let action = Action::item("a", "A")
            .visible_when(RenderContext::is_authenticated)
            .visible_when(|ctx| ctx.feature_enabled("beta"));

        let anon = RenderContext::new("page").with_feature("beta");
        let user = RenderContext::new("page").with_user(1);
        let both = RenderContext::new("page").with_user(1).with_feature("beta");

        assert!(!action.should_render(&anon));
        assert!(!action.should_render(&user));
        assert!(action.should_render(&both));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let action = Action::item("dl", "Download")
            .with_url("/raw/")
            .label_when(|ctx| format!("Download for {}", ctx.url_name))
            .url_when(|_| "raw/".to_string())
            .hidden_when(|ctx| ctx.url_name == "view-interdiff");

        let ctx = RenderContext::new("view-interdiff");
        assert_eq!(action.label_for(&ctx), "Download for view-interdiff");
        assert_eq!(action.url_for(&ctx).as_deref(), Some("raw/"));
        assert!(action.hidden_for(&ctx));
        assert!(!action.hidden_for(&RenderContext::new("view-diff")));
    }

    #[test]
    fn test_equality_ignores_behaviours() {
        let plain = Action::item("foo", "Foo");
        let guarded = Action::item("foo", "Foo").visible_when(|_| false);
        assert_eq!(plain, guarded);
        assert_ne!(plain, Action::menu("foo", "Foo"));
    }

    #[test]
    fn test_display_names_kind_and_id() {
        assert_eq!(Action::menu("m", "M").to_string(), "<MenuAction(action_id=m)>");
    }
}

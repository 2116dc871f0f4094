//! Process-wide owner of the action registries and loaded hooks.
//!
//! [`ActionHost`] plays the role of the extension manager: it owns one registry
//! per [`RegistryTarget`], activates hooks into the registry their kind targets,
//! and tears everything down in reverse load order on shutdown.
//!
//! # Example
//!
//! ```rust
//! use actionhooks::{Action, ActionHook, ActionHost, Config, RegistryTarget, RenderContext};
//!
//! let mut host = ActionHost::new(&Config::default())?;
//! host.load_hook(ActionHook::header("my-extension", [Action::item("help-action", "Help")]))?;
//!
//! let ctx = RenderContext::new("dashboard");
//! let header: Vec<_> = host.registry(RegistryTarget::Header).resolve_for_context(&ctx).collect();
//! assert_eq!(header[0].label, "Help");
//!
//! host.shutdown()?;
//! # Ok::<(), actionhooks::ActionError>(())
//! ```

use crate::domain::error::{ActionError, Result};
use crate::hooks::{ActionHook, HookKind, HookManifest, RegistryTarget, TeardownPolicy};
use crate::registry::{defaults, ActionRegistry};
use crate::Config;
use serde::Serialize;

/// A hook the host has activated.
#[derive(Debug)]
struct LoadedHook {
    hook: ActionHook,
    /// Unix timestamp of activation.
    loaded_at: i64,
}

/// Summary of a loaded hook, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSummary {
    pub name: String,
    pub kind: HookKind,
    pub target: RegistryTarget,
    pub actions: usize,
    pub loaded_at: i64,
}

/// Owns the review request and header registries and the hooks loaded into them.
#[derive(Debug)]
pub struct ActionHost {
    review_request: ActionRegistry,
    header: ActionRegistry,
    hooks: Vec<LoadedHook>,
    teardown: TeardownPolicy,
}

impl ActionHost {
    /// Creates a host with empty header actions and, unless disabled in
    /// `config`, the built-in review request actions.
    ///
    /// Manifests listed in `config` are not loaded here; see
    /// [`crate::initialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in actions fail to register.
    pub fn new(config: &Config) -> Result<Self> {
        let review_request = if config.populate_defaults {
            ActionRegistry::with_defaults("review-request", defaults::review_request_actions())?
        } else {
            ActionRegistry::new("review-request")
        };

        let teardown = if config.strict_teardown {
            TeardownPolicy::Strict
        } else {
            TeardownPolicy::Tolerant
        };

        tracing::debug!(
            defaults = review_request.len(),
            teardown = ?teardown,
            "action host created"
        );

        Ok(Self {
            review_request,
            header: ActionRegistry::new("header"),
            hooks: Vec::new(),
            teardown,
        })
    }

    #[must_use]
    pub const fn registry(&self, target: RegistryTarget) -> &ActionRegistry {
        match target {
            RegistryTarget::ReviewRequest => &self.review_request,
            RegistryTarget::Header => &self.header,
        }
    }

    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.hooks.iter().any(|loaded| loaded.hook.name() == name)
    }

    /// Loaded hooks in load order.
    #[must_use]
    pub fn hooks(&self) -> Vec<HookSummary> {
        self.hooks
            .iter()
            .map(|loaded| HookSummary {
                name: loaded.hook.name().to_string(),
                kind: loaded.hook.kind(),
                target: loaded.hook.kind().target(),
                actions: loaded.hook.registered_ids().len(),
                loaded_at: loaded.loaded_at,
            })
            .collect()
    }

    /// Activates `hook` into the registry its kind targets and records it.
    ///
    /// If activation fails partway, the actions it managed to register are
    /// removed again before the error is returned and the hook is not recorded.
    ///
    /// # Errors
    ///
    /// - [`ActionError::HookState`] if a hook with the same name is loaded
    /// - Any activation error from [`ActionHook::activate`]
    pub fn load_hook(&mut self, mut hook: ActionHook) -> Result<()> {
        if self.is_loaded(hook.name()) {
            return Err(ActionError::HookState {
                name: hook.name().to_string(),
                message: "a hook with this name is already loaded".to_string(),
            });
        }

        let _span = tracing::debug_span!("load_hook", hook = %hook.name(), kind = ?hook.kind()).entered();
        let registry = self.registry(hook.kind().target());

        if let Err(err) = hook.activate(registry) {
            tracing::warn!(hook = %hook.name(), error = %err, "hook activation failed, rolling back");
            if hook.is_active() {
                if let Err(rollback) = hook.deactivate(registry, TeardownPolicy::Tolerant) {
                    tracing::warn!(error = %rollback, "hook rollback failed");
                }
            }
            return Err(err);
        }

        self.hooks.push(LoadedHook {
            hook,
            loaded_at: chrono::Utc::now().timestamp(),
        });
        Ok(())
    }

    /// Loads every hook declared in `manifest`, in order.
    ///
    /// Returns the number of hooks loaded.
    ///
    /// # Errors
    ///
    /// Stops at the first hook that fails to load; hooks loaded before it stay
    /// loaded.
    pub fn load_manifest(&mut self, manifest: HookManifest) -> Result<usize> {
        let hooks = manifest.into_hooks();
        let count = hooks.len();

        for hook in hooks {
            self.load_hook(hook)?;
        }

        Ok(count)
    }

    /// Deactivates the hook called `name` and forgets it.
    ///
    /// # Errors
    ///
    /// - [`ActionError::HookNotFound`] if no such hook is loaded
    /// - [`ActionError::NotFound`] under strict teardown if one of the hook's
    ///   actions had already been removed; the hook is still forgotten
    pub fn unload_hook(&mut self, name: &str) -> Result<()> {
        let position = self
            .hooks
            .iter()
            .position(|loaded| loaded.hook.name() == name)
            .ok_or_else(|| ActionError::HookNotFound(name.to_string()))?;

        let mut loaded = self.hooks.remove(position);
        let registry = self.registry(loaded.hook.kind().target());
        loaded.hook.deactivate(registry, self.teardown)
    }

    /// Unloads every hook in reverse load order, then clears both registries.
    ///
    /// # Errors
    ///
    /// Under strict teardown, returns the first error reported by a hook. The
    /// shutdown still completes.
    pub fn shutdown(&mut self) -> Result<()> {
        let _span = tracing::debug_span!("shutdown", hooks = self.hooks.len()).entered();
        let mut first_error = None;

        while let Some(mut loaded) = self.hooks.pop() {
            let registry = self.registry(loaded.hook.kind().target());
            if let Err(err) = loaded.hook.deactivate(registry, self.teardown) {
                tracing::warn!(hook = %loaded.hook.name(), error = %err, "hook teardown reported an error");
                first_error.get_or_insert(err);
            }
        }

        self.review_request.reset();
        self.header.reset();

        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, RenderContext};

    fn bare_config() -> Config {
        Config {
            populate_defaults: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_follow_config() {
        let host = ActionHost::new(&Config::default()).unwrap();
        assert_eq!(host.registry(RegistryTarget::ReviewRequest).len(), 11);
        assert!(host.registry(RegistryTarget::Header).is_empty());

        let bare = ActionHost::new(&bare_config()).unwrap();
        assert!(bare.registry(RegistryTarget::ReviewRequest).is_empty());
    }

    #[test]
    fn test_hooks_route_to_target_registry() {
        let mut host = ActionHost::new(&bare_config()).unwrap();
        host.load_hook(ActionHook::header("a", [Action::item("h", "H")])).unwrap();
        host.load_hook(ActionHook::diff_viewer("b", [Action::item("d", "D")])).unwrap();

        assert!(host.registry(RegistryTarget::Header).contains("h"));
        assert!(host.registry(RegistryTarget::ReviewRequest).contains("d"));

        let summaries = host.hooks();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].target, RegistryTarget::ReviewRequest);
        assert_eq!(summaries[1].actions, 1);
    }

    #[test]
    fn test_duplicate_hook_name_is_rejected() {
        let mut host = ActionHost::new(&bare_config()).unwrap();
        host.load_hook(ActionHook::header("a", [Action::item("x", "X")])).unwrap();

        let err = host
            .load_hook(ActionHook::header("a", [Action::item("y", "Y")]))
            .unwrap_err();
        assert!(matches!(err, ActionError::HookState { .. }));
        assert!(!host.registry(RegistryTarget::Header).contains("y"));
    }

    #[test]
    fn test_failed_activation_is_rolled_back() {
        let mut host = ActionHost::new(&bare_config()).unwrap();
        host.load_hook(ActionHook::header("a", [Action::item("taken", "Taken")])).unwrap();

        let err = host
            .load_hook(ActionHook::header("b", [Action::item("fresh", "Fresh"), Action::item("taken", "Again")]))
            .unwrap_err();
        assert!(matches!(err, ActionError::DuplicateId { .. }));

        let header = host.registry(RegistryTarget::Header);
        assert!(!header.contains("fresh"));
        assert!(header.contains("taken"));
        assert!(!host.is_loaded("b"));
    }

    #[test]
    fn test_unload_unknown_hook() {
        let mut host = ActionHost::new(&bare_config()).unwrap();
        assert!(matches!(
            host.unload_hook("missing").unwrap_err(),
            ActionError::HookNotFound(_)
        ));
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let mut host = ActionHost::new(&Config::default()).unwrap();
        host.load_hook(ActionHook::review_request("a", [Action::item("x", "X")])).unwrap();
        host.load_hook(ActionHook::header("b", [Action::item("y", "Y")])).unwrap();

        host.shutdown().unwrap();
        assert!(host.hooks().is_empty());
        assert!(host.registry(RegistryTarget::ReviewRequest).is_empty());
        assert!(host.registry(RegistryTarget::Header).is_empty());

        let ctx = RenderContext::new("review-request-detail").with_user(1);
        assert_eq!(host.registry(RegistryTarget::ReviewRequest).resolve_for_context(&ctx).count(), 0);
    }

    #[test]
    fn test_strict_shutdown_reports_missing_action() {
        let config = Config {
            strict_teardown: true,
            ..bare_config()
        };
        let mut host = ActionHost::new(&config).unwrap();
        host.load_hook(ActionHook::header("a", [Action::item("x", "X"), Action::item("y", "Y")])).unwrap();
        host.registry(RegistryTarget::Header).unregister("x").unwrap();

        assert!(matches!(host.shutdown().unwrap_err(), ActionError::NotFound { .. }));
        assert!(host.registry(RegistryTarget::Header).is_empty());
        assert!(host.hooks().is_empty());
    }
}

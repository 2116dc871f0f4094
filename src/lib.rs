//! Actionhooks: an ordered, nestable UI action registry with extension hooks.
//!
//! Pages render menus and toolbar buttons from a registry of actions. Core code
//! registers the built-in actions; extensions contribute more through hooks and
//! remove them again when they unload. On every request the registry resolves
//! the actions that apply to the current user and page.
//!
//! - Ordered registration with menus nested up to two levels deep
//! - Per-request visibility, labels and URLs decided by the actions themselves
//! - Hooks that track and tear down exactly what they registered
//! - Legacy dictionary descriptors translated into typed actions
//! - Hook manifests in TOML or JSON
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  CLI (main.rs)                                      │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │
//! │  - ActionHost: registries + loaded hooks            │
//! └─────────────────────────────────────────────────────┘
//!              │                          │
//! ┌─────────────────────────┐   ┌─────────────────────────┐
//! │ Hooks (hooks/)          │   │ Registry (registry/)    │
//! │ - Activation/teardown   │──►│ - Copy-on-write store   │
//! │ - Legacy descriptors    │   │ - Context resolution    │
//! │ - Manifests             │   │ - Built-in actions      │
//! └─────────────────────────┘   └─────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Paths (infrastructure/)                          │
//! │  - Actions, contexts, errors (domain/)              │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing-subscriber setup, rotating log file      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Host owning registries and loaded hooks
//! - [`domain`]: Core domain types (actions, contexts, errors)
//! - [`hooks`]: Extension hooks, legacy descriptors and manifests
//! - [`infrastructure`]: Platform-specific utilities (paths)
//! - [`observability`]: Tracing subscriber initialization
//! - [`registry`]: Action storage and per-request resolution
//!
//! # Configuration
//!
//! ```toml
//! # passed to the CLI with --config
//! trace_level = "debug"
//! log_file = "~/.local/share/actionhooks/actionhooks.log"
//! populate_defaults = true
//! strict_teardown = false
//! manifests = ["~/extensions/reports.toml"]
//! ```
//!
//! # Examples
//!
//! ## Registering and resolving
//!
//! ```rust
//! use actionhooks::{Action, ActionNode, ActionRegistry, RenderContext};
//!
//! let registry = ActionRegistry::new("header");
//! registry.register_node(
//!     ActionNode::menu(
//!         Action::menu("account-menu", "Account"),
//!         vec![
//!             Action::item("logout-action", "Log Out")
//!                 .with_url("/logout/")
//!                 .visible_when(RenderContext::is_authenticated)
//!                 .into(),
//!         ],
//!     ),
//!     None,
//! )?;
//!
//! // Menus with no visible children are left out entirely.
//! let anonymous = RenderContext::new("dashboard");
//! assert_eq!(registry.resolve_for_context(&anonymous).count(), 0);
//!
//! let signed_in = RenderContext::new("dashboard").with_user(7);
//! let resolved: Vec<_> = registry.resolve_for_context(&signed_in).collect();
//! assert_eq!(resolved[0].child_ids(), ["logout-action"]);
//! # Ok::<(), actionhooks::ActionError>(())
//! ```
//!
//! ## Host with hooks
//!
//! ```rust
//! use actionhooks::{initialize, Action, ActionHook, Config};
//!
//! let mut host = initialize(&Config::default())?;
//! host.load_hook(ActionHook::review_request("my-extension", [Action::item("my-action", "Mine")]))?;
//! host.unload_hook("my-extension")?;
//! host.shutdown()?;
//! # Ok::<(), actionhooks::ActionError>(())
//! ```
//!
//! # Key Design Decisions
//!
//! ## Copy-on-write snapshots
//!
//! Writes happen during extension load and unload; reads happen on every
//! request. Each registry keeps its state in an `Arc` snapshot that writers
//! replace wholesale, so a resolution never sees a half-applied change and never
//! holds a lock while it runs.
//!
//! ## Behaviour on the action
//!
//! Visibility and dynamic labels are closures stored on each [`Action`]. The
//! registry never inspects the context itself.

#![allow(clippy::multiple_crate_versions)]

pub mod app;
pub mod domain;
pub mod hooks;
pub mod infrastructure;
pub mod observability;
pub mod registry;

pub use app::{ActionHost, HookSummary};
pub use domain::{
    Action, ActionError, ActionId, ActionKind, ActionNode, ContextFn, RenderContext, Result,
    ReviewRequestInfo, ReviewRequestStatus,
};
pub use hooks::{ActionHook, HookKind, HookManifest, LegacyDescriptor, RegistryTarget, TeardownPolicy};
pub use registry::{ActionRegistry, ResolvedAction};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Runtime configuration.
///
/// Loaded from a TOML file with [`Config::from_file`] or from loose key/value
/// pairs (environment, command line) with [`Config::from_map`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Log level filter, overridden by `RUST_LOG`.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,

    /// Log file path. Logs go to stderr when unset.
    ///
    /// A leading `~` is expanded to the home directory.
    pub log_file: Option<String>,

    /// Whether the review request registry starts with the built-in actions.
    ///
    /// Default: `true`
    pub populate_defaults: bool,

    /// Whether hook teardown fails on actions that were removed behind the
    /// hook's back, instead of only logging them.
    ///
    /// Default: `false`
    pub strict_teardown: bool,

    /// Hook manifest files loaded by [`initialize`], in order.
    pub manifests: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace_level: None,
            log_file: None,
            populate_defaults: true,
            strict_teardown: false,
            manifests: Vec::new(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Parses configuration from a string map.
    ///
    /// Values are parsed leniently: unparseable values fall back to their
    /// defaults and unknown keys are ignored.
    ///
    /// # Parsing Rules
    ///
    /// - `trace_level`, `log_file`: taken as-is
    /// - `populate_defaults`, `strict_teardown`: `true`/`false`, `yes`/`no`,
    ///   `on`/`off` or `1`/`0`
    /// - `manifests`: comma-separated paths (empty segments dropped)
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use actionhooks::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("manifests".to_string(), "a.toml, b.json".to_string());
    /// map.insert("strict_teardown".to_string(), "yes".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.manifests, vec!["a.toml", "b.json"]);
    /// assert!(config.strict_teardown);
    /// assert!(config.populate_defaults);
    /// ```
    #[must_use]
    pub fn from_map(config: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let manifests = config
            .get("manifests")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let flag = |key: &str, default: bool| {
            config.get(key).and_then(|s| parse_flag(s)).unwrap_or(default)
        };

        Self {
            trace_level: config.get("trace_level").cloned(),
            log_file: config.get("log_file").cloned(),
            populate_defaults: flag("populate_defaults", defaults.populate_defaults),
            strict_teardown: flag("strict_teardown", defaults.strict_teardown),
            manifests,
        }
    }

    /// Parses configuration from a TOML file.
    ///
    /// Missing keys take their defaults; unknown keys are rejected.
    ///
    /// # Errors
    ///
    /// - [`ActionError::Io`] if the file cannot be read
    /// - [`ActionError::Config`] if the contents are not valid configuration
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ActionError::Config(format!("{}: {e}", path.display())))
    }

    /// Sends logs to [`infrastructure::default_log_file`] unless a log file
    /// is already configured.
    ///
    /// The default location honours `ACTIONHOOKS_DATA_DIR`.
    #[must_use]
    pub fn with_default_log_file(mut self) -> Self {
        if self.log_file.is_none() {
            self.log_file = Some(infrastructure::default_log_file().display().to_string());
        }
        self
    }

    /// Manifest paths with `~` expanded.
    #[must_use]
    pub fn manifest_paths(&self) -> Vec<PathBuf> {
        self.manifests
            .iter()
            .map(|path| PathBuf::from(infrastructure::expand_tilde(path)))
            .collect()
    }
}

/// Builds a host from configuration and loads its manifests.
///
/// # Side Effects
///
/// - Logs initialization events (tracing is set up separately with
///   [`observability::init_tracing`])
/// - Reads every manifest listed in `config`
///
/// # Errors
///
/// Returns the first error reading a manifest or loading one of its hooks.
/// Hooks loaded before the failure stay loaded in the discarded host.
///
/// # Example
///
/// ```rust
/// use actionhooks::{initialize, Config, RegistryTarget};
///
/// let host = initialize(&Config::default())?;
/// assert!(!host.registry(RegistryTarget::ReviewRequest).is_empty());
/// # Ok::<(), actionhooks::ActionError>(())
/// ```
pub fn initialize(config: &Config) -> Result<ActionHost> {
    tracing::debug!(manifests = config.manifests.len(), "initializing action host");

    let mut host = ActionHost::new(config)?;

    for path in config.manifest_paths() {
        let manifest = HookManifest::load(&path)?;
        let loaded = host.load_manifest(manifest)?;
        tracing::info!(path = %path.display(), hooks = loaded, "loaded hook manifest");
    }

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_map_defaults_and_fallbacks() {
        let config = Config::from_map(&BTreeMap::new());
        assert_eq!(config, Config::default());

        let mut map = BTreeMap::new();
        map.insert("populate_defaults".to_string(), "maybe".to_string());
        map.insert("manifests".to_string(), " , ".to_string());
        map.insert("trace_level".to_string(), "debug".to_string());

        let config = Config::from_map(&map);
        assert!(config.populate_defaults);
        assert!(config.manifests.is_empty());
        assert_eq!(config.trace_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "populate_defaults = false\nmanifests = [\"hooks.toml\"]\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(!config.populate_defaults);
        assert!(!config.strict_teardown);
        assert_eq!(config.manifests, vec!["hooks.toml"]);
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scan_depth = 4\n").unwrap();

        assert!(matches!(Config::from_file(&path).unwrap_err(), ActionError::Config(_)));
    }

    #[test]
    fn test_default_log_file_only_fills_gaps() {
        let config = Config::default().with_default_log_file();
        assert_eq!(
            config.log_file.as_deref().map(PathBuf::from),
            Some(infrastructure::default_log_file())
        );

        let explicit = Config {
            log_file: Some("/tmp/explicit.log".to_string()),
            ..Config::default()
        }
        .with_default_log_file();
        assert_eq!(explicit.log_file.as_deref(), Some("/tmp/explicit.log"));
    }

    #[test]
    fn test_initialize_loads_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("hooks.toml");
        std::fs::write(
            &manifest,
            "[[hooks]]\nname = \"help\"\nkind = \"header\"\n\n[[hooks.actions]]\nlabel = \"Help\"\n",
        )
        .unwrap();

        let config = Config {
            manifests: vec![manifest.display().to_string()],
            ..Config::default()
        };
        let host = initialize(&config).unwrap();

        assert!(host.is_loaded("help"));
        assert!(host.registry(RegistryTarget::Header).contains("help-action"));
    }

    #[test]
    fn test_initialize_reports_missing_manifest() {
        let config = Config {
            manifests: vec!["/nonexistent/hooks.toml".to_string()],
            ..Config::default()
        };
        assert!(matches!(initialize(&config).unwrap_err(), ActionError::Io(_)));
    }
}

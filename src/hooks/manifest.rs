//! Hook manifests: hooks declared in TOML or JSON files.
//!
//! A manifest lets an extension ship its actions as data instead of code. Each
//! `[[hooks]]` table becomes one [`ActionHook`] whose actions are legacy
//! descriptors.
//!
//! # TOML Format
//!
//! ```toml
//! [[hooks]]
//! name = "my-extension"
//! kind = "review_request_dropdown"
//!
//! [[hooks.actions]]
//! id = "my-menu"
//! label = "My Menu"
//! items = [
//!     { id = "my-item", label = "My Item", url = "/my-item/" },
//! ]
//! ```

use crate::domain::error::{ActionError, Result};
use crate::hooks::descriptor::LegacyDescriptor;
use crate::hooks::hook::{ActionHook, HookKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One hook declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    pub name: String,
    pub kind: HookKind,
    #[serde(default)]
    pub actions: Vec<LegacyDescriptor>,
}

/// A set of hooks loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookManifest {
    #[serde(default)]
    pub hooks: Vec<HookSpec>,
}

impl HookManifest {
    /// Parses a TOML manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Manifest`] on invalid TOML or unknown hook kinds.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ActionError::Manifest(format!("failed to parse TOML: {e}")))
    }

    /// Parses a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Manifest`] on invalid JSON or unknown hook kinds.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| ActionError::Manifest(format!("failed to parse JSON: {e}")))
    }

    /// Loads a manifest, choosing the format from the file extension.
    ///
    /// Files ending in `.json` are parsed as JSON; everything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Io`] if the file cannot be read, or
    /// [`ActionError::Manifest`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = ?path, "loading hook manifest");

        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let manifest = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
        .map_err(|e| ActionError::Manifest(format!("{}: {e}", path.display())))?;

        tracing::debug!(hooks = manifest.hooks.len(), "loaded hook manifest");
        Ok(manifest)
    }

    /// Builds inactive hooks, one per declared spec.
    #[must_use]
    pub fn into_hooks(self) -> Vec<ActionHook> {
        self.hooks
            .into_iter()
            .map(|spec| ActionHook::new(spec.name, spec.kind, spec.actions))
            .collect()
    }
}

//! Legacy dictionary descriptors for hook actions.
//!
//! Older extensions describe their actions as flat key/value records instead of
//! typed [`Action`] values. This module translates such records into the typed
//! model at the hook boundary; after translation they behave exactly like typed
//! actions. The format is kept for backward compatibility only and new code
//! should construct [`Action`]s directly.
//!
//! # Format
//!
//! ```json
//! {
//!   "id": "my-menu",
//!   "label": "My Menu",
//!   "items": [
//!     {"label": "Item One", "url": "/one/", "image": "/static/one.png"}
//!   ]
//! }
//! ```

use crate::domain::error::{ActionError, Result};
use crate::domain::{Action, ActionId, ActionNode};
use serde::{Deserialize, Serialize};

/// A legacy action record.
///
/// Unknown keys are ignored, matching the lenient behaviour extensions relied on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    /// Child records; present only on menu descriptors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LegacyDescriptor>>,
}

impl LegacyDescriptor {
    /// Parses a descriptor from an arbitrary JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidDescriptor`] if the value is not an object
    /// or a field has the wrong type.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ActionError::InvalidDescriptor(e.to_string()))
    }

    #[must_use]
    pub const fn is_menu(&self) -> bool {
        self.items.is_some()
    }

    /// The identifier this record registers under.
    ///
    /// Records without an `id` derive one from the label: `"Do Thing"` becomes
    /// `"do-thing-action"`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidDescriptor`] if neither `id` nor `label`
    /// is present.
    pub fn action_id(&self) -> Result<ActionId> {
        if let Some(id) = &self.id {
            return Ok(ActionId::new(id.clone()));
        }

        self.label
            .as_ref()
            .map(|label| ActionId::new(format!("{}-action", label.to_lowercase().replace(' ', "-"))))
            .ok_or_else(|| ActionError::InvalidDescriptor("descriptor has neither id nor label".to_string()))
    }

    /// Translates this record into a typed action, ignoring `items`.
    ///
    /// # Errors
    ///
    /// See [`action_id`](Self::action_id).
    pub fn to_action(&self) -> Result<Action> {
        let action_id = self.action_id()?;
        let label = self.label.clone().unwrap_or_else(|| action_id.to_string());

        let mut action = if self.is_menu() {
            Action::menu(action_id, label)
        } else {
            Action::item(action_id, label)
        };

        if let Some(url) = &self.url {
            action = action.with_url(url.clone());
        }
        if let Some(image) = &self.image {
            action = action.with_image(image.clone(), self.image_width, self.image_height);
        } else {
            action.image_width = self.image_width;
            action.image_height = self.image_height;
        }

        Ok(action)
    }

    /// Translates this record and its items into a node tree.
    ///
    /// # Errors
    ///
    /// Returns the first translation error in the tree.
    pub fn to_node(&self) -> Result<ActionNode> {
        let action = self.to_action()?;

        match &self.items {
            None => Ok(ActionNode::leaf(action)),
            Some(items) => {
                let children = items.iter().map(Self::to_node).collect::<Result<Vec<_>>>()?;
                Ok(ActionNode::menu(action, children))
            }
        }
    }
}

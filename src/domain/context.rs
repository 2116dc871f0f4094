//! Per-request rendering context consulted by action behaviours.
//!
//! The registry never inspects a [`RenderContext`] itself. It only hands the
//! context to each action's visibility predicate and label/URL overrides, so
//! the fields here exist for the built-in review-request actions and for
//! extensions. Anything an extension needs beyond them goes in `extra`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Route names served by the diff viewer.
pub const DIFF_VIEWER_URL_NAMES: &[&str] = &["view-diff", "view-interdiff", "view-diff-revision"];

/// Publication status of a review request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewRequestStatus {
    /// Open and awaiting review.
    #[default]
    Pending,
    /// Closed as submitted.
    Submitted,
    /// Closed as discarded.
    Discarded,
}

/// The review request a page is rendering, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewRequestInfo {
    /// ID shown in URLs (local-site scoped).
    pub display_id: u64,
    /// User ID of the submitter.
    pub submitter_id: u64,
    /// Current status.
    pub status: ReviewRequestStatus,
    /// Whether the review request has been published.
    pub public: bool,
    /// Whether the review request is backed by a repository.
    pub has_repository: bool,
    /// Whether a diff (published or drafted) exists.
    pub has_diffs: bool,
}

/// Opaque per-request state used to decide which actions display.
///
/// # Example
///
/// ```
/// use actionhooks::RenderContext;
///
/// let ctx = RenderContext::new("view-diff")
///     .with_user(7)
///     .with_permission("reviews.can_change_status");
/// assert!(ctx.is_diff_viewer());
/// assert!(ctx.is_authenticated());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderContext {
    /// Route name of the page being rendered.
    pub url_name: String,
    /// Requesting user, `None` when anonymous.
    pub user_id: Option<u64>,
    /// Granted permissions, e.g. `reviews.delete_reviewrequest`.
    pub permissions: BTreeSet<String>,
    /// Enabled feature switches, e.g. `general_comments`.
    pub features: BTreeSet<String>,
    /// Local site name when the page is served under `/s/<site>/`.
    pub local_site: Option<String>,
    /// Review request on the page.
    pub review_request: Option<ReviewRequestInfo>,
    /// Extension-private values.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RenderContext {
    /// Creates an anonymous context for the given route.
    #[must_use]
    pub fn new(url_name: impl Into<String>) -> Self {
        Self {
            url_name: url_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }

    #[must_use]
    pub fn with_local_site(mut self, site: impl Into<String>) -> Self {
        self.local_site = Some(site.into());
        self
    }

    #[must_use]
    pub const fn with_review_request(mut self, review_request: ReviewRequestInfo) -> Self {
        self.review_request = Some(review_request);
        self
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    #[must_use]
    pub fn feature_enabled(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Returns `true` on any diff viewer route.
    #[must_use]
    pub fn is_diff_viewer(&self) -> bool {
        DIFF_VIEWER_URL_NAMES.contains(&self.url_name.as_str())
    }

    /// Returns `true` if the requesting user submitted the review request.
    #[must_use]
    pub fn is_submitter(&self) -> bool {
        match (self.user_id, &self.review_request) {
            (Some(user), Some(rr)) => user == rr.submitter_id,
            _ => false,
        }
    }
}

//! Built-in review request actions.
//!
//! These populate the review request registry before any extension loads. Each
//! action decides its own visibility from the [`RenderContext`]; the registry
//! only handles ordering and cascading.

use crate::domain::{Action, ActionNode, RenderContext, ReviewRequestStatus};

pub const CLOSE_MENU_ID: &str = "close-review-request-action";
pub const SUBMIT_ID: &str = "submit-review-request-action";
pub const DISCARD_ID: &str = "discard-review-request-action";
pub const DELETE_ID: &str = "delete-review-request-action";
pub const UPDATE_MENU_ID: &str = "update-review-request-action";
pub const UPLOAD_DIFF_ID: &str = "upload-diff-action";
pub const UPLOAD_FILE_ID: &str = "upload-file-action";
pub const DOWNLOAD_DIFF_ID: &str = "download-diff-action";
pub const EDIT_REVIEW_ID: &str = "review-action";
pub const GENERAL_COMMENT_ID: &str = "general-comment-action";
pub const SHIP_IT_ID: &str = "ship-it-action";

pub const PERM_CAN_CHANGE_STATUS: &str = "reviews.can_change_status";
pub const PERM_CAN_EDIT_REVIEW_REQUEST: &str = "reviews.can_edit_reviewrequest";
pub const PERM_DELETE_REVIEW_REQUEST: &str = "reviews.delete_reviewrequest";
pub const FEATURE_GENERAL_COMMENTS: &str = "general_comments";

fn is_pending(ctx: &RenderContext) -> bool {
    ctx.review_request
        .as_ref()
        .is_some_and(|rr| rr.status == ReviewRequestStatus::Pending)
}

fn is_public(ctx: &RenderContext) -> bool {
    ctx.review_request.as_ref().is_some_and(|rr| rr.public)
}

fn has_repository(ctx: &RenderContext) -> bool {
    ctx.review_request.as_ref().is_some_and(|rr| rr.has_repository)
}

fn close_menu() -> ActionNode {
    let menu = Action::menu(CLOSE_MENU_ID, "Close").visible_when(|ctx| {
        is_pending(ctx)
            && (ctx.is_submitter() || (ctx.has_permission(PERM_CAN_CHANGE_STATUS) && is_public(ctx)))
    });

    ActionNode::menu(
        menu,
        vec![
            Action::item(SUBMIT_ID, "Submitted").visible_when(is_public).into(),
            Action::item(DISCARD_ID, "Discarded").into(),
            Action::item(DELETE_ID, "Delete Permanently")
                .visible_when(|ctx| ctx.has_permission(PERM_DELETE_REVIEW_REQUEST))
                .into(),
        ],
    )
}

fn update_menu() -> ActionNode {
    let menu = Action::menu(UPDATE_MENU_ID, "Update").visible_when(|ctx| {
        is_pending(ctx) && (ctx.is_submitter() || ctx.has_permission(PERM_CAN_EDIT_REVIEW_REQUEST))
    });

    let upload_diff = Action::item(UPLOAD_DIFF_ID, "Upload Diff")
        .visible_when(has_repository)
        .label_when(|ctx| {
            if ctx.review_request.as_ref().is_some_and(|rr| rr.has_diffs) {
                "Update Diff".to_string()
            } else {
                "Upload Diff".to_string()
            }
        });

    ActionNode::menu(
        menu,
        vec![upload_diff.into(), Action::item(UPLOAD_FILE_ID, "Add File").into()],
    )
}

/// URL of the raw diff download for the current page.
///
/// The diff viewer uses a relative URL so switching revisions does not require
/// re-rendering the page.
#[must_use]
pub fn raw_diff_url(ctx: &RenderContext) -> String {
    if ctx.is_diff_viewer() {
        return "raw/".to_string();
    }

    let display_id = ctx.review_request.as_ref().map_or(0, |rr| rr.display_id);
    match &ctx.local_site {
        Some(site) => format!("/s/{site}/r/{display_id}/diff/raw/"),
        None => format!("/r/{display_id}/diff/raw/"),
    }
}

fn download_diff() -> Action {
    Action::item(DOWNLOAD_DIFF_ID, "Download Diff")
        .visible_when(|ctx| ctx.is_diff_viewer() || has_repository(ctx))
        .url_when(raw_diff_url)
        .hidden_when(|ctx| ctx.url_name == "view-interdiff")
}

/// The default review request actions, in display order.
#[must_use]
pub fn review_request_actions() -> Vec<ActionNode> {
    vec![
        close_menu(),
        update_menu(),
        download_diff().into(),
        Action::item(EDIT_REVIEW_ID, "Review")
            .visible_when(RenderContext::is_authenticated)
            .into(),
        Action::item(GENERAL_COMMENT_ID, "Add General Comment")
            .visible_when(|ctx| ctx.is_authenticated() && ctx.feature_enabled(FEATURE_GENERAL_COMMENTS))
            .into(),
        Action::item(SHIP_IT_ID, "Ship It!")
            .visible_when(RenderContext::is_authenticated)
            .into(),
    ]
}

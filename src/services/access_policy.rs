//! Maps a caller's permissions on a file to an editor session kind
//!
//! | upload | download | empty | result                   |
//! |--------|----------|-------|--------------------------|
//! | yes    | yes      | yes   | read-write, `new` URL    |
//! | yes    | yes      | no    | read-write, `edit` URL   |
//! | no     | yes      | no    | read-only, `view` URL    |
//! | no     | yes      | yes   | denied                   |
//! | any    | no       | any   | denied                   |

use crate::models::{AccessDecision, DenyReason, PermissionSet, UrlKind, ViewMode};

pub fn decide(permissions: &PermissionSet, is_empty: bool) -> AccessDecision {
    let can_upload = permissions.initiate_file_upload;
    let can_download = permissions.initiate_file_download;

    match (can_upload, can_download, is_empty) {
        (_, false, _) => AccessDecision::Denied(DenyReason::NoDownloadPermission),
        (true, true, true) => AccessDecision::Allowed {
            view_mode: ViewMode::ReadWrite,
            url_kind: UrlKind::New,
        },
        (true, true, false) => AccessDecision::Allowed {
            view_mode: ViewMode::ReadWrite,
            url_kind: UrlKind::Edit,
        },
        (false, true, false) => AccessDecision::Allowed {
            view_mode: ViewMode::ReadOnly,
            url_kind: UrlKind::View,
        },
        (false, true, true) => AccessDecision::Denied(DenyReason::ReadOnlyEmptyFile),
    }
}

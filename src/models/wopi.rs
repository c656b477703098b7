//! Editing-bridge and response data types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Access level of an editing session, in the bridge's wire spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    #[serde(rename = "VIEW_MODE_READ_WRITE")]
    ReadWrite,
    #[serde(rename = "VIEW_MODE_READ_ONLY")]
    ReadOnly,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::ReadWrite => "VIEW_MODE_READ_WRITE",
            ViewMode::ReadOnly => "VIEW_MODE_READ_ONLY",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the three editor URLs of an extension to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    /// Let the editor initialise an empty file
    New,
    Edit,
    View,
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UrlKind::New => "new",
            UrlKind::Edit => "edit",
            UrlKind::View => "view",
        };
        f.write_str(name)
    }
}

/// Why a file cannot be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Download is not granted, so neither viewing nor editing is possible
    NoDownloadPermission,
    /// Read-only access to an empty file. The permission set cannot tell this
    /// apart from "no access", so it is refused.
    ReadOnlyEmptyFile,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoDownloadPermission => f.write_str("download permission not granted"),
            DenyReason::ReadOnlyEmptyFile => f.write_str("read-only access to an empty file"),
        }
    }
}

/// Outcome of the access policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed { view_mode: ViewMode, url_kind: UrlKind },
    Denied(DenyReason),
}

/// Editor URLs the bridge advertises for one extension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionHandler {
    #[serde(default)]
    pub view: String,
    #[serde(default)]
    pub edit: String,
    #[serde(default)]
    pub new: String,
}

impl ExtensionHandler {
    pub fn url_for(&self, kind: UrlKind) -> &str {
        match kind {
            UrlKind::New => &self.new,
            UrlKind::Edit => &self.edit,
            UrlKind::View => &self.view,
        }
    }
}

/// Extension catalogue keyed by lower-cased `".ext"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionMap {
    handlers: HashMap<String, ExtensionHandler>,
}

impl ExtensionMap {
    pub fn get(&self, extension: &str) -> Option<&ExtensionHandler> {
        self.handlers.get(&extension.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Keys that differ only in case collapse into one entry. The lower-case
/// spelling wins; otherwise the last key in byte order does.
impl From<HashMap<String, ExtensionHandler>> for ExtensionMap {
    fn from(raw: HashMap<String, ExtensionHandler>) -> Self {
        let mut entries: Vec<_> = raw.into_iter().collect();
        entries.sort_by_cached_key(|(extension, _)| {
            (*extension == extension.to_lowercase(), extension.clone())
        });

        let mut handlers = HashMap::with_capacity(entries.len());
        for (extension, handler) in entries {
            if handlers.insert(extension.to_lowercase(), handler).is_some() {
                warn!(
                    "Extension {} is listed more than once ignoring case, keeping {}",
                    extension.to_lowercase(),
                    extension
                );
            }
        }
        Self { handlers }
    }
}

impl FromIterator<(String, ExtensionHandler)> for ExtensionMap {
    fn from_iter<I: IntoIterator<Item = (String, ExtensionHandler)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<HashMap<_, _>>())
    }
}

/// Parameters of a session-open call to the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Opaque id (or path) of the file on the storage side
    pub file_key: String,
    pub view_mode: ViewMode,
    pub storage_id: String,
    pub folder_url: String,
    pub user_name: String,
}

/// Opaque `WOPISrc` issued by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// JSON body returned to the file manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFileResult {
    #[serde(rename = "wopiclienturl")]
    pub wopi_client_url: String,
    #[serde(rename = "accesstoken")]
    pub access_token: String,
    /// Expiry of `access_token` in epoch milliseconds
    #[serde(rename = "accesstokenttl")]
    pub access_token_ttl: i64,
}

/// Result of the open-file pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened(OpenFileResult),
    Denied(DenyReason),
}

//! Storage gateway data types
//!
//! These mirror the JSON shape of the gateway's `Stat` call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally addressable identity of a resource: storage partition plus opaque id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub storage_id: String,
    pub opaque_id: String,
}

impl ResourceId {
    pub fn new<S: Into<String>, O: Into<String>>(storage_id: S, opaque_id: O) -> Self {
        Self {
            storage_id: storage_id.into(),
            opaque_id: opaque_id.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.storage_id, self.opaque_id)
    }
}

/// What a `Stat` call addresses: a decoded id or a plain storage path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    ResourceId(ResourceId),
    Path(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::ResourceId(id) => write!(f, "id:{id}"),
            Reference::Path(path) => write!(f, "path:{path}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "RESOURCE_TYPE_FILE")]
    File,
    #[serde(rename = "RESOURCE_TYPE_CONTAINER")]
    Container,
    #[serde(rename = "RESOURCE_TYPE_REFERENCE")]
    Reference,
    #[serde(rename = "RESOURCE_TYPE_SYMLINK")]
    Symlink,
    #[serde(rename = "RESOURCE_TYPE_INVALID")]
    #[serde(other)]
    Invalid,
}

/// The subset of the gateway permission set the access policy consults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    pub initiate_file_upload: bool,
    #[serde(default)]
    pub initiate_file_download: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: ResourceId,
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub permission_set: PermissionSet,
}

impl FileMetadata {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Lower-cased extension of the final path element, dot included (`".odt"`)
    pub fn extension(&self) -> String {
        crate::utils::path::extension(&self.path).to_lowercase()
    }

    /// Directory containing the file, used as folder context by the bridge
    pub fn parent_dir(&self) -> String {
        crate::utils::path::dir(&self.path)
    }
}

/// Status codes of interest from the gateway RPC layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcCode {
    #[serde(rename = "CODE_OK")]
    Ok,
    #[serde(rename = "CODE_NOT_FOUND")]
    NotFound,
    #[serde(rename = "CODE_PERMISSION_DENIED")]
    PermissionDenied,
    #[serde(rename = "CODE_UNAUTHENTICATED")]
    Unauthenticated,
    #[serde(rename = "CODE_INTERNAL")]
    Internal,
    #[serde(rename = "CODE_UNKNOWN")]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: RpcCode,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRequest {
    #[serde(rename = "ref")]
    pub reference: Reference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatResponse {
    pub status: RpcStatus,
    #[serde(default)]
    pub info: Option<FileMetadata>,
}

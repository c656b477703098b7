pub mod auth;
pub mod storage;
pub mod wopi;

pub use auth::{Caller, Principal};
pub use storage::{
    FileMetadata, PermissionSet, Reference, ResourceId, ResourceType, RpcCode, RpcStatus,
    StatRequest, StatResponse,
};
pub use wopi::{
    AccessDecision, DenyReason, ExtensionHandler, ExtensionMap, OpenFileResult, OpenOutcome,
    SessionHandle, SessionRequest, UrlKind, ViewMode,
};

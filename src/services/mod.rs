pub mod access_policy;
pub mod editing_bridge;
pub mod resource_id;
pub mod storage;
pub mod storage_token;
pub mod wopi;

pub use editing_bridge::{EditingBridge, HttpEditingBridge};
pub use storage::{HttpStorageGateway, StorageGateway};
pub use storage_token::{ForwardedTokenSource, MintingTokenSource, StorageTokenSource};
pub use wopi::{FileTarget, WopiService};

//! Centralized error handling for the WOPI server
//!
//! # Error Categories
//!
//! - **Input Errors**: malformed identifiers, missing parameters, missing identity
//! - **Storage Errors**: not found, non-file resources, backend failures
//! - **Bridge Errors**: the editing bridge is unreachable or refused the call
//! - **Internal Errors**: URL assembly and serialization
//!
//! # Usage
//!
//! ```rust
//! use wopi_server::errors::{AppError, AppResult};
//!
//! fn example_function(file_id: &str) -> AppResult<String> {
//!     if file_id.is_empty() {
//!         return Err(AppError::missing_parameter("fileID parameter missing in request"));
//!     }
//!     Ok(file_id.to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

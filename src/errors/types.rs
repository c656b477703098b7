//! Error type definitions for the WOPI server
//!
//! Every stage of the open-file pipeline fails fast with one of these kinds.
//! The web layer maps each kind onto an HTTP status in `web::responses`.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The caller-supplied file identifier could not be decoded
    #[error("Malformed identifier: {message}")]
    MalformedIdentifier { message: String },

    /// A required request parameter is absent
    #[error("{message}")]
    MissingParameter { message: String },

    /// The caller identity or storage token is missing or unusable
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// The storage gateway reported the resource as absent
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The resource is not a file, or no editor handles its extension
    #[error("Unsupported type: {message}")]
    UnsupportedType { message: String },

    /// The editing bridge answered with a non-200 status or could not be reached
    #[error("Editing bridge unavailable: {endpoint} - {message}")]
    BridgeUnavailable { endpoint: String, message: String },

    /// The storage gateway failed for any reason other than "not found"
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    /// Configuration errors, raised at start-up
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// URL assembly or serialization failures
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Transport-level HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    pub fn malformed_identifier<S: Into<String>>(message: S) -> Self {
        Self::MalformedIdentifier {
            message: message.into(),
        }
    }

    pub fn missing_parameter<S: Into<String>>(message: S) -> Self {
        Self::MissingParameter {
            message: message.into(),
        }
    }

    pub fn unauthenticated<S: Into<String>>(message: S) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unsupported_type<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedType {
            message: message.into(),
        }
    }

    /// Create a bridge error for the given endpoint path
    pub fn bridge_unavailable<E: Into<String>, M: Into<String>>(endpoint: E, message: M) -> Self {
        Self::BridgeUnavailable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Only transport failures qualify: the remote side never produced an
    /// answer. A status code from the remote side is final.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = AppError::bridge_unavailable("/wopi/cbox/endpoints", "status 503");
        assert_eq!(
            err.to_string(),
            "Editing bridge unavailable: /wopi/cbox/endpoints - status 503"
        );

        let err = AppError::missing_parameter("fileID parameter missing in request");
        assert_eq!(err.to_string(), "fileID parameter missing in request");
    }

    #[test]
    fn test_only_transport_errors_are_transient() {
        assert!(!AppError::bridge_unavailable("/wopi/iop/open", "status 500").is_transient());
        assert!(!AppError::backend("CODE_INTERNAL").is_transient());
        assert!(!AppError::not_found("gone").is_transient());
    }
}

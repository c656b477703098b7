//! Request extractors
//!
//! Caller identity, query parameters and request context, validated at the
//! boundary before any service is called.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Caller, Principal};
use crate::services::FileTarget;

/// Query of the open endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenFileParams {
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
}

impl OpenFileParams {
    /// `fileId` wins when both are present; empty values count as absent
    pub fn into_target(self) -> AppResult<FileTarget> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        if let Some(file_id) = non_empty(self.file_id) {
            Ok(FileTarget::EncodedId(file_id))
        } else if let Some(file_path) = non_empty(self.file_path) {
            Ok(FileTarget::Path(file_path))
        } else {
            Err(AppError::missing_parameter("fileID parameter missing in request"))
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read the caller from the headers the upstream proxy sets
pub fn caller_from_headers(headers: &HeaderMap, auth: &AuthConfig) -> AppResult<Caller> {
    let user_id = header_value(headers, &auth.user_id_header).ok_or_else(|| {
        AppError::unauthenticated(format!("missing {} header", auth.user_id_header))
    })?;
    let display_name =
        header_value(headers, &auth.display_name_header).unwrap_or_else(|| user_id.clone());

    Ok(Caller {
        principal: Principal {
            user_id,
            display_name,
        },
        forwarded_token: header_value(headers, &auth.token_header),
    })
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers, &state.config.auth)
    }
}

/// Request context information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    /// First hop of `x-real-ip` or `x-forwarded-for`
    pub real_ip: Option<String>,
    pub request_id: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let real_ip = parts
            .headers
            .get("x-real-ip")
            .or_else(|| parts.headers.get("x-forwarded-for"))
            .and_then(|h| h.to_str().ok())
            .map(|s| s.split(',').next().unwrap_or(s).trim().to_string());

        let request_id = parts
            .extensions
            .get::<super::middleware::RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            user_agent,
            real_ip,
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(file_id: Option<&str>, file_path: Option<&str>) -> OpenFileParams {
        OpenFileParams {
            file_id: file_id.map(str::to_string),
            file_path: file_path.map(str::to_string),
        }
    }

    #[test]
    fn test_file_id_takes_precedence() {
        assert_eq!(
            params(Some("czE6NDI="), Some("/a.odt")).into_target().unwrap(),
            FileTarget::EncodedId("czE6NDI=".to_string())
        );
        assert_eq!(
            params(Some(""), Some("/a.odt")).into_target().unwrap(),
            FileTarget::Path("/a.odt".to_string())
        );
    }

    #[test]
    fn test_missing_identifier() {
        let err = params(None, None).into_target().unwrap_err();
        assert!(matches!(err, AppError::MissingParameter { .. }));
        assert_eq!(err.to_string(), "fileID parameter missing in request");
    }

    #[tokio::test]
    async fn test_request_context_from_parts() {
        let request = axum::http::Request::builder()
            .uri("/open")
            .header("user-agent", "files/3.1")
            .header("x-forwarded-for", "10.0.0.7, 172.16.0.1")
            .extension(crate::web::middleware::RequestId("req-1".to_string()))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let context = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(
            context,
            RequestContext {
                user_agent: Some("files/3.1".to_string()),
                real_ip: Some("10.0.0.7".to_string()),
                request_id: "req-1".to_string(),
            }
        );
    }

    #[test]
    fn test_caller_from_headers() {
        let auth = AuthConfig::default();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            caller_from_headers(&headers, &auth),
            Err(AppError::Unauthenticated { .. })
        ));

        headers.insert("x-remote-user", HeaderValue::from_static("einstein"));
        let caller = caller_from_headers(&headers, &auth).unwrap();
        assert_eq!(caller.principal.display_name, "einstein");
        assert_eq!(caller.forwarded_token, None);

        headers.insert(
            "x-remote-user-display-name",
            HeaderValue::from_static("Albert Einstein"),
        );
        headers.insert("x-access-token", HeaderValue::from_static("tok"));
        let caller = caller_from_headers(&headers, &auth).unwrap();
        assert_eq!(caller.principal.user_id, "einstein");
        assert_eq!(caller.principal.display_name, "Albert Einstein");
        assert_eq!(caller.forwarded_token.as_deref(), Some("tok"));
    }
}

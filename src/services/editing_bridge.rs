//! Editing bridge client
//!
//! The bridge owns the WOPI protocol proper. This service only asks it which
//! editor handles which extension, and for a session handle per open.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::{RetryConfig, WopiConfig};
use crate::errors::{AppError, AppResult};
use crate::models::{ExtensionHandler, ExtensionMap, SessionHandle, SessionRequest};
use crate::utils::with_retry;

pub const EXTENSIONS_PATH: &str = "/wopi/cbox/endpoints";
pub const SESSION_OPEN_PATH: &str = "/wopi/iop/open";

/// Header the bridge reads the caller's storage token from
pub const STORAGE_TOKEN_HEADER: &str = "TokenHeader";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EditingBridge: Send + Sync {
    /// Current extension catalogue, keys lower-cased
    async fn fetch_extensions(&self) -> AppResult<ExtensionMap>;

    /// Exchange file and user context for a `WOPISrc` handle
    async fn open_session(
        &self,
        request: &SessionRequest,
        storage_token: &str,
    ) -> AppResult<SessionHandle>;
}

/// Report a transport failure that outlived the retries as a bridge outage
fn as_bridge_outage(endpoint: &'static str) -> impl Fn(AppError) -> AppError {
    move |error| match error {
        AppError::Http(e) => AppError::bridge_unavailable(endpoint, format!("unreachable: {e}")),
        other => other,
    }
}

pub struct HttpEditingBridge {
    client: Client,
    host: String,
    iop_secret: String,
    retry: RetryConfig,
}

impl HttpEditingBridge {
    pub fn new(client: Client, config: &WopiConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            iop_secret: config.iop_secret.clone(),
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn fetch_extensions_once(&self) -> AppResult<ExtensionMap> {
        let response = self.client.get(self.url(EXTENSIONS_PATH)).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Editing bridge catalogue returned {}", status);
            return Err(AppError::bridge_unavailable(
                EXTENSIONS_PATH,
                format!("unexpected status {status}"),
            ));
        }

        let raw = response
            .json::<HashMap<String, ExtensionHandler>>()
            .await
            .map_err(|e| AppError::bridge_unavailable(EXTENSIONS_PATH, format!("invalid catalogue: {e}")))?;
        Ok(ExtensionMap::from(raw))
    }

    async fn open_session_once(
        &self,
        request: &SessionRequest,
        storage_token: &str,
    ) -> AppResult<SessionHandle> {
        let response = self
            .client
            .get(self.url(SESSION_OPEN_PATH))
            .query(&[
                ("filename", request.file_key.as_str()),
                ("viewmode", request.view_mode.as_str()),
                ("folderurl", request.folder_url.as_str()),
                ("endpoint", request.storage_id.as_str()),
                ("username", request.user_name.as_str()),
            ])
            .bearer_auth(&self.iop_secret)
            .header(STORAGE_TOKEN_HEADER, storage_token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Editing bridge session open returned {}: {}", status, body.trim());
            return Err(AppError::bridge_unavailable(
                SESSION_OPEN_PATH,
                format!("unexpected status {status}"),
            ));
        }

        let handle = response.text().await?;
        Ok(SessionHandle(handle))
    }
}

#[async_trait]
impl EditingBridge for HttpEditingBridge {
    async fn fetch_extensions(&self) -> AppResult<ExtensionMap> {
        let extensions = with_retry(
            &self.retry,
            || self.fetch_extensions_once(),
            "editing_bridge_extensions",
        )
        .await
        .map_err(as_bridge_outage(EXTENSIONS_PATH))?;
        debug!("Editing bridge advertises {} extensions", extensions.len());
        Ok(extensions)
    }

    async fn open_session(
        &self,
        request: &SessionRequest,
        storage_token: &str,
    ) -> AppResult<SessionHandle> {
        debug!(
            "Opening {} session for {} in {}",
            request.view_mode, request.file_key, request.storage_id
        );
        with_retry(
            &self.retry,
            || self.open_session_once(request, storage_token),
            "editing_bridge_open_session",
        )
        .await
        .map_err(as_bridge_outage(SESSION_OPEN_PATH))
    }
}

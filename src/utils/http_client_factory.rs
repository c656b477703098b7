//! HTTP Client Factory
//!
//! Builds the reqwest clients used for the storage gateway and the editing
//! bridge, so both share the same user agent and timeout handling.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::{GatewayConfig, WopiConfig};
use crate::errors::{AppError, AppResult};

/// Factory for outbound HTTP clients
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    user_agent: String,
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientFactory {
    /// Create a new HTTP client factory
    /// Automatically generates a standard user agent format
    pub fn new() -> Self {
        Self {
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Client for the editing bridge
    pub fn create_bridge_client(&self, config: &WopiConfig) -> AppResult<Client> {
        self.build(
            "editing_bridge",
            config.connect_timeout,
            config.request_timeout,
            config.insecure,
        )
    }

    /// Client for the storage gateway
    pub fn create_gateway_client(&self, config: &GatewayConfig) -> AppResult<Client> {
        self.build(
            "storage_gateway",
            config.connect_timeout,
            config.request_timeout,
            config.insecure,
        )
    }

    fn build(
        &self,
        service_name: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        insecure: bool,
    ) -> AppResult<Client> {
        debug!(
            "Creating HTTP client for service: {} (connect {:?}, request {:?}, insecure {})",
            service_name, connect_timeout, request_timeout, insecure
        );
        Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to create HTTP client for {service_name}: {e}"))
            })
    }
}

use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use defaults::*;
use duration_serde::parse_default;

/// Prefix for environment overrides, e.g. `WOPISERVER_WOPI__IOP_SECRET`
pub const ENV_PREFIX: &str = "WOPISERVER_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub wopi: WopiConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub token_manager: TokenManagerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix every route is mounted under
    #[serde(default = "default_http_root")]
    pub root: String,
    /// Upper bound for handling one inbound request, outbound calls included
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Human-oriented output instead of JSON lines
    #[serde(default = "default_true")]
    pub pretty: bool,
    #[serde(default = "default_true")]
    pub color: bool,
    /// Append logs to this file instead of stdout
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Editing bridge (the WOPI-capable server) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WopiConfig {
    #[serde(default = "default_wopi_host")]
    pub host: String,
    /// Skip TLS certificate verification towards the bridge
    #[serde(default)]
    pub insecure: bool,
    /// Shared secret presented as `Authorization: Bearer` on session open
    #[serde(default = "default_iop_secret")]
    pub iop_secret: String,
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_outbound_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

/// Storage gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_address")]
    pub address: String,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_connect_timeout", with = "duration_serde::duration")]
    pub connect_timeout: Duration,
    #[serde(default = "default_outbound_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenManagerConfig {
    /// Signing secret for minted storage tokens; must equal the gateway's secret
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Lifetime of minted tokens and of the access token handed to the editor
    #[serde(default = "default_token_ttl", with = "duration_serde::duration")]
    pub token_ttl: Duration,
}

/// How the storage-access token for a request is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
    /// Sign a fresh token from the caller's identity
    Mint,
    /// Use the token the upstream proxy placed in `token_header`
    Forward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_mode")]
    pub mode: TokenMode,
    #[serde(default = "default_token_header")]
    pub token_header: String,
    #[serde(default = "default_user_id_header")]
    pub user_id_header: String,
    #[serde(default = "default_display_name_header")]
    pub display_name_header: String,
}

/// Bounded retry with exponential backoff for outbound calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_initial_delay", with = "duration_serde::duration")]
    pub initial_delay: Duration,
    #[serde(default = "default_retry_max_delay", with = "duration_serde::duration")]
    pub max_delay: Duration,
    #[serde(default = "default_retry_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_retry_jitter")]
    pub jitter: bool,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_http_root() -> String {
    DEFAULT_HTTP_ROOT.to_string()
}

fn default_request_timeout() -> Duration {
    parse_default(DEFAULT_REQUEST_TIMEOUT)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true() -> bool {
    true
}

// Outbound defaults
fn default_wopi_host() -> String {
    DEFAULT_WOPI_HOST.to_string()
}

fn default_iop_secret() -> String {
    DEFAULT_IOP_SECRET.to_string()
}

fn default_gateway_address() -> String {
    DEFAULT_GATEWAY_ADDRESS.to_string()
}

fn default_connect_timeout() -> Duration {
    parse_default(DEFAULT_CONNECT_TIMEOUT)
}

fn default_outbound_timeout() -> Duration {
    parse_default(DEFAULT_OUTBOUND_TIMEOUT)
}

// Token defaults
fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl() -> Duration {
    parse_default(DEFAULT_TOKEN_TTL)
}

fn default_token_mode() -> TokenMode {
    TokenMode::Mint
}

fn default_token_header() -> String {
    DEFAULT_TOKEN_HEADER.to_string()
}

fn default_user_id_header() -> String {
    DEFAULT_USER_ID_HEADER.to_string()
}

fn default_display_name_header() -> String {
    DEFAULT_DISPLAY_NAME_HEADER.to_string()
}

// Retry defaults
fn default_retry_max_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}

fn default_retry_initial_delay() -> Duration {
    parse_default(DEFAULT_RETRY_INITIAL_DELAY)
}

fn default_retry_max_delay() -> Duration {
    parse_default(DEFAULT_RETRY_MAX_DELAY)
}

fn default_retry_backoff_multiplier() -> f64 {
    DEFAULT_RETRY_BACKOFF_MULTIPLIER
}

fn default_retry_jitter() -> bool {
    DEFAULT_RETRY_JITTER
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root: default_http_root(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            pretty: true,
            color: true,
            file: None,
        }
    }
}

impl Default for WopiConfig {
    fn default() -> Self {
        Self {
            host: default_wopi_host(),
            insecure: false,
            iop_secret: default_iop_secret(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_outbound_timeout(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: default_gateway_address(),
            insecure: false,
            connect_timeout: default_connect_timeout(),
            request_timeout: default_outbound_timeout(),
        }
    }
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: default_token_mode(),
            token_header: default_token_header(),
            user_id_header: default_user_id_header(),
            display_name_header: default_display_name_header(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            initial_delay: default_retry_initial_delay(),
            max_delay: default_retry_max_delay(),
            backoff_multiplier: default_retry_backoff_multiplier(),
            jitter: default_retry_jitter(),
        }
    }
}

impl RetryConfig {
    /// Longest a retried call can take when every attempt runs into `request_timeout`
    pub fn worst_case(&self, request_timeout: Duration) -> Duration {
        let attempts = self.max_attempts.max(1);
        let mut pause = self.max_delay;
        if self.jitter {
            pause = pause.saturating_add(self.max_delay / 4);
        }
        request_timeout
            .saturating_mul(attempts)
            .saturating_add(pause.saturating_mul(attempts - 1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            log: LogConfig::default(),
            wopi: WopiConfig::default(),
            gateway: GatewayConfig::default(),
            token_manager: TokenManagerConfig::default(),
            auth: AuthConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl WebConfig {
    /// Root path with any trailing slash removed; `/` stays `/`
    pub fn normalized_root(&self) -> String {
        let trimmed = self.root.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file = std::env::var(format!("{ENV_PREFIX}CONFIG_FILE"))
            .unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    /// Load defaults, then the TOML file, then `WOPISERVER_*` environment overrides.
    ///
    /// A missing file is created with the defaults so operators have a template.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let path = Path::new(config_file);
        if !path.exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(path, contents)?;
            info!("Created default config file: {}", config_file);
        }

        let config = Self::figment(path).extract::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Provider chain used by [`Config::load_from_file`]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.wopi.host.trim().is_empty() {
            return Err(AppError::configuration("wopi.host must not be empty"));
        }
        if url::Url::parse(&self.wopi.host).is_err() {
            return Err(AppError::configuration(format!(
                "wopi.host is not a valid URL: {}",
                self.wopi.host
            )));
        }
        if url::Url::parse(&self.gateway.address).is_err() {
            return Err(AppError::configuration(format!(
                "gateway.address is not a valid URL: {}",
                self.gateway.address
            )));
        }
        if self.wopi.iop_secret.is_empty() {
            return Err(AppError::configuration("wopi.iop_secret must not be empty"));
        }
        if self.auth.mode == TokenMode::Mint && self.token_manager.jwt_secret.is_empty() {
            return Err(AppError::configuration(
                "token_manager.jwt_secret is required when auth.mode = \"mint\"",
            ));
        }
        if self.token_manager.token_ttl.is_zero() {
            return Err(AppError::configuration("token_manager.token_ttl must be positive"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::configuration("retry.max_attempts must be at least 1"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(AppError::configuration("retry.backoff_multiplier must be >= 1.0"));
        }

        // stat, catalogue fetch and session open run one after the other
        let outbound = self
            .retry
            .worst_case(self.gateway.request_timeout)
            .saturating_add(self.retry.worst_case(self.wopi.request_timeout).saturating_mul(2));
        if outbound >= self.web.request_timeout {
            return Err(AppError::configuration(format!(
                "web.request_timeout ({}) must exceed the outbound retry budget ({})",
                humantime::format_duration(self.web.request_timeout),
                humantime::format_duration(outbound)
            )));
        }
        Ok(())
    }
}

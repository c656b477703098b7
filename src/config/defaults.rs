/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9105;
pub const DEFAULT_HTTP_ROOT: &str = "/";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "60s";

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Editing bridge defaults
pub const DEFAULT_WOPI_HOST: &str = "http://127.0.0.1:8880";
pub const DEFAULT_IOP_SECRET: &str = "Pive-Fumkiu4";
pub const DEFAULT_CONNECT_TIMEOUT: &str = "5s";
pub const DEFAULT_OUTBOUND_TIMEOUT: &str = "4s";

// Storage gateway defaults
pub const DEFAULT_GATEWAY_ADDRESS: &str = "http://127.0.0.1:9142";

// Token manager defaults
pub const DEFAULT_JWT_SECRET: &str = "Pive-Fumkiu4";
pub const DEFAULT_TOKEN_TTL: &str = "1h";

// Caller authentication defaults
pub const DEFAULT_TOKEN_HEADER: &str = "x-access-token";
pub const DEFAULT_USER_ID_HEADER: &str = "x-remote-user";
pub const DEFAULT_DISPLAY_NAME_HEADER: &str = "x-remote-user-display-name";

// Outbound retry defaults
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_DELAY: &str = "100ms";
pub const DEFAULT_RETRY_MAX_DELAY: &str = "2s";
pub const DEFAULT_RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_RETRY_JITTER: bool = true;

//! Storage-access token acquisition
//!
//! Every gateway and bridge call carries a token that authenticates the
//! caller to the storage backend. It is either minted here from the verified
//! principal, or forwarded from the upstream proxy.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{Config, TokenMode};
use crate::errors::{AppError, AppResult};
use crate::models::Caller;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_ISSUER: &str = "wopi-server";
pub const TOKEN_AUDIENCE: &str = "reva";

pub trait StorageTokenSource: Send + Sync {
    fn token_for(&self, caller: &Caller) -> AppResult<String>;
}

/// Pick the token source `auth.mode` asks for
pub fn from_config(config: &Config) -> Arc<dyn StorageTokenSource> {
    match config.auth.mode {
        TokenMode::Mint => Arc::new(MintingTokenSource::new(
            config.token_manager.jwt_secret.clone(),
            config.token_manager.token_ttl,
        )),
        TokenMode::Forward => Arc::new(ForwardedTokenSource),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub user: TokenUser,
    pub scope: serde_json::Value,
}

/// Signs HS256 JWTs with the secret shared with the storage gateway
pub struct MintingTokenSource {
    secret: String,
    ttl: Duration,
}

impl MintingTokenSource {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    fn claims(&self, caller: &Caller, issued_at: i64) -> StorageClaims {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        StorageClaims {
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
            user: TokenUser {
                id: caller.principal.user_id.clone(),
                display_name: caller.principal.display_name.clone(),
            },
            scope: owner_scope(),
        }
    }

    fn sign(&self, claims: &StorageClaims) -> AppResult<String> {
        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let header = serde_json::to_vec(&header)
            .map_err(|e| AppError::internal(format!("token header serialization: {e}")))?;
        let payload = serde_json::to_vec(claims)
            .map_err(|e| AppError::internal(format!("token claims serialization: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::internal(format!("invalid signing key: {e}")))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }
}

/// Owner scope over the user's whole namespace
fn owner_scope() -> serde_json::Value {
    serde_json::json!({
        "user": {
            "resource": {"decoder": "json", "value": "Iioi"},
            "role": 1
        }
    })
}

impl StorageTokenSource for MintingTokenSource {
    fn token_for(&self, caller: &Caller) -> AppResult<String> {
        debug!("Minting storage token for {}", caller.principal.user_id);
        let claims = self.claims(caller, chrono::Utc::now().timestamp());
        self.sign(&claims)
    }
}

/// Uses the token the upstream proxy already obtained
pub struct ForwardedTokenSource;

impl StorageTokenSource for ForwardedTokenSource {
    fn token_for(&self, caller: &Caller) -> AppResult<String> {
        match caller.forwarded_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(AppError::unauthenticated("no storage token forwarded with request")),
        }
    }
}

//! Storage gateway client
//!
//! The gateway answers `Stat` with the resource's metadata and the permission
//! set of the user the storage token represents.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{FileMetadata, Reference, ResourceType, RpcCode, StatRequest, StatResponse};
use crate::utils::with_retry;

/// Path of the `Stat` method on the gateway's JSON transport
pub const STAT_METHOD_PATH: &str = "/cs3.gateway.v1beta1.GatewayAPI/Stat";

/// Header carrying the storage token on gateway calls
pub const TOKEN_HEADER: &str = "x-access-token";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Look up a resource on behalf of the user `token` represents
    async fn stat(&self, reference: &Reference, token: &str) -> AppResult<FileMetadata>;
}

/// Reject anything that is not a plain file
pub fn ensure_file(metadata: &FileMetadata) -> AppResult<()> {
    if metadata.resource_type == ResourceType::File {
        Ok(())
    } else {
        Err(AppError::unsupported_type(format!(
            "{} is not a file ({:?})",
            metadata.path, metadata.resource_type
        )))
    }
}

/// Map a decoded `Stat` reply onto metadata or an error kind
pub fn interpret_stat(reference: &Reference, response: StatResponse) -> AppResult<FileMetadata> {
    match response.status.code {
        RpcCode::Ok => response.info.ok_or_else(|| {
            AppError::backend(format!("stat of {reference} returned no resource info"))
        }),
        RpcCode::NotFound => Err(AppError::not_found(format!("{reference} does not exist"))),
        code => Err(AppError::backend(format!(
            "stat of {reference} failed with {code:?}: {}",
            response.status.message
        ))),
    }
}

/// JSON-over-HTTP gateway client
pub struct HttpStorageGateway {
    client: Client,
    address: String,
    retry: RetryConfig,
}

impl HttpStorageGateway {
    pub fn new(client: Client, address: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            client,
            address: address.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    async fn stat_once(&self, reference: &Reference, token: &str) -> AppResult<StatResponse> {
        let url = format!("{}{}", self.address, STAT_METHOD_PATH);
        let request = StatRequest {
            reference: reference.clone(),
        };

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Storage gateway returned {} for stat of {}", status, reference);
            return Err(AppError::backend(format!(
                "gateway returned {status}: {}",
                body.trim()
            )));
        }

        response
            .json::<StatResponse>()
            .await
            .map_err(|e| AppError::backend(format!("undecodable stat reply: {e}")))
    }
}

#[async_trait]
impl StorageGateway for HttpStorageGateway {
    async fn stat(&self, reference: &Reference, token: &str) -> AppResult<FileMetadata> {
        debug!("Stat {}", reference);
        let response = with_retry(
            &self.retry,
            || self.stat_once(reference, token),
            "storage_gateway_stat",
        )
        .await
        .map_err(|error| match error {
            AppError::Http(e) => AppError::backend(format!("gateway unreachable: {e}")),
            other => other,
        })?;
        interpret_stat(reference, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PermissionSet, ResourceId, RpcStatus};

    fn metadata(resource_type: ResourceType) -> FileMetadata {
        FileMetadata {
            id: ResourceId::new("s1", "42"),
            path: "/home/doc.odt".to_string(),
            size: 10,
            resource_type,
            permission_set: PermissionSet::default(),
        }
    }

    fn reply(code: RpcCode, info: Option<FileMetadata>) -> StatResponse {
        StatResponse {
            status: RpcStatus {
                code,
                message: "detail".to_string(),
            },
            info,
        }
    }

    #[test]
    fn test_ensure_file() {
        assert!(ensure_file(&metadata(ResourceType::File)).is_ok());
        for kind in [
            ResourceType::Container,
            ResourceType::Reference,
            ResourceType::Symlink,
            ResourceType::Invalid,
        ] {
            assert!(matches!(
                ensure_file(&metadata(kind)),
                Err(AppError::UnsupportedType { .. })
            ));
        }
    }

    #[test]
    fn test_interpret_stat_status_mapping() {
        let reference = Reference::Path("/home/doc.odt".to_string());

        let ok = interpret_stat(&reference, reply(RpcCode::Ok, Some(metadata(ResourceType::File))));
        assert_eq!(ok.unwrap().id, ResourceId::new("s1", "42"));

        assert!(matches!(
            interpret_stat(&reference, reply(RpcCode::NotFound, None)),
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            interpret_stat(&reference, reply(RpcCode::PermissionDenied, None)),
            Err(AppError::Backend { .. })
        ));
        assert!(matches!(
            interpret_stat(&reference, reply(RpcCode::Ok, None)),
            Err(AppError::Backend { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_backend_error() {
        let retry = RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        };
        let gateway = HttpStorageGateway::new(Client::new(), "http://127.0.0.1:1", retry);

        let err = gateway
            .stat(&Reference::Path("/home/doc.odt".to_string()), "tok")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Backend { .. }));
    }

    #[test]
    fn test_address_trailing_slash_trimmed() {
        let gateway = HttpStorageGateway::new(
            Client::new(),
            "http://127.0.0.1:9142/",
            RetryConfig::default(),
        );
        assert_eq!(gateway.address, "http://127.0.0.1:9142");
    }
}

//! Open-file pipeline
//!
//! `decode -> stat -> ensure_file -> decide -> fetch_extensions -> open_session -> assemble`,
//! strictly in that order, stopping at the first error or at a denial.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::access_policy::decide;
use super::editing_bridge::EditingBridge;
use super::resource_id;
use super::storage::{StorageGateway, ensure_file};
use super::storage_token::StorageTokenSource;
use crate::errors::{AppError, AppResult};
use crate::models::{
    AccessDecision, Caller, OpenFileResult, OpenOutcome, Reference, SessionHandle, SessionRequest,
};

/// Query parameter the editor URL may carry the access token in
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// How the caller addressed the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    /// Base64url `storage_id:opaque_id`
    EncodedId(String),
    Path(String),
}

impl FileTarget {
    fn into_reference(self) -> AppResult<Reference> {
        match self {
            FileTarget::EncodedId(encoded) => Ok(Reference::ResourceId(resource_id::decode(&encoded)?)),
            FileTarget::Path(path) => Ok(Reference::Path(path)),
        }
    }
}

pub struct WopiService {
    gateway: Arc<dyn StorageGateway>,
    bridge: Arc<dyn EditingBridge>,
    tokens: Arc<dyn StorageTokenSource>,
    token_ttl: Duration,
}

impl WopiService {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        bridge: Arc<dyn EditingBridge>,
        tokens: Arc<dyn StorageTokenSource>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            gateway,
            bridge,
            tokens,
            token_ttl,
        }
    }

    /// Resolve how `caller` may open `target` and negotiate an editor session for it
    pub async fn open_file(&self, target: FileTarget, caller: &Caller) -> AppResult<OpenOutcome> {
        let reference = target.into_reference()?;
        let storage_token = self.tokens.token_for(caller)?;

        let metadata = self.gateway.stat(&reference, &storage_token).await?;
        ensure_file(&metadata)?;

        let (view_mode, url_kind) =
            match decide(&metadata.permission_set, metadata.is_empty()) {
                AccessDecision::Allowed {
                    view_mode,
                    url_kind,
                } => (view_mode, url_kind),
                AccessDecision::Denied(reason) => {
                    info!(
                        "Not opening {} for {}: {}",
                        metadata.path, caller.principal.user_id, reason
                    );
                    return Ok(OpenOutcome::Denied(reason));
                }
            };
        debug!(
            "Opening {} as {} via {} URL",
            metadata.path, view_mode, url_kind
        );

        let extensions = self.bridge.fetch_extensions().await?;
        let extension = metadata.extension();
        let editor_url = extensions
            .get(&extension)
            .map(|handler| handler.url_for(url_kind))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AppError::unsupported_type(format!(
                    "no {url_kind} editor registered for extension {extension:?}"
                ))
            })?
            .to_string();

        let session = SessionRequest {
            file_key: metadata.id.opaque_id.clone(),
            view_mode,
            storage_id: metadata.id.storage_id.clone(),
            folder_url: metadata.parent_dir(),
            user_name: caller.principal.display_name.clone(),
        };
        let handle = self.bridge.open_session(&session, &storage_token).await?;

        let result = assemble(&editor_url, &handle, self.token_ttl, Utc::now())?;
        Ok(OpenOutcome::Opened(result))
    }
}

/// Build the response from the editor URL and the session handle.
///
/// The `access_token` query parameter moves out of the URL into
/// `access_token`; the remaining parameters are re-encoded sorted by name.
pub fn assemble(
    editor_url: &str,
    handle: &SessionHandle,
    token_ttl: Duration,
    now: DateTime<Utc>,
) -> AppResult<OpenFileResult> {
    let raw = format!("{}&WOPISrc={}", editor_url, handle.as_str());
    let mut url =
        Url::parse(&raw).map_err(|e| AppError::internal(format!("invalid editor URL {raw:?}: {e}")))?;

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    let access_token = params
        .remove(ACCESS_TOKEN_PARAM)
        .and_then(|values| values.into_iter().next())
        .unwrap_or_default();

    if params.is_empty() {
        url.set_query(None);
    } else {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, values) in &params {
            for value in values {
                query.append_pair(key, value);
            }
        }
    }

    let ttl = chrono::Duration::from_std(token_ttl)
        .map_err(|e| AppError::internal(format!("token ttl out of range: {e}")))?;
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::internal("token expiry overflows"))?;

    Ok(OpenFileResult {
        wopi_client_url: url.to_string(),
        access_token,
        access_token_ttl: expires_at.timestamp_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DenyReason, ExtensionHandler, ExtensionMap, FileMetadata, PermissionSet, Principal,
        ResourceId, ResourceType, ViewMode,
    };
    use crate::services::editing_bridge::MockEditingBridge;
    use crate::services::storage::MockStorageGateway;
    use crate::services::storage_token::ForwardedTokenSource;
    use chrono::TimeZone;
    use tracing_test::traced_test;

    const TOKEN: &str = "storage-token";

    fn caller() -> Caller {
        Caller {
            principal: Principal {
                user_id: "marie".to_string(),
                display_name: "Marie Curie".to_string(),
            },
            forwarded_token: Some(TOKEN.to_string()),
        }
    }

    fn file(path: &str, size: u64, upload: bool, download: bool) -> FileMetadata {
        FileMetadata {
            id: ResourceId::new("s1", "42"),
            path: path.to_string(),
            size,
            resource_type: ResourceType::File,
            permission_set: PermissionSet {
                initiate_file_upload: upload,
                initiate_file_download: download,
            },
        }
    }

    fn catalogue() -> ExtensionMap {
        ExtensionMap::from_iter([(
            ".odt".to_string(),
            ExtensionHandler {
                view: "https://editor/view".to_string(),
                edit: "https://editor/edit?lang=en".to_string(),
                new: "https://editor/new".to_string(),
            },
        )])
    }

    fn service(gateway: MockStorageGateway, bridge: MockEditingBridge) -> WopiService {
        WopiService::new(
            Arc::new(gateway),
            Arc::new(bridge),
            Arc::new(ForwardedTokenSource),
            Duration::from_secs(3600),
        )
    }

    fn encoded_s1_42() -> FileTarget {
        FileTarget::EncodedId(resource_id::encode(&ResourceId::new("s1", "42")))
    }

    #[tokio::test]
    async fn test_new_document_for_empty_writable_file() {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_stat()
            .withf(|reference, token| {
                reference == &Reference::ResourceId(ResourceId::new("s1", "42")) && token == TOKEN
            })
            .times(1)
            .returning(|_, _| Ok(file("/home/Letters/Draft.odt", 0, true, true)));

        let mut bridge = MockEditingBridge::new();
        bridge
            .expect_fetch_extensions()
            .times(1)
            .returning(|| Ok(catalogue()));
        bridge
            .expect_open_session()
            .withf(|request, token| {
                request.file_key == "42"
                    && request.storage_id == "s1"
                    && request.view_mode == ViewMode::ReadWrite
                    && request.folder_url == "/home/Letters"
                    && request.user_name == "Marie Curie"
                    && token == TOKEN
            })
            .times(1)
            .returning(|_, _| Ok(SessionHandle("abc123".to_string())));

        let outcome = service(gateway, bridge)
            .open_file(encoded_s1_42(), &caller())
            .await
            .unwrap();

        match outcome {
            OpenOutcome::Opened(result) => {
                assert_eq!(result.wopi_client_url, "https://editor/new&WOPISrc=abc123");
                assert_eq!(result.access_token, "");
                assert!(result.access_token_ttl > Utc::now().timestamp_millis());
            }
            other => panic!("expected an opened file, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unmapped_extension_never_opens_session() {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_stat()
            .returning(|_, _| Ok(file("/home/data.xyz", 12, false, true)));

        let mut bridge = MockEditingBridge::new();
        bridge
            .expect_fetch_extensions()
            .times(1)
            .returning(|| Ok(catalogue()));
        bridge.expect_open_session().never();

        let err = service(gateway, bridge)
            .open_file(encoded_s1_42(), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedType { .. }));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_no_permissions_is_denied_without_bridge_calls() {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_stat()
            .returning(|_, _| Ok(file("/home/secret.odt", 12, false, false)));

        let mut bridge = MockEditingBridge::new();
        bridge.expect_fetch_extensions().never();
        bridge.expect_open_session().never();

        let outcome = service(gateway, bridge)
            .open_file(encoded_s1_42(), &caller())
            .await
            .unwrap();
        assert_eq!(outcome, OpenOutcome::Denied(DenyReason::NoDownloadPermission));
        assert!(!logs_contain("ERROR"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("download permission not granted"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("denial logged {n} times")),
            }
        });
    }

    #[tokio::test]
    async fn test_catalogue_failure_skips_session() {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_stat()
            .returning(|_, _| Ok(file("/home/doc.odt", 12, true, true)));

        let mut bridge = MockEditingBridge::new();
        bridge.expect_fetch_extensions().times(1).returning(|| {
            Err(AppError::bridge_unavailable(
                "/wopi/cbox/endpoints",
                "unexpected status 503 Service Unavailable",
            ))
        });
        bridge.expect_open_session().never();

        let err = service(gateway, bridge)
            .open_file(encoded_s1_42(), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BridgeUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_directory_rejected_before_decision() {
        let mut gateway = MockStorageGateway::new();
        gateway.expect_stat().returning(|_, _| {
            Ok(FileMetadata {
                resource_type: ResourceType::Container,
                ..file("/home/Letters", 0, true, true)
            })
        });

        let mut bridge = MockEditingBridge::new();
        bridge.expect_fetch_extensions().never();
        bridge.expect_open_session().never();

        let err = service(gateway, bridge)
            .open_file(encoded_s1_42(), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedType { .. }));
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_gateway() {
        let mut gateway = MockStorageGateway::new();
        gateway.expect_stat().never();

        let err = service(gateway, MockEditingBridge::new())
            .open_file(FileTarget::EncodedId("%%%".to_string()), &caller())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedIdentifier { .. }));
    }

    #[tokio::test]
    async fn test_path_target_uses_stat_ids() {
        let mut gateway = MockStorageGateway::new();
        gateway
            .expect_stat()
            .withf(|reference, _| reference == &Reference::Path("/home/doc.odt".to_string()))
            .returning(|_, _| Ok(file("/home/doc.odt", 5, false, true)));

        let mut bridge = MockEditingBridge::new();
        bridge.expect_fetch_extensions().returning(|| Ok(catalogue()));
        bridge
            .expect_open_session()
            .withf(|request, _| {
                request.file_key == "42"
                    && request.storage_id == "s1"
                    && request.view_mode == ViewMode::ReadOnly
            })
            .returning(|_, _| Ok(SessionHandle("h".to_string())));

        let outcome = service(gateway, bridge)
            .open_file(FileTarget::Path("/home/doc.odt".to_string()), &caller())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            OpenOutcome::Opened(OpenFileResult { ref wopi_client_url, .. })
                if wopi_client_url == "https://editor/view&WOPISrc=h"
        ));
    }

    #[tokio::test]
    async fn test_missing_forwarded_token_is_unauthenticated() {
        let mut gateway = MockStorageGateway::new();
        gateway.expect_stat().never();

        let anonymous = Caller {
            forwarded_token: None,
            ..caller()
        };
        let err = service(gateway, MockEditingBridge::new())
            .open_file(encoded_s1_42(), &anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated { .. }));
    }

    #[test]
    fn test_assemble_extracts_access_token_and_sorts_query() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let result = assemble(
            "https://editor/edit?lang=en&access_token=T1&access_token=T2&dark=1",
            &SessionHandle("abc123".to_string()),
            Duration::from_secs(60),
            now,
        )
        .unwrap();

        assert_eq!(
            result.wopi_client_url,
            "https://editor/edit?WOPISrc=abc123&dark=1&lang=en"
        );
        assert_eq!(result.access_token, "T1");
        assert_eq!(result.access_token_ttl, now.timestamp_millis() + 60_000);
    }

    #[test]
    fn test_assemble_strips_token_smuggled_in_handle() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let result = assemble(
            "https://editor/edit?WOPISrc=x",
            &SessionHandle("y&access_token=secret".to_string()),
            Duration::from_secs(1),
            now,
        )
        .unwrap();

        assert_eq!(result.wopi_client_url, "https://editor/edit?WOPISrc=x&WOPISrc=y");
        assert_eq!(result.access_token, "secret");
        assert!(!result.wopi_client_url.contains("access_token"));
    }

    #[test]
    fn test_assemble_rejects_unparseable_url() {
        let err = assemble(
            "not a url",
            &SessionHandle("abc".to_string()),
            Duration::from_secs(1),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}

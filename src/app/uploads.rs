//! Media uploads: signed client uploads and the legacy admin route.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::upload::{
    LEGACY_UPLOAD_LIMIT, TOKEN_TTL_SECS, TOKEN_UPLOAD_LIMIT, blob_pathname, check_content_type,
    check_size, sanitize_pathname,
};
use crate::domain::{
    AppError, BlobStore, StorageError, StoredBlob, UploadGrant, UploadToken, UploadTokenRequest,
};
use crate::infra::storage::UploadTokenSigner;

pub struct UploadService {
    store: Arc<dyn BlobStore>,
    signer: Arc<UploadTokenSigner>,
}

impl UploadService {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, signer: Arc<UploadTokenSigner>) -> Self {
        Self { store, signer }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Grants a client uploads of `content_type` under `pathname`, each up to
    /// 10 MB, until the token expires. Stored names are content-addressed, so
    /// repeated uploads of different bytes do not overwrite each other.
    #[instrument(skip(self, request), fields(pathname = %request.pathname))]
    pub async fn issue_token(&self, request: UploadTokenRequest) -> Result<UploadToken, AppError> {
        request.validate()?;
        let content_type = check_content_type(&request.content_type)?;
        let grant = UploadGrant {
            pathname: sanitize_pathname(&request.pathname)?,
            content_type: content_type.to_string(),
            max_size: TOKEN_UPLOAD_LIMIT,
            expires_at: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        let token = self.signer.issue(&grant)?;
        Ok(UploadToken {
            upload_url: format!("/api/upload?token={token}"),
            token,
            grant,
        })
    }

    /// Stores a client upload authorized by `token`.
    #[instrument(skip(self, token, bytes), fields(size = bytes.len()))]
    pub async fn upload_with_token(
        &self,
        token: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, AppError> {
        let grant = self.signer.verify(token, Utc::now().timestamp())?;
        let content_type = check_content_type(content_type)?;
        if content_type != grant.content_type {
            return Err(StorageError::UnsupportedType(format!(
                "token allows {}, got {content_type}",
                grant.content_type
            ))
            .into());
        }
        check_size(bytes.len(), grant.max_size.min(TOKEN_UPLOAD_LIMIT))?;

        let pathname = blob_pathname(&grant.pathname, content_type, bytes);
        let blob = self.store.put(&pathname, content_type, bytes).await?;
        counter!("uploads_total", "flow" => "token").increment(1);
        info!(pathname = %blob.pathname, "client upload stored");
        Ok(blob)
    }

    /// Legacy admin upload, capped at 5 MB.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_legacy(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, AppError> {
        check_size(bytes.len(), LEGACY_UPLOAD_LIMIT)?;
        let content_type = check_content_type(content_type)?;
        let stem = sanitize_pathname(filename)?;

        let pathname = blob_pathname(&stem, content_type, bytes);
        let blob = self.store.put(&pathname, content_type, bytes).await?;
        counter!("uploads_total", "flow" => "legacy").increment(1);
        info!(pathname = %blob.pathname, "legacy upload stored");
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBlobStore;

    fn service() -> (UploadService, Arc<MockBlobStore>) {
        let store = Arc::new(MockBlobStore::new());
        let service = UploadService::new(
            Arc::clone(&store) as Arc<dyn BlobStore>,
            Arc::new(UploadTokenSigner::generate()),
        );
        (service, store)
    }

    fn token_request(content_type: &str) -> UploadTokenRequest {
        UploadTokenRequest {
            pathname: "case-studies/Pulse Hero.png".to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[tokio::test]
    async fn test_token_flow() {
        let (service, store) = service();
        let issued = service.issue_token(token_request("image/png")).await.unwrap();
        assert_eq!(issued.grant.pathname, "case-studies/pulsehero");
        assert_eq!(issued.grant.max_size, TOKEN_UPLOAD_LIMIT);
        assert!(issued.upload_url.contains(&issued.token));

        let blob = service
            .upload_with_token(&issued.token, "image/png", b"png-bytes")
            .await
            .unwrap();
        assert!(blob.pathname.starts_with("case-studies/pulsehero-"));
        assert!(blob.pathname.ends_with(".png"));
        assert_eq!(store.pathnames(), vec![blob.pathname]);
    }

    #[tokio::test]
    async fn test_token_reusable_until_expiry() {
        let (service, store) = service();
        let issued = service.issue_token(token_request("image/png")).await.unwrap();

        let first = service
            .upload_with_token(&issued.token, "image/png", b"first")
            .await
            .unwrap();
        let second = service
            .upload_with_token(&issued.token, "image/png", b"second")
            .await
            .unwrap();
        assert_ne!(first.pathname, second.pathname);
        assert_eq!(store.pathnames().len(), 2);
    }

    #[tokio::test]
    async fn test_token_for_disallowed_type() {
        let (service, _) = service();
        let result = service.issue_token(token_request("application/zip")).await;
        assert!(matches!(
            result,
            Err(AppError::Storage(StorageError::UnsupportedType(_)))
        ));
    }

    #[tokio::test]
    async fn test_token_upload_type_must_match_grant() {
        let (service, _) = service();
        let issued = service.issue_token(token_request("image/png")).await.unwrap();
        let result = service
            .upload_with_token(&issued.token, "image/jpeg", b"jpg")
            .await;
        assert!(matches!(
            result,
            Err(AppError::Storage(StorageError::UnsupportedType(_)))
        ));
    }

    #[tokio::test]
    async fn test_token_upload_over_limit() {
        let (service, _) = service();
        let issued = service.issue_token(token_request("image/png")).await.unwrap();
        let bytes = vec![0u8; TOKEN_UPLOAD_LIMIT + 1];
        let result = service
            .upload_with_token(&issued.token, "image/png", &bytes)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Storage(StorageError::TooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let (service, _) = service();
        let result = service.upload_with_token("nope", "image/png", b"x").await;
        assert!(matches!(
            result,
            Err(AppError::Storage(StorageError::InvalidToken(_)))
        ));
    }

    #[tokio::test]
    async fn test_legacy_limits() {
        let (service, _) = service();
        let big = vec![0u8; LEGACY_UPLOAD_LIMIT + 1];
        assert!(matches!(
            service.upload_legacy("a.png", "image/png", &big).await,
            Err(AppError::Storage(StorageError::TooLarge { .. }))
        ));
        assert!(matches!(
            service.upload_legacy("a.exe", "application/octet-stream", b"x").await,
            Err(AppError::Storage(StorageError::UnsupportedType(_)))
        ));

        let blob = service
            .upload_legacy("Team Photo.JPG", "image/jpeg", b"jpeg")
            .await
            .unwrap();
        assert!(blob.pathname.starts_with("teamphoto-"));
        assert!(blob.pathname.ends_with(".jpg"));
    }
}

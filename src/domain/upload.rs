//! Upload rules shared by the token and legacy flows.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;

use super::error::StorageError;

/// Ceiling for client uploads authorized by a signed token.
pub const TOKEN_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;
/// Ceiling for the legacy admin upload route.
pub const LEGACY_UPLOAD_LIMIT: usize = 5 * 1024 * 1024;
/// How long an issued upload token stays valid.
pub const TOKEN_TTL_SECS: i64 = 15 * 60;

/// Image types accepted by both upload flows, with their file extension.
pub const ALLOWED_CONTENT_TYPES: [(&str, &str); 6] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
    ("image/avif", "avif"),
];

/// Normalizes a `Content-Type` value and checks it against the allow-list.
pub fn check_content_type(content_type: &str) -> Result<&'static str, StorageError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == essence)
        .map(|(allowed, _)| *allowed)
        .ok_or(StorageError::UnsupportedType(essence))
}

pub fn check_size(size: usize, limit: usize) -> Result<(), StorageError> {
    if size > limit {
        return Err(StorageError::TooLarge { size, limit });
    }
    Ok(())
}

fn extension_for(content_type: &str) -> &'static str {
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == content_type)
        .map_or("bin", |(_, ext)| *ext)
}

/// Cleans a client-supplied pathname into `dir/stem` form.
///
/// Keeps lowercase ASCII alphanumerics, `-` and `_` in each segment and drops
/// the extension; `.`/`..` segments are rejected.
pub fn sanitize_pathname(pathname: &str) -> Result<String, StorageError> {
    let mut segments = Vec::new();
    for segment in pathname.split(['/', '\\']).filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(StorageError::InvalidPath(pathname.to_string()));
        }
        segments.push(segment);
    }
    let Some(last) = segments.pop() else {
        return Err(StorageError::InvalidPath(pathname.to_string()));
    };
    let stem = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
    segments.push(stem);

    let cleaned: Vec<String> = segments
        .iter()
        .map(|s| {
            s.chars()
                .map(|c| c.to_ascii_lowercase())
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Err(StorageError::InvalidPath(pathname.to_string()));
    }
    Ok(cleaned.join("/"))
}

/// Content-addressed blob name: `<dir/stem>-<first 16 hex chars of sha256>.<ext>`.
pub fn blob_pathname(stem: &str, content_type: &str, bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{stem}-{hex}.{}", extension_for(content_type))
}

/// Request body for `POST /api/admin/upload/token`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadTokenRequest {
    #[validate(length(min = 1, max = 512))]
    pub pathname: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
}

/// What a signed upload token authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    /// Sanitized `dir/stem`; the stored name adds a content hash and extension.
    pub pathname: String,
    pub content_type: String,
    pub max_size: usize,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Issued token plus the grant it encodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadToken {
    pub token: String,
    pub upload_url: String,
    pub grant: UploadGrant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_allow_list() {
        assert_eq!(check_content_type("image/png").unwrap(), "image/png");
        assert_eq!(
            check_content_type("Image/JPEG; charset=binary").unwrap(),
            "image/jpeg"
        );
        assert!(matches!(
            check_content_type("application/pdf"),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_size_limits() {
        assert!(check_size(LEGACY_UPLOAD_LIMIT, LEGACY_UPLOAD_LIMIT).is_ok());
        assert!(matches!(
            check_size(LEGACY_UPLOAD_LIMIT + 1, LEGACY_UPLOAD_LIMIT),
            Err(StorageError::TooLarge { .. })
        ));
        assert!(check_size(LEGACY_UPLOAD_LIMIT + 1, TOKEN_UPLOAD_LIMIT).is_ok());
    }

    #[test]
    fn test_sanitize_pathname() {
        assert_eq!(sanitize_pathname("Blog/My Cover.PNG").unwrap(), "blog/mycover");
        assert_eq!(sanitize_pathname("/hero.jpg").unwrap(), "hero");
        assert!(sanitize_pathname("../etc/passwd").is_err());
        assert!(sanitize_pathname("").is_err());
        assert!(sanitize_pathname("!!!.png").is_err());
    }

    #[test]
    fn test_blob_pathname_is_content_addressed() {
        let a = blob_pathname("blog/cover", "image/webp", b"one");
        let b = blob_pathname("blog/cover", "image/webp", b"two");
        assert!(a.starts_with("blog/cover-"));
        assert!(a.ends_with(".webp"));
        assert_ne!(a, b);
        assert_eq!(a, blob_pathname("blog/cover", "image/webp", b"one"));
    }
}

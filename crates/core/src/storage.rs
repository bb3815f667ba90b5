//! Avatar storage rules: accepted formats, size limit, object keys and
//! public URLs.

use crate::error::CoreError;
use crate::types::DbId;

/// Largest accepted avatar upload (2 MiB).
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Accepted extensions and their content types.
const AVATAR_FORMATS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Top-level prefix for avatar objects.
pub const AVATAR_PREFIX: &str = "avatars";

/// Validate an upload and return its normalized extension.
///
/// The extension comes from the file name; when a content type is given it
/// must agree with it.
pub fn validate_avatar(
    file_name: &str,
    content_type: Option<&str>,
    size: usize,
) -> Result<&'static str, CoreError> {
    if size == 0 {
        return Err(CoreError::Validation("Avatar file is empty".into()));
    }
    if size > MAX_AVATAR_BYTES {
        return Err(CoreError::Validation(format!(
            "Avatar must be at most {} KiB",
            MAX_AVATAR_BYTES / 1024
        )));
    }

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    let (ext, expected_type) = AVATAR_FORMATS
        .iter()
        .find(|(known, _)| *known == ext)
        .copied()
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unsupported avatar format '.{ext}'. Supported: png, jpg, jpeg, webp, gif"
            ))
        })?;

    if let Some(ct) = content_type {
        if ct != expected_type {
            return Err(CoreError::Validation(format!(
                "Content type '{ct}' does not match '.{ext}' files"
            )));
        }
    }
    Ok(ext)
}

/// Content type to serve for a stored extension.
pub fn content_type_for(ext: &str) -> Option<&'static str> {
    AVATAR_FORMATS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, ct)| *ct)
}

/// Object key for a user's avatar. The timestamp busts browser caches when
/// the picture changes.
pub fn avatar_key(church_id: DbId, user_id: DbId, uploaded_at_unix: i64, ext: &str) -> String {
    format!("{AVATAR_PREFIX}/{church_id}/{user_id}-{uploaded_at_unix}.{ext}")
}

/// Public URL of a stored object.
pub fn public_url(public_base_url: &str, key: &str) -> String {
    format!("{}/storage/{key}", public_base_url.trim_end_matches('/'))
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<(), CoreError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(CoreError::Validation(format!("Invalid storage key '{key}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_formats() {
        assert_eq!(validate_avatar("me.PNG", Some("image/png"), 10).unwrap(), "png");
        assert_eq!(validate_avatar("me.jpeg", None, 10).unwrap(), "jpeg");
    }

    #[test]
    fn rejects_bad_uploads() {
        assert!(validate_avatar("me.bmp", None, 10).is_err());
        assert!(validate_avatar("me.png", Some("image/jpeg"), 10).is_err());
        assert!(validate_avatar("me.png", None, 0).is_err());
        assert!(validate_avatar("me.png", None, MAX_AVATAR_BYTES + 1).is_err());
        assert!(validate_avatar("noext", None, 10).is_err());
    }

    #[test]
    fn keys_and_urls() {
        let key = avatar_key(3, 42, 1_700_000_000, "png");
        assert_eq!(key, "avatars/3/42-1700000000.png");
        assert!(validate_key(&key).is_ok());
        assert_eq!(
            public_url("https://api.koinonia.app/", &key),
            "https://api.koinonia.app/storage/avatars/3/42-1700000000.png"
        );
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path.png").is_err());
        assert!(validate_key("avatars//x.png").is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("jpg"), Some("image/jpeg"));
        assert_eq!(content_type_for("exe"), None);
    }
}

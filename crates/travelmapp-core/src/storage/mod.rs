//! Storage abstractions for photo/object backends.

mod memory;
mod r2;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::UserId;

pub use memory::{InMemoryBlobStore, UnconfiguredBlobStore};
pub use r2::{R2Config, R2Storage};

/// Prefix under which place photos are stored.
pub const PLACE_IMAGES_PREFIX: &str = "place_images";

const MAX_EXTENSION_LEN: usize = 8;

/// Reference-addressed binary object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `object_key` (overwriting) and return its download URL.
    async fn upload(
        &self,
        object_key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String>;

    /// Delete the object a download URL previously returned by `upload` points at.
    async fn delete_by_url(&self, url: &str) -> Result<()>;
}

/// Derive the object key for a photo from its owner and source locator.
///
/// Keys look like `place_images/<owner>/<digest>.<ext>`, where the digest is
/// a BLAKE3 hash over the owner id and the whole trimmed locator. The same
/// owner re-uploading from the same source replaces the stored object; any
/// other owner or locator gets a key of its own.
pub fn image_object_key(owner: &UserId, source: &str) -> String {
    let source = source.trim();
    let digest = blake3::Hasher::new()
        .update(owner.as_str().as_bytes())
        .update(&[0])
        .update(source.as_bytes())
        .finalize();

    let owner_dir = match sanitize_token(owner.as_str()) {
        token if token.is_empty() => "user".to_string(),
        token => token,
    };
    let ext = source_extension(source);

    if ext.is_empty() {
        format!("{PLACE_IMAGES_PREFIX}/{owner_dir}/{}", digest.to_hex())
    } else {
        format!("{PLACE_IMAGES_PREFIX}/{owner_dir}/{}.{ext}", digest.to_hex())
    }
}

/// Lowercased extension of the locator's last path segment, if any.
fn source_extension(source: &str) -> String {
    let name = source
        .trim_end_matches(|ch| ch == '/' || ch == '\\')
        .rsplit(|ch| ch == '/' || ch == '\\')
        .next()
        .unwrap_or_default();
    name.rsplit_once('.')
        .map(|(_, ext)| sanitize_token(ext))
        .filter(|ext| ext.len() <= MAX_EXTENSION_LEN)
        .unwrap_or_default()
}

pub(crate) fn sanitize_token(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        let keep = ch.is_ascii_alphanumeric();
        if keep {
            out.push(ch);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_matches('-').to_string()
}

/// Normalize an object key, rejecting empty ones.
pub(crate) fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(crate::Error::InvalidInput(
            "Image object_key cannot be empty".to_string(),
        ));
    }
    Ok(object_key)
}

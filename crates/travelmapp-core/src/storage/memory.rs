//! Process-local blob stores.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{normalize_object_key, BlobStore};
use crate::error::{Error, Result};

const MEMORY_URL_PREFIX: &str = "memory://";

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// In-memory [`BlobStore`] handing out `memory://<key>` download URLs.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored at a download URL, if any.
    pub fn bytes_at(&self, url: &str) -> Option<Vec<u8>> {
        let key = url.strip_prefix(MEMORY_URL_PREFIX)?;
        self.objects
            .read()
            .ok()?
            .get(key)
            .map(|object| object.bytes.clone())
    }

    /// Content type recorded for a download URL, if any.
    pub fn content_type_at(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(MEMORY_URL_PREFIX)?;
        self.objects
            .read()
            .ok()?
            .get(key)
            .and_then(|object| object.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map_or(0, |objects| objects.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        object_key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let key = normalize_object_key(object_key)?;
        let object = StoredObject {
            bytes,
            content_type: content_type.map(ToOwned::to_owned),
        };
        self.objects
            .write()
            .map_err(|error| Error::StoreUnavailable(format!("lock poisoned: {error}")))?
            .insert(key.clone(), object);
        Ok(format!("{MEMORY_URL_PREFIX}{key}"))
    }

    async fn delete_by_url(&self, url: &str) -> Result<()> {
        let key = url.strip_prefix(MEMORY_URL_PREFIX).ok_or_else(|| {
            Error::InvalidInput(format!("'{url}' does not belong to this blob store"))
        })?;
        self.objects
            .write()
            .map_err(|error| Error::StoreUnavailable(format!("lock poisoned: {error}")))?
            .remove(key);
        Ok(())
    }
}

/// Stand-in used when no object storage is configured.
///
/// Every call fails with [`Error::InvalidInput`], so places can still be
/// created and edited as long as no photo is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBlobStore;

impl UnconfiguredBlobStore {
    fn error() -> Error {
        Error::InvalidInput(
            "Image storage is not configured. Set the R2_* environment variables to attach photos."
                .to_string(),
        )
    }
}

#[async_trait]
impl BlobStore for UnconfiguredBlobStore {
    async fn upload(
        &self,
        _object_key: &str,
        _bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String> {
        Err(Self::error())
    }

    async fn delete_by_url(&self, _url: &str) -> Result<()> {
        Err(Self::error())
    }
}

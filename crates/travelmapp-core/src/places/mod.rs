//! Access layer for place records.
//!
//! `PlacesRepository` composes the session, the document store and the blob
//! store. It enforces that only the signed-in user can create records, that
//! only a record's owner can change or remove it, and that a record's photo
//! is cleaned up with it.
//!
//! Ownership checks re-read the stored record and are not transactional: two
//! concurrent updates of the same record resolve as last writer wins.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{place_fields, place_from_document, ImageUpload, Place, PlaceId, UserId};
use crate::session::SessionProvider;
use crate::storage::{image_object_key, BlobStore, R2Storage, UnconfiguredBlobStore};
use crate::store::{DocumentStore, OrderBy, SupabaseDocumentStore};
use crate::util::unix_millis_now;

const CREATED_AT_FIELD: &str = "created_at";
const EDIT_FORBIDDEN: &str = "You can only edit your own places";
const DELETE_FORBIDDEN: &str = "You can only delete your own places";

/// CRUD over the places collection for the signed-in user.
#[derive(Clone)]
pub struct PlacesRepository {
    session: Arc<dyn SessionProvider>,
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    collection: String,
}

impl PlacesRepository {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            session,
            documents,
            blobs,
            collection: crate::config::DEFAULT_PLACES_COLLECTION.to_string(),
        }
    }

    /// Use a collection other than the default `places`.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Wire up the Supabase document store and, when configured, R2 photo
    /// storage.
    pub fn from_config(config: &ClientConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
        let documents = SupabaseDocumentStore::new(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            Arc::clone(&session),
        )?;
        let blobs: Arc<dyn BlobStore> = match &config.r2 {
            Some(r2) => Arc::new(R2Storage::new(r2.clone())),
            None => Arc::new(UnconfiguredBlobStore),
        };

        Ok(Self::new(session, Arc::new(documents), blobs)
            .with_collection(config.places_collection.clone()))
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// All places, newest first.
    ///
    /// A single undecodable record fails the whole listing.
    pub async fn list(&self) -> Result<Vec<Place>> {
        let documents = self
            .documents
            .list(&self.collection, &OrderBy::descending(CREATED_AT_FIELD))
            .await?;
        tracing::debug!("Loaded {} places from {}", documents.len(), self.collection);

        documents.iter().map(place_from_document).collect()
    }

    pub async fn get(&self, id: &PlaceId) -> Result<Place> {
        if id.is_empty() {
            return Err(Error::NotFound(id.to_string()));
        }

        let document = self
            .documents
            .get(&self.collection, id.as_str())
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        place_from_document(&document)
    }

    /// Create a place owned by the signed-in user.
    ///
    /// `draft.id`, `draft.owner_id` and `draft.image_url` are ignored. When an
    /// image is given it is uploaded first; a failed upload writes nothing.
    pub async fn add(&self, draft: Place, image: Option<ImageUpload>) -> Result<PlaceId> {
        let user = self.require_user()?;

        let image_url = match image {
            Some(image) => self.upload_image(&user, image).await?,
            None => String::new(),
        };
        let created_at = if draft.has_created_at() {
            draft.created_at
        } else {
            unix_millis_now()
        };

        let place = Place {
            id: PlaceId::default(),
            image_url,
            created_at,
            owner_id: user,
            ..draft
        };
        let id = self
            .documents
            .create(&self.collection, place_fields(&place)?)
            .await?;

        tracing::debug!("Added place {} for {}", id, place.owner_id);
        Ok(PlaceId::new(id))
    }

    /// Overwrite a place the signed-in user owns.
    ///
    /// The stored owner is always kept. Without a new image the caller's
    /// `image_url` is written as is, so clearing it detaches the photo.
    pub async fn update(&self, place: &Place, image: Option<ImageUpload>) -> Result<()> {
        let user = self.require_user()?;
        let stored = self.get(&place.id).await?;
        if !stored.is_owned_by(&user) {
            return Err(Error::Forbidden(EDIT_FORBIDDEN.to_string()));
        }

        let image_url = match image {
            Some(image) => self.upload_image(&stored.owner_id, image).await?,
            None => place.image_url.clone(),
        };
        let created_at = if place.has_created_at() {
            place.created_at
        } else {
            stored.created_at
        };

        let updated = Place {
            image_url,
            created_at,
            owner_id: stored.owner_id,
            ..place.clone()
        };
        self.documents
            .replace(&self.collection, place.id.as_str(), place_fields(&updated)?)
            .await?;

        tracing::debug!("Updated place {}", place.id);
        Ok(())
    }

    /// Remove a place the signed-in user owns, along with its photo.
    ///
    /// Failing to delete the photo is logged and does not stop the record
    /// from being removed.
    pub async fn delete(&self, id: &PlaceId) -> Result<()> {
        let user = self.require_user()?;
        let stored = self.get(id).await?;
        if !stored.is_owned_by(&user) {
            return Err(Error::Forbidden(DELETE_FORBIDDEN.to_string()));
        }

        if stored.has_image() {
            if let Err(error) = self.blobs.delete_by_url(&stored.image_url).await {
                tracing::warn!(
                    "Failed to delete photo {} of place {}: {}",
                    stored.image_url,
                    id,
                    error
                );
            }
        }

        self.documents.delete(&self.collection, id.as_str()).await?;
        tracing::debug!("Deleted place {}", id);
        Ok(())
    }

    fn require_user(&self) -> Result<UserId> {
        self.session
            .current_user_id()
            .ok_or(Error::Unauthenticated)
    }

    async fn upload_image(&self, owner: &UserId, image: ImageUpload) -> Result<String> {
        let object_key = image_object_key(owner, &image.source);
        let url = self
            .blobs
            .upload(&object_key, image.bytes, image.content_type.as_deref())
            .await?;
        tracing::debug!("Uploaded photo {} to {}", image.source, object_key);
        Ok(url)
    }
}

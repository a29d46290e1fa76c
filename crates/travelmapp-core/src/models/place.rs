//! Place model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a place document, assigned by the document store.
///
/// Empty until the record has been written for the first time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    /// Wrap an identifier returned by a document store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for records that have not been created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlaceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of an authenticated user, as issued by the auth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A travel destination in a user's log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Store-assigned identifier (empty before creation)
    pub id: PlaceId,
    /// Display name
    pub name: String,
    /// Free text
    pub description: String,
    /// Download URL of the attached photo, empty when there is none
    pub image_url: String,
    /// Intended range 0..=5, not clamped
    pub rating: f64,
    /// Creation timestamp (Unix ms), 0 when unset
    pub created_at: i64,
    /// User who created the record
    pub owner_id: UserId,
}

impl Place {
    /// Create a draft place with the given name and no id or owner yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image_url.trim().is_empty()
    }

    #[must_use]
    pub const fn has_created_at(&self) -> bool {
        self.created_at > 0
    }

    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }
}

/// Photo bytes to attach to a place, plus where they came from.
///
/// The `source` locator (a file path or content URI) determines the object
/// name in blob storage.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub source: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    pub fn new(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            bytes,
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageUpload")
            .field("source", &self.source)
            .field("bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_new_is_a_draft() {
        let place = Place::new("Eiffel Tower")
            .with_description("Iconic")
            .with_rating(4.5);
        assert_eq!(place.name, "Eiffel Tower");
        assert_eq!(place.description, "Iconic");
        assert!((place.rating - 4.5).abs() < f64::EPSILON);
        assert!(place.id.is_empty());
        assert!(place.owner_id.is_empty());
        assert!(!place.has_created_at());
        assert!(!place.has_image());
    }

    #[test]
    fn test_rating_is_not_clamped() {
        let place = Place::new("Somewhere").with_rating(7.0);
        assert!((place.rating - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_whitespace_image_url_counts_as_none() {
        let mut place = Place::new("Louvre");
        place.image_url = "  ".to_string();
        assert!(!place.has_image());
    }

    #[test]
    fn test_is_owned_by() {
        let mut place = Place::new("Colosseum");
        place.owner_id = UserId::from("u1");
        assert!(place.is_owned_by(&UserId::from("u1")));
        assert!(!place.is_owned_by(&UserId::from("u2")));
    }

    #[test]
    fn test_image_upload_debug_omits_bytes() {
        let upload = ImageUpload::new("photos/tower.jpg", vec![1, 2, 3]).with_content_type("image/jpeg");
        let rendered = format!("{upload:?}");
        assert!(rendered.contains("photos/tower.jpg"));
        assert!(rendered.contains("bytes: 3"));
    }
}

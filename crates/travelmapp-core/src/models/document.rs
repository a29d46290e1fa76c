//! Mapping between stored documents and [`Place`] values.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::place::{Place, PlaceId, UserId};
use crate::error::{Error, Result};

/// Field map of a schemaless document.
pub type Fields = Map<String, Value>;

/// A document as returned by a document store: the store key plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Wire shape of a place document.
///
/// Every field is optional on read and falls back to its default when absent
/// or `null`. Documents written by older clients used camelCase names.
///
/// `created_at` is always written as Unix milliseconds, so the backing column
/// must be a `bigint`. RFC 3339 text is still accepted on read for rows
/// imported from elsewhere; the next write stores them as milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceFields {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(alias = "imageUrl", deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(alias = "createdAt", deserialize_with = "timestamp_millis")]
    pub created_at: i64,
    #[serde(alias = "userId", deserialize_with = "null_as_default")]
    pub user_id: String,
}

impl From<&Place> for PlaceFields {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            description: place.description.clone(),
            image_url: place.image_url.clone(),
            rating: place.rating,
            created_at: place.created_at,
            user_id: place.owner_id.as_str().to_string(),
        }
    }
}

impl PlaceFields {
    fn into_place(self, id: &str) -> Place {
        Place {
            id: PlaceId::new(id),
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            rating: self.rating,
            created_at: self.created_at,
            owner_id: UserId::new(self.user_id),
        }
    }
}

/// Decode a stored document into a place, taking the id from the store key.
pub fn place_from_document(document: &Document) -> Result<Place> {
    let fields: PlaceFields = serde_json::from_value(Value::Object(document.fields.clone()))
        .map_err(|error| Error::MalformedRecord(format!("{}: {error}", document.id)))?;
    Ok(fields.into_place(&document.id))
}

/// Encode every persisted field of a place. The id is never written as a field.
pub fn place_fields(place: &Place) -> Result<Fields> {
    match serde_json::to_value(PlaceFields::from(place))? {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::InvalidInput(format!(
            "place encoded to a non-object value: {other}"
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept Unix milliseconds or RFC 3339 text.
fn timestamp_millis<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Millis(i64),
        Text(String),
    }

    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(0),
        Some(RawTimestamp::Millis(value)) => Ok(value),
        Some(RawTimestamp::Text(value)) => chrono::DateTime::parse_from_rfc3339(value.trim())
            .map(|date_time| date_time.timestamp_millis())
            .map_err(serde::de::Error::custom),
    }
}

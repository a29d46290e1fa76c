//! Data models for TravelMapp

mod document;
mod place;

pub use document::{place_fields, place_from_document, Document, Fields, PlaceFields};
pub use place::{ImageUpload, Place, PlaceId, UserId};

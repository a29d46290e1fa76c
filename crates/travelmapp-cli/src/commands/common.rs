use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use travelmapp_core::{ClientConfig, ImageUpload, Place, PlaceId, PlacesRepository};

use crate::auth::SupabaseAuthService;
use crate::error::CliError;

const MAX_RATING: f64 = 5.0;

#[derive(Debug, Serialize)]
pub struct PlaceListItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub rating: f64,
    pub created_at: i64,
    pub created_at_iso: String,
    pub relative_time: String,
    pub owner_id: String,
}

/// Repository bound to the session restored from the keychain.
pub async fn connect() -> Result<PlacesRepository, CliError> {
    let config = ClientConfig::from_env()?;
    let auth = SupabaseAuthService::from_config(&config)?;
    if auth.restore_session().await?.is_none() {
        tracing::debug!("No stored session, continuing signed out");
    }

    Ok(PlacesRepository::from_config(&config, Arc::new(auth.session()))?)
}

pub fn format_place_lines(places: &[Place]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    places
        .iter()
        .map(|place| {
            let name = truncate(&place.name, 32);
            let stars = render_rating(place.rating);
            let relative_time = format_relative_time(place.created_at, now_ms);
            let photo = if place.has_image() { "  [photo]" } else { "" };
            format!(
                "{:<36}  {name:<32}  {stars:<5}  {relative_time}{photo}",
                place.id.as_str()
            )
        })
        .collect()
}

pub fn format_place_details(place: &Place) -> Vec<String> {
    let mut lines = vec![
        format!("ID:          {}", place.id),
        format!("Name:        {}", place.name),
        format!("Rating:      {} ({})", render_rating(place.rating), place.rating),
        format!("Created:     {}", format_timestamp(place.created_at)),
        format!("Owner:       {}", place.owner_id),
    ];
    if place.has_image() {
        lines.push(format!("Photo:       {}", place.image_url));
    }
    if !place.description.trim().is_empty() {
        lines.push(String::new());
        lines.push(place.description.clone());
    }
    lines
}

pub fn place_to_list_item(place: &Place) -> PlaceListItem {
    let now_ms = Utc::now().timestamp_millis();
    PlaceListItem {
        id: place.id.to_string(),
        name: place.name.clone(),
        description: place.description.clone(),
        image_url: place.image_url.clone(),
        rating: place.rating,
        created_at: place.created_at,
        created_at_iso: format_timestamp(place.created_at),
        relative_time: format_relative_time(place.created_at, now_ms),
        owner_id: place.owner_id.to_string(),
    }
}

/// Whole stars, rounded down, on a five star scale.
pub fn render_rating(rating: f64) -> String {
    let clamped = rating.clamp(0.0, MAX_RATING);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = clamped.floor() as usize;
    format!("{}{}", "*".repeat(filled), ".".repeat(5 - filled))
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_name(name: &str) -> Result<String, CliError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyName)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn validate_rating(rating: f64) -> Result<f64, CliError> {
    if rating.is_finite() && (0.0..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(CliError::InvalidRating(rating))
    }
}

pub fn normalize_place_id(id: &str) -> Result<PlaceId, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyPlaceId)
    } else {
        Ok(PlaceId::from(trimmed))
    }
}

/// Read a photo from disk, guessing its content type from the extension.
pub async fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(ImageUpload::new(path.to_string_lossy(), bytes).with_content_type(content_type))
}

pub async fn read_optional_image(path: Option<&Path>) -> Result<Option<ImageUpload>, CliError> {
    match path {
        Some(path) => Ok(Some(read_image(path).await?)),
        None => Ok(None),
    }
}

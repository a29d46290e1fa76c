//! Shared utility functions used across multiple modules.

use reqwest::StatusCode;
use serde::Deserialize;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current Unix timestamp in seconds.
pub fn unix_seconds_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Base URL of one Supabase service (`/rest/v1`, `/auth/v1`) of a project.
///
/// Accepts the bare project URL or one that already ends with the service
/// path.
pub fn supabase_endpoint(project_url: &str, service_path: &str) -> Result<String, &'static str> {
    let base = project_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err("Supabase URL must not be empty");
    }
    if !is_http_url(base) {
        return Err("Supabase URL must include http:// or https://");
    }

    let service_path = service_path.trim_matches('/');
    if base.ends_with(&format!("/{service_path}")) {
        Ok(base.to_string())
    } else {
        Ok(format!("{base}/{service_path}"))
    }
}

#[derive(Debug, Deserialize)]
struct SupabaseErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

/// Render a Supabase (auth or PostgREST) error body as `message (status)`.
pub fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<SupabaseErrorResponse>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

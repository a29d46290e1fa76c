//! Client configuration.
//!
//! Provides a `ClientConfig` read from the environment that tells clients
//! where the Supabase project lives, which collection holds places, and how
//! photos are stored.

use std::env;

use crate::error::{Error, Result};
use crate::storage::R2Config;
use crate::util::{is_http_url, normalize_text_option};

const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_PLACES_COLLECTION: &str = "TRAVELMAPP_PLACES_COLLECTION";

/// Collection used when `TRAVELMAPP_PLACES_COLLECTION` is not set.
pub const DEFAULT_PLACES_COLLECTION: &str = "places";

/// Public endpoints and keys a client needs to reach its backends.
///
/// The anon key is safe to ship; secret credentials only appear in the
/// optional R2 section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub places_collection: String,
    /// `None` when photo storage is not configured.
    pub r2: Option<R2Config>,
}

impl ClientConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let supabase_url = required(&lookup, ENV_SUPABASE_URL)?;
        if !is_http_url(&supabase_url) {
            return Err(Error::InvalidInput(format!(
                "{ENV_SUPABASE_URL} must include http:// or https://"
            )));
        }
        let supabase_anon_key = required(&lookup, ENV_SUPABASE_ANON_KEY)?;
        let places_collection = normalize_text_option(lookup(ENV_PLACES_COLLECTION))
            .unwrap_or_else(|| DEFAULT_PLACES_COLLECTION.to_string());

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            places_collection,
            r2: R2Config::from_lookup(&lookup)?,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    normalize_text_option(lookup(name)).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Supabase is not configured. Set {ENV_SUPABASE_URL} and {ENV_SUPABASE_ANON_KEY} ({name} is missing)."
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_default_collection() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", " anon "),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ClientConfig {
                supabase_url: "https://demo.supabase.co".to_string(),
                supabase_anon_key: "anon".to_string(),
                places_collection: "places".to_string(),
                r2: None,
            }
        );
    }

    #[test]
    fn collection_can_be_overridden() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("TRAVELMAPP_PLACES_COLLECTION", "places_staging"),
        ]))
        .unwrap();
        assert_eq!(config.places_collection, "places_staging");
    }

    #[test]
    fn missing_supabase_values_are_rejected() {
        let error =
            ClientConfig::from_lookup(lookup_from(&[("SUPABASE_URL", "https://x.co")]))
                .unwrap_err();
        assert!(error.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn supabase_url_requires_scheme() {
        let error = ClientConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[test]
    fn r2_section_is_loaded_when_present() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("R2_ACCOUNT_ID", "acct"),
            ("R2_BUCKET", "photos"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "secret"),
        ]))
        .unwrap();

        let r2 = config.r2.unwrap();
        assert_eq!(r2.bucket, "photos");
        assert_eq!(r2.public_base_url, None);
    }
}

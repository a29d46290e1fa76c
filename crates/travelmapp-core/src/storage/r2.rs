//! Cloudflare R2 photo storage.

use std::env;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::{normalize_object_key, BlobStore};
use crate::{Error, Result};

const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_BUCKET: &str = "R2_BUCKET";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_PUBLIC_BASE_URL: &str = "R2_PUBLIC_BASE_URL";

/// Cloudflare R2 configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// R2 bucket name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Optional public URL base for serving photos.
    pub public_base_url: Option<String>,
}

impl R2Config {
    /// Load R2 configuration from environment variables.
    ///
    /// Returns `Ok(None)` when no R2 variables are set.
    /// Returns an error when only a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`R2Config::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        parse_config(lookup)
    }

    /// Cloudflare R2 S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    /// Base that download URLs are built from.
    fn url_base(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.endpoint_url(), self.bucket))
    }
}

/// R2-backed [`BlobStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct R2Storage {
    config: R2Config,
}

impl R2Storage {
    #[must_use]
    pub const fn new(config: R2Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Download URL of an object key.
    ///
    /// Uses the public base URL when configured, the path-style endpoint URL
    /// otherwise.
    #[must_use]
    pub fn object_url(&self, object_key: &str) -> String {
        format!(
            "{}/{}",
            self.config.url_base(),
            object_key.trim_matches('/')
        )
    }

    /// Recover the object key from a URL built by [`R2Storage::object_url`].
    #[must_use]
    pub fn object_key_from_url(&self, url: &str) -> Option<String> {
        let base = self.config.url_base();
        let key = url.trim().strip_prefix(&base)?.strip_prefix('/')?;
        let key = key
            .split(|ch| ch == '?' || ch == '#')
            .next()
            .unwrap_or_default();
        normalize_object_key(key).ok()
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        let client = self.s3_client();
        client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, error))?;
        Ok(())
    }

    async fn delete_object(&self, object_key: &str) -> Result<()> {
        let object_key = normalize_object_key(object_key)?;
        let client = self.s3_client();

        client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .send()
            .await
            .map_err(|error| {
                storage_error(
                    "delete_object",
                    &self.config.bucket,
                    Some(&object_key),
                    error,
                )
            })?;

        Ok(())
    }

    fn s3_client(&self) -> Client {
        build_s3_client(&self.config)
    }
}

#[async_trait]
impl BlobStore for R2Storage {
    async fn upload(
        &self,
        object_key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        let object_key = normalize_object_key(object_key)?;
        let client = self.s3_client();

        let mut request = client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes));

        if let Some(content_type) = normalize_content_type(content_type) {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|error| {
            storage_error("put_object", &self.config.bucket, Some(&object_key), error)
        })?;

        tracing::debug!("Uploaded {}/{}", self.config.bucket, object_key);
        Ok(self.object_url(&object_key))
    }

    async fn delete_by_url(&self, url: &str) -> Result<()> {
        let object_key = self.object_key_from_url(url).ok_or_else(|| {
            Error::InvalidInput(format!(
                "'{url}' is not an object URL of bucket {}",
                self.config.bucket
            ))
        })?;
        self.delete_object(&object_key).await
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<R2Config>> {
    let account_id = lookup(ENV_ACCOUNT_ID).map(|value| value.trim().to_string());
    let bucket = lookup(ENV_BUCKET).map(|value| value.trim().to_string());
    let access_key_id = lookup(ENV_ACCESS_KEY_ID).map(|value| value.trim().to_string());
    let secret_access_key = lookup(ENV_SECRET_ACCESS_KEY).map(|value| value.trim().to_string());
    let public_base_url = lookup(ENV_PUBLIC_BASE_URL).map(|value| value.trim().to_string());

    let any_present = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some()
        || public_base_url.is_some();

    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    let account_id = take_required(account_id, ENV_ACCOUNT_ID, &mut missing);
    let bucket = take_required(bucket, ENV_BUCKET, &mut missing);
    let access_key_id = take_required(access_key_id, ENV_ACCESS_KEY_ID, &mut missing);
    let secret_access_key =
        take_required(secret_access_key, ENV_SECRET_ACCESS_KEY, &mut missing);

    if !missing.is_empty() {
        return Err(Error::InvalidInput(format!(
            "R2 configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    }

    Ok(Some(R2Config {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
        public_base_url: normalize_public_base_url(public_base_url)?,
    }))
}

fn take_required(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    let value = value.filter(|value| !value.is_empty());
    if value.is_none() {
        missing.push(name);
    }
    value.unwrap_or_default()
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "travelmapp-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

/// Dispatch and timeout failures never reached R2 and count as transport errors.
fn storage_error<E, R>(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: SdkError<E, R>,
) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    let message = format!(
        "R2 {operation} failed for {target}: {}",
        DisplayErrorContext(&error)
    );
    match error {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Error::Transport(message),
        _ => Error::StoreUnavailable(message),
    }
}

fn normalize_content_type(content_type: Option<&str>) -> Option<String> {
    content_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn normalize_public_base_url(public_base_url: Option<String>) -> Result<Option<String>> {
    let Some(value) = public_base_url else {
        return Ok(None);
    };

    if value.is_empty() {
        return Ok(None);
    }
    if !value.starts_with("https://") && !value.starts_with("http://") {
        return Err(Error::InvalidInput(
            "R2_PUBLIC_BASE_URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(Some(value.trim_end_matches('/').to_string()))
}

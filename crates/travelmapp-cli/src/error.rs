use std::io;
use std::path::PathBuf;

use thiserror::Error;
use travelmapp_core::auth::AuthError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(travelmapp_core::Error),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Place name cannot be empty")]
    EmptyName,
    #[error("Place ID cannot be empty")]
    EmptyPlaceId,
    #[error("Rating must be a number between 0 and 5, got {0}")]
    InvalidRating(f64),
    #[error("Failed to read image {}: {source}", path.display())]
    ImageRead { path: PathBuf, source: io::Error },
    #[error("Not signed in. Run `travelmapp auth login` first.")]
    NotSignedIn,
}

impl From<travelmapp_core::Error> for CliError {
    fn from(error: travelmapp_core::Error) -> Self {
        match error {
            travelmapp_core::Error::Unauthenticated => Self::NotSignedIn,
            other => Self::Core(other),
        }
    }
}

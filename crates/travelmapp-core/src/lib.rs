//! travelmapp-core - Core library for TravelMapp
//!
//! This crate contains the place model, the document and blob store ports
//! with their Supabase, R2 and in-memory backends, the place access layer,
//! and the auth client used by every TravelMapp interface.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod places;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
pub mod util;

pub use config::ClientConfig;
pub use error::{AccessError, Error, ErrorKind, Result};
pub use models::{ImageUpload, Place, PlaceId, UserId};
pub use places::PlacesRepository;
pub use session::{SessionProvider, StaticSession};

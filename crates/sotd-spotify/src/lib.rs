//! Spotify Web API client supplying the playlist catalog.
//!
//! Implements [`sotd_core::catalog::CatalogSource`]: obtains an access token
//! with the configured app credentials, then pages through the playlist's
//! tracks.

mod client;
mod model;

pub mod error;

pub use client::{SpotifyClient, SpotifyConfig};
pub use error::{Error, Result};

//! Discord REST client delivering song-of-the-day announcements.
//!
//! Only the two REST calls the service needs are made: a channel lookup and
//! a message post. The message body is built by [`render`].

mod client;

pub mod error;
pub mod render;

pub use client::{Channel, DiscordAnnouncer, DiscordConfig};
pub use error::{Error, Result};

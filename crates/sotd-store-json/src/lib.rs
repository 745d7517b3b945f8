//! JSON-file backend for the song-of-the-day state tables.
//!
//! Each table is one small JSON document inside a state directory. Reads
//! and writes go through [`tokio::fs`] so the async runtime is never
//! blocked on disk.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{JsonStore, Table};

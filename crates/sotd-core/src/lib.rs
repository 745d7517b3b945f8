//! Core types, trait seams and engine for the song-of-the-day service.
//!
//! This crate holds the selection rules, the daily trigger and the
//! administrative commands. It knows nothing about HTTP, Spotify or Discord;
//! those live behind [`catalog::CatalogSource`], [`announce::Announcer`] and
//! [`store::StateStore`].

// Native `async fn` in traits; the seams spell out `Send` futures explicitly.
#![allow(async_fn_in_trait)]

pub mod announce;
pub mod catalog;
pub mod command;
pub mod error;
pub mod memory;
pub mod selection;
pub mod state;
pub mod station;
pub mod store;
pub mod track;
pub mod trigger;

pub use error::{Error, Result};

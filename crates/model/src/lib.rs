//! Library entities.
//!
//! These are the live-store shapes of the things a library tracks: series,
//! their units (chapters or episodes), categories, consumption history and
//! tracker links. Every entity carries an optional local row id (assigned by
//! the store, meaningless on any other installation) next to its natural
//! key, which is what snapshots use to find the entity again.

pub mod error;
pub mod millis;
pub mod models;

pub use crate::models::{Category, History, Medium, Series, Track, Unit};

//! Storage backends for snapshot files.
//!
//! Snapshot creation, retention and restore never touch the filesystem
//! directly; they go through a [`StorageBackend`] rooted at the configured
//! snapshot directory. Every path handed to a backend is relative to that
//! root and is checked by [`validate_path`] first.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;

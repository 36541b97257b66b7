//! Path validation.
//!
//! Snapshot paths come from configuration and the command line, so they are
//! normalised and checked before any backend joins them onto its root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and returns its normalised form.
///
/// Paths may never resolve outside the storage root (no `..` traversal
/// above the root), may not contain null bytes and may not be empty after
/// normalisation. Leading slashes and `.` components are dropped.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use hoard_storage::validate_path;
///
/// assert!(validate_path("automatic/hoard_2024-01-01_00-00.snapshot.json.gz").is_ok());
/// assert!(validate_path("manual/../latest.snapshot.json").is_ok());
/// assert!(validate_path("../outside.snapshot.json").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("/automatic//./nightly.snapshot.json/").unwrap(),
///     Path::new("automatic/nightly.snapshot.json")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix but truncate
                // the path once it reaches a syscall.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

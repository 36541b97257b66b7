//! Automatic snapshot naming and pruning.
//!
//! Automatic snapshots live in [`AUTOMATIC_DIR`] below the backend root and
//! embed their creation minute in the name, so sorting names sorts by age.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use hoard_compress::Compression;
use hoard_storage::StorageBackend;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use time::UtcDateTime;
use tracing::instrument;

pub const AUTOMATIC_DIR: &str = "automatic";

static AUTOMATIC_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^hoard_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}\.snapshot\.json(\.gz|\.bz2)?$").unwrap());

/// `hoard_YYYY-MM-DD_HH-MM.snapshot.json` plus the compression extension.
pub fn snapshot_name(at: UtcDateTime, compression: Compression) -> String {
    format!(
        "hoard_{:04}-{:02}-{:02}_{:02}-{:02}.snapshot.json{}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        compression.extension(),
    )
}

/// Where an automatic snapshot taken at `at` is written.
pub fn automatic_path(at: UtcDateTime, compression: Compression) -> PathBuf {
    Path::new(AUTOMATIC_DIR).join(snapshot_name(at, compression))
}

pub fn is_automatic_name(name: &str) -> bool {
    AUTOMATIC_NAME.is_match(name)
}

/// Delete old automatic snapshots, leaving room for one more.
///
/// Keeps the newest `keep - 1` files and returns the paths deleted. Files
/// that fail to delete are logged and skipped.
#[instrument(skip(backend), fields(backend = backend.name(), deleted))]
pub async fn prune_automatic(backend: &dyn StorageBackend, keep: u32) -> Result<Vec<PathBuf>> {
    let dir = Path::new(AUTOMATIC_DIR);
    let mut candidates: Vec<PathBuf> = backend
        .list(Some(dir))
        .await
        .or_raise(|| ErrorKind::FileTarget)?
        .into_iter()
        .filter(|file| file.path.parent() == Some(dir) && file.file_name().is_some_and(is_automatic_name))
        .map(|file| file.path)
        .collect();
    candidates.sort_by(|a, b| b.cmp(a));

    let retain = usize::try_from(keep.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut deleted = Vec::new();
    for path in candidates.into_iter().skip(retain) {
        match backend.delete(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "deleted old automatic snapshot");
                deleted.push(path);
            },
            Err(e) => tracing::warn!(path = %path.display(), error = ?e, "could not delete old automatic snapshot"),
        }
    }
    tracing::Span::current().record("deleted", deleted.len());
    Ok(deleted)
}

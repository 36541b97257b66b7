//! Writing a snapshot file.

use crate::assemble::assemble;
use crate::codec::{decode, encode};
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::retention::{automatic_path, prune_automatic};
use crate::selector::CaptureSelector;
use exn::ResultExt;
use hoard_compress::Compression;
use hoard_storage::StorageBackend;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tracing::instrument;

/// Where a snapshot goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A timestamped file under the automatic directory. Older automatic
    /// snapshots are pruned so that `keep` remain afterwards.
    Automatic { keep: u32 },
    /// An explicit path, relative to the backend root.
    Manual(PathBuf),
}

/// Capture, encode and write a snapshot, returning where it was written.
///
/// The written file is checked for its full size, then read back and
/// decoded before this returns. If that fails the file is deleted and an
/// [`Encoding`](ErrorKind::Encoding) error is raised.
#[instrument(skip(ctx, backend), fields(backend = backend.name(), selector = %selector))]
pub async fn create_snapshot(
    ctx: &Context,
    backend: &dyn StorageBackend,
    target: Target,
    selector: CaptureSelector,
    compression: Compression,
) -> Result<PathBuf> {
    let snapshot = assemble(ctx, selector).await?;
    let bytes = encode(&snapshot, compression)?;

    let path = match target {
        Target::Automatic { keep } => {
            prune_automatic(backend, keep).await?;
            automatic_path(UtcDateTime::now(), compression)
        },
        Target::Manual(path) => path,
    };
    backend.write(&path, &bytes).await.or_raise(|| ErrorKind::FileTarget)?;

    if let Err(e) = verify(backend, &path, bytes.len()).await {
        if let Err(cleanup) = backend.delete(&path).await {
            tracing::warn!(path = %path.display(), error = ?cleanup, "could not delete unreadable snapshot");
        }
        return Err(e);
    }
    tracing::info!(path = %path.display(), size = bytes.len(), "snapshot written");
    Ok(path)
}

async fn verify(backend: &dyn StorageBackend, path: &Path, expected: usize) -> Result<()> {
    let info = backend.stat(path).await.or_raise(|| ErrorKind::FileTarget)?;
    if info.size != expected as u64 {
        tracing::warn!(path = %path.display(), expected, size = info.size, "snapshot written short");
        exn::bail!(ErrorKind::Encoding);
    }
    let written = backend.read(path).await.or_raise(|| ErrorKind::FileTarget)?;
    decode(&written).or_raise(|| ErrorKind::Encoding)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::read_snapshot;
    use crate::test_support::{context, seed};
    use hoard_storage::backend::MockBackend;

    #[tokio::test]
    async fn test_manual_snapshot() {
        let ctx = context().await;
        seed(&ctx.manga).await;
        let backend = MockBackend::default();
        let target = Target::Manual(PathBuf::from("exports/library.json.bz2"));

        let path = create_snapshot(&ctx, &backend, target, CaptureSelector::all(), Compression::Bzip2).await.unwrap();
        assert_eq!(path, Path::new("exports/library.json.bz2"));
        let snapshot = read_snapshot(&backend, &path).await.unwrap();
        assert_eq!(snapshot.manga.series.len(), 1);
    }

    #[tokio::test]
    async fn test_automatic_snapshot_is_named_and_pruned() {
        let ctx = context().await;
        let backend = MockBackend::with_files([
            ("automatic/hoard_2020-01-01_00-00.snapshot.json.gz", Vec::from(*b"{}")),
            ("automatic/hoard_2020-01-02_00-00.snapshot.json.gz", Vec::from(*b"{}")),
        ]);

        let path =
            create_snapshot(&ctx, &backend, Target::Automatic { keep: 2 }, CaptureSelector::all(), Compression::Gzip)
                .await
                .unwrap();
        assert!(path.starts_with("automatic"));
        assert!(crate::retention::is_automatic_name(path.file_name().and_then(|n| n.to_str()).unwrap()));
        assert_eq!(backend.paths().await, vec![
            PathBuf::from("automatic/hoard_2020-01-02_00-00.snapshot.json.gz"),
            path
        ]);
    }

    #[tokio::test]
    async fn test_automatic_snapshot_survives_a_failed_prune() {
        let ctx = context().await;
        let stuck = "automatic/hoard_2020-01-01_00-00.snapshot.json";
        let backend = MockBackend::with_files([
            (stuck, Vec::from(*b"{}")),
            ("automatic/hoard_2020-01-02_00-00.snapshot.json", Vec::from(*b"{}")),
            ("automatic/hoard_2020-01-03_00-00.snapshot.json", Vec::from(*b"{}")),
        ])
        .rejecting_delete(stuck);

        let path =
            create_snapshot(&ctx, &backend, Target::Automatic { keep: 2 }, CaptureSelector::all(), Compression::None)
                .await
                .unwrap();
        assert_eq!(backend.paths().await, vec![
            PathBuf::from(stuck),
            PathBuf::from("automatic/hoard_2020-01-03_00-00.snapshot.json"),
            path
        ]);
    }

    #[tokio::test]
    async fn test_torn_write_is_cleaned_up() {
        let ctx = context().await;
        seed(&ctx.manga).await;
        let backend = MockBackend::default().tearing_writes();
        let target = Target::Manual(PathBuf::from("torn.json.gz"));

        let err = create_snapshot(&ctx, &backend, target, CaptureSelector::all(), Compression::Gzip).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Encoding));
        assert!(backend.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_target() {
        let ctx = context().await;
        let backend = MockBackend::default().rejecting_writes();
        let target = Target::Manual(PathBuf::from("denied.json"));

        let err = create_snapshot(&ctx, &backend, target, CaptureSelector::all(), Compression::None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::FileTarget));
        assert!(backend.paths().await.is_empty());
    }
}

//! Snapshot bytes: JSON wrapped in a compression frame.

use crate::error::{ErrorKind, Result};
use crate::snapshot::{FORMAT_VERSION, Snapshot};
use exn::ResultExt;
use hoard_compress::Compression;
use hoard_storage::StorageBackend;
use std::path::Path;
use tracing::instrument;

/// Serialize and compress a snapshot.
#[instrument(skip(snapshot), fields(size))]
pub fn encode(snapshot: &Snapshot, compression: Compression) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(snapshot).or_raise(|| ErrorKind::Encoding)?;
    if json.is_empty() {
        exn::bail!(ErrorKind::Encoding);
    }
    let bytes = compression.compress(&json).or_raise(|| ErrorKind::Encoding)?;
    tracing::Span::current().record("size", bytes.len());
    Ok(bytes)
}

/// Decompress (format detected from magic bytes) and deserialize a snapshot.
#[instrument(skip_all, fields(size = bytes.len(), compression))]
pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
    if bytes.is_empty() {
        exn::bail!(ErrorKind::Encoding);
    }
    let (compression, json) = Compression::unpack(bytes).or_raise(|| ErrorKind::Encoding)?;
    tracing::Span::current().record("compression", compression.as_str());
    let snapshot: Snapshot = serde_json::from_slice(&json).or_raise(|| ErrorKind::Encoding)?;
    if snapshot.version == 0 || snapshot.version > FORMAT_VERSION {
        exn::bail!(ErrorKind::UnsupportedVersion(snapshot.version));
    }
    Ok(snapshot)
}

/// Read and decode the snapshot stored at `path`.
pub async fn read_snapshot(backend: &dyn StorageBackend, path: &Path) -> Result<Snapshot> {
    let bytes = backend.read(path).await.or_raise(|| ErrorKind::FileTarget)?;
    decode(&bytes)
}

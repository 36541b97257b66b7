//! Backup Error Types
//!
//! Kinds are split by what the caller can do about them: store and source
//! failures might go away on a second attempt, encoding and file target
//! failures will not.

use derive_more::{Display, Error};

/// A snapshot engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A read or write against a library store failed. The enclosing
    /// transaction has been rolled back.
    #[display("library store access failed")]
    Store,
    /// A snapshot could not be serialized, or bytes could not be decoded
    /// back into a snapshot.
    #[display("snapshot encoding failed")]
    Encoding,
    /// The snapshot was written by a newer (or unknown) format version.
    #[display("unsupported snapshot format version {_0}")]
    UnsupportedVersion(#[error(not(source))] u32),
    /// The snapshot destination could not be written, read or listed.
    #[display("snapshot file target failed")]
    FileTarget,
    /// A series references a content source that is not installed.
    #[display("content source {_0} is not installed")]
    SourceUnavailable(#[error(not(source))] i64),
    /// An installed content source failed to produce a unit list.
    #[display("content source fetch failed")]
    Source,
    /// The host preference store could not be read or written.
    #[display("preference store access failed")]
    Preferences,
    /// A capture selector list named an unknown data category.
    #[display("unknown capture category: {_0}")]
    InvalidSelector(#[error(not(source))] String),
}

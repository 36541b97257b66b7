//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the library stores")]
    Store,
    #[display("snapshot directory is unusable: {}", _0.display())]
    Directory(#[error(not(source))] PathBuf),
    #[display("not a snapshot file path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    #[display("snapshot operation failed")]
    Backup,
}

impl ErrorKind {
    /// A locked or unreachable store may work on the next run.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }

    /// Process exit status: `EX_TEMPFAIL` when retrying might succeed.
    pub fn exit_status(&self) -> u8 {
        if self.is_retryable() { 75 } else { 1 }
    }
}

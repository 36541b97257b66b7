//! Model Error Types

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model conversions.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not parse {field}: {value}")]
    ParseError {
        field: &'static str,
        #[error(not(source))]
        value: String,
    },
    #[display("timestamp out of range: {_0}ms")]
    InvalidTimestamp(#[error(not(source))] i64),
}

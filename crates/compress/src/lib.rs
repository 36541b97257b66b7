//! Compression framing for snapshot files.
//!
//! Snapshots are written as an encoded payload wrapped in one of the
//! [`Compression`] formats below. Readers never need to be told which format
//! was used: [`Compression::unpack`] sniffs the magic bytes at the start of
//! the file and picks the right decoder (falling back to treating the data as
//! uncompressed).
//!
//! All compression uses the highest available level for each format.
//! Snapshot files are small and written rarely, so size wins over speed.

mod construct;
pub mod error;
mod ops;
#[cfg(feature = "serde")]
mod serialize;

use std::fmt::{Display, Formatter, Result as FmtResult};

/// A supported compression format. Defaults to [`Gzip`](Self::Gzip).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    None,
    /// Gzip compression (.gz)
    #[default]
    Gzip,
    /// Bzip2 compression (.bz2)
    Bzip2,
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Compression {
    /// Returns the file extension (including the leading dot) for this format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Bzip2 => ".bz2",
        }
    }

    /// Returns the short name used in configuration files.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[test]
    fn test_snapshots_default_to_gzip() {
        assert_eq!(Compression::default(), Compression::Gzip);
    }

    #[rstest]
    #[case(Compression::None, "", "none")]
    #[case(Compression::Gzip, ".gz", "gzip")]
    #[case(Compression::Bzip2, ".bz2", "bzip2")]
    fn test_names(#[case] format: Compression, #[case] extension: &str, #[case] name: &str) {
        assert_eq!(format.extension(), extension);
        assert_eq!(format.to_string(), name);
    }
}

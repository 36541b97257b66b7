//! Millisecond Unix timestamps.
//!
//! Both the row store and the snapshot format count time in milliseconds
//! since the Unix epoch; everything in memory is a [`UtcDateTime`].

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Convert to milliseconds since the epoch, truncating sub-millisecond precision.
#[must_use]
pub fn to_millis(at: UtcDateTime) -> i64 {
    // Every representable UtcDateTime fits comfortably in i64 milliseconds.
    (at.unix_timestamp_nanos() / NANOS_PER_MILLI) as i64
}

/// Convert milliseconds since the epoch back into a date-time.
pub fn from_millis(millis: i64) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
        .or_raise(|| ErrorKind::InvalidTimestamp(millis))
}

/// [`from_millis`] for optional columns, where zero also means "unknown".
pub fn from_optional_millis(millis: Option<i64>) -> Result<Option<UtcDateTime>> {
    millis.filter(|millis| *millis != 0).map(from_millis).transpose()
}

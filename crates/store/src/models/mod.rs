//! Row shapes and their conversions to and from the library models.

mod category;
mod history;
mod series;
mod track;
mod unit;

pub(crate) use self::category::CategoryRow;
pub(crate) use self::history::{HistoryRow, HistoryUrlRow};
pub(crate) use self::series::SeriesRow;
pub(crate) use self::track::TrackRow;
pub(crate) use self::unit::UnitRow;
use hoard_model::millis;

fn optional_millis(at: Option<time::UtcDateTime>) -> Option<i64> {
    at.map(millis::to_millis)
}

//! Merging snapshot records into a live store.
//!
//! Nothing in a snapshot carries a local row id, so every step first
//! matches incoming records to local ones by natural key and then decides,
//! field by field, whether the snapshot or the store wins. Each function
//! works inside a caller-provided [`Transaction`](hoard_store::Transaction)
//! and writes in batches once every record of its slice is resolved.
//!
//! | step                       | key                 | policy                                   |
//! |----------------------------|---------------------|------------------------------------------|
//! | [`restore_series`]         | `(source, url)`     | snapshot metadata wins, id kept          |
//! | [`restore_categories`]     | name                | insert missing                           |
//! | [`restore_series_categories`] | display order    | replace memberships if any resolve       |
//! | [`restore_units`]          | url                 | consumption and bookmarks never regress  |
//! | [`restore_history`]        | unit url            | latest timestamp wins                    |
//! | [`restore_tracks`]         | sync service        | remote ids corrected, progress max       |

mod category;
mod history;
mod series;
mod track;
mod unit;

pub use self::category::{restore_categories, restore_series_categories};
pub use self::history::{HistoryMerge, restore_history};
pub use self::series::restore_series;
pub use self::track::{TrackMerge, restore_tracks};
pub use self::unit::{UnitMerge, merge_unit, refresh_units, restore_units};

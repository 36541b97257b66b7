use crate::error::{ErrorKind, Result};
use crate::snapshot::SnapshotHistory;
use exn::{OptionExt, ResultExt};
use hoard_model::History;
use hoard_store::Transaction;
use std::collections::BTreeMap;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryMerge {
    /// Rows inserted or moved forward.
    pub written: usize,
    /// Pairs whose unit does not exist in the series.
    pub dropped: usize,
}

/// Merge `(unit url, timestamp)` pairs into the history of a series.
///
/// An existing row keeps the later of the two timestamps. A unit without
/// history gets a new row; a url with no unit is dropped. Rows that would
/// not change are not written, so merging the same pairs twice is a no-op.
#[instrument(skip(tx, incoming), fields(count = incoming.len()))]
pub async fn restore_history(tx: &mut Transaction, series_id: i64, incoming: &[SnapshotHistory]) -> Result<HistoryMerge> {
    let mut merge = HistoryMerge::default();
    let mut pending: BTreeMap<i64, History> = BTreeMap::new();
    for entry in incoming {
        let at = entry.last_consumed()?;
        let candidate = match tx.history_by_unit_url(series_id, &entry.url).await.or_raise(|| ErrorKind::Store)? {
            Some(mut existing) => {
                if at <= existing.last_consumed {
                    continue;
                }
                existing.last_consumed = at;
                existing.duration = existing.duration.max(entry.duration);
                existing
            },
            None => match tx.unit_by_url(series_id, &entry.url).await.or_raise(|| ErrorKind::Store)? {
                Some(unit) => {
                    let unit_id = unit.id.ok_or_raise(|| ErrorKind::Store)?;
                    History { duration: entry.duration, ..History::new(unit_id, at) }
                },
                None => {
                    tracing::debug!(url = %entry.url, "dropping history for unknown unit");
                    merge.dropped += 1;
                    continue;
                },
            },
        };
        // The same url twice in one batch: keep the later one.
        match pending.get(&candidate.unit_id) {
            Some(queued) if queued.last_consumed >= candidate.last_consumed => {},
            _ => {
                pending.insert(candidate.unit_id, candidate);
            },
        }
    }

    let rows: Vec<History> = pending.into_values().collect();
    tx.upsert_history(&rows).await.or_raise(|| ErrorKind::Store)?;
    merge.written = rows.len();
    Ok(merge)
}

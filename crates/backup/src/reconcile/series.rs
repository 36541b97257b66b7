use crate::error::{ErrorKind, Result};
use crate::snapshot::SnapshotSeries;
use exn::ResultExt;
use hoard_model::Series;
use hoard_store::Transaction;
use tracing::instrument;

/// Match a snapshot series to the store by `(source, url)`, inserting it if
/// absent. Returns the stored series with its local id.
///
/// On a match the local id and date added are kept and every descriptive
/// field is taken from the snapshot. Either way the series ends up a
/// favourite and `initialized` is recomputed from the description.
#[instrument(skip_all, fields(source = incoming.source, url = %incoming.url, inserted))]
pub async fn restore_series(tx: &mut Transaction, incoming: &SnapshotSeries) -> Result<Series> {
    let mut series = incoming.to_series()?;
    series.favorite = true;
    series.initialized = series.has_description();

    let existing = tx.series_by_key(series.source, &series.url).await.or_raise(|| ErrorKind::Store)?;
    tracing::Span::current().record("inserted", existing.is_none());
    match existing {
        Some(local) => {
            series.id = local.id;
            series.added_at = local.added_at;
            if series != local {
                tx.update_series(&series).await.or_raise(|| ErrorKind::Store)?;
            }
        },
        None => {
            series.id = Some(tx.insert_series(&series).await.or_raise(|| ErrorKind::Store)?);
        },
    }
    Ok(series)
}

//! Building a [`Snapshot`] from the live stores.

use crate::context::{Context, Library};
use crate::error::{ErrorKind, Result};
use crate::prefs;
use crate::selector::CaptureSelector;
use crate::snapshot::{
    Section, Snapshot, SnapshotCategory, SnapshotHistory, SnapshotSeries, SnapshotTrack, SnapshotUnit, SourceInfo,
};
use exn::{OptionExt, ResultExt};
use hoard_model::millis::to_millis;
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// Capture every library (and, if selected, the preferences) into a snapshot.
///
/// Each store is read inside its own read-only transaction, so each section
/// reflects one consistent state of its store.
#[instrument(skip(ctx), fields(selector = %selector))]
pub async fn assemble(ctx: &Context, selector: CaptureSelector) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();
    for library in ctx.libraries() {
        *snapshot.section_mut(library.medium) = assemble_section(library, selector).await?;
    }
    if selector.preferences {
        snapshot.preferences = prefs::capture(ctx.preferences.as_ref()).await?;
    }
    Ok(snapshot)
}

#[instrument(skip_all, fields(medium = %library.medium, series))]
async fn assemble_section(library: &Library, selector: CaptureSelector) -> Result<Section> {
    let mut tx = library.repository.begin().await.or_raise(|| ErrorKind::Store)?;
    let local_categories = if selector.categories {
        tx.categories().await.or_raise(|| ErrorKind::Store)?
    } else {
        Vec::new()
    };
    // Memberships reference categories by their position in this list.
    let positions: HashMap<i64, i32> = local_categories
        .iter()
        .zip(0_i32..)
        .filter_map(|(category, position)| Some((category.id?, position)))
        .collect();
    let categories = local_categories.iter().map(SnapshotCategory::from).collect();

    let favorites = tx.favorite_series().await.or_raise(|| ErrorKind::Store)?;
    let mut sources: BTreeMap<i64, SourceInfo> = BTreeMap::new();
    let mut series = Vec::with_capacity(favorites.len());
    for local in &favorites {
        let id = local.id.ok_or_raise(|| ErrorKind::Store)?;
        let mut entry = SnapshotSeries::from_series(local);
        sources.entry(local.source).or_insert_with(|| library.sources.resolve(local.source).info());

        if selector.units {
            let units = tx.units_for_series(id).await.or_raise(|| ErrorKind::Store)?;
            entry.units = units.iter().map(SnapshotUnit::from).collect();
        }
        if selector.categories {
            let memberships = tx.categories_for_series(id).await.or_raise(|| ErrorKind::Store)?;
            entry.categories = memberships
                .iter()
                .filter_map(|category| category.id.and_then(|id| positions.get(&id).copied()))
                .collect();
        }
        if selector.tracking {
            let tracks = tx.tracks_for_series(id).await.or_raise(|| ErrorKind::Store)?;
            entry.tracks = tracks.iter().map(SnapshotTrack::from).collect();
        }
        if selector.history {
            let history = tx.history_for_series(id).await.or_raise(|| ErrorKind::Store)?;
            entry.history = history
                .into_iter()
                .filter(|entry| !entry.unit_url.is_empty())
                .map(|entry| SnapshotHistory {
                    url: entry.unit_url,
                    last_consumed: to_millis(entry.history.last_consumed),
                    duration: entry.history.duration,
                })
                .collect();
        }
        series.push(entry);
    }
    // Nothing was written; release the read snapshot.
    tx.rollback().await.or_raise(|| ErrorKind::Store)?;

    tracing::Span::current().record("series", series.len());
    Ok(Section { series, categories, sources: sources.into_values().collect() })
}

use crate::error::{ErrorKind, Result};
use crate::snapshot::SnapshotUnit;
use crate::source::SourceRef;
use exn::{OptionExt, ResultExt};
use hoard_model::{Series, Unit};
use hoard_store::Transaction;
use std::collections::{BTreeMap, HashMap, HashSet};
use time::UtcDateTime;
use tracing::instrument;

/// Units written by a merge, all carrying their local ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitMerge {
    pub updated: Vec<Unit>,
    pub inserted: Vec<Unit>,
}
impl UnitMerge {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.inserted.is_empty()
    }
}

/// Merge an incoming copy of a unit over the local one.
///
/// The result is the incoming unit with the local identity and source
/// fields, where consumption never regresses: a consumed local unit stays
/// consumed at its local position, an unset incoming position keeps the
/// local one, and a bookmark on either side survives.
pub fn merge_unit(local: &Unit, incoming: Unit) -> Unit {
    let mut merged = Unit {
        id: local.id,
        series_id: local.series_id,
        name: local.name.clone(),
        scanlator: local.scanlator.clone(),
        number: local.number,
        uploaded_at: local.uploaded_at,
        fetched_at: local.fetched_at,
        source_order: local.source_order,
        ..incoming
    };
    if local.consumed && !merged.consumed {
        merged.consumed = true;
        merged.last_position = local.last_position;
    }
    if merged.last_position == 0 && local.last_position != 0 {
        merged.last_position = local.last_position;
    }
    merged.bookmark |= local.bookmark;
    merged
}

/// Merge snapshot units into the units of a series, matched by url.
///
/// Matched units go through [`merge_unit`] and are only written if that
/// changed something; unmatched units are inserted.
#[instrument(skip(tx, incoming), fields(count = incoming.len()))]
pub async fn restore_units(tx: &mut Transaction, series_id: i64, incoming: &[SnapshotUnit]) -> Result<UnitMerge> {
    let local: HashMap<String, Unit> = tx
        .units_for_series(series_id)
        .await
        .or_raise(|| ErrorKind::Store)?
        .into_iter()
        .map(|unit| (unit.url.clone(), unit))
        .collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(incoming.len());
    let mut merge = UnitMerge::default();
    for snapshot in incoming {
        if !seen.insert(snapshot.url.as_str()) {
            continue;
        }
        let unit = snapshot.to_unit(series_id)?;
        match local.get(&unit.url) {
            Some(existing) => {
                let merged = merge_unit(existing, unit);
                if merged != *existing {
                    merge.updated.push(merged);
                }
            },
            None => merge.inserted.push(unit),
        }
    }
    write(tx, &mut merge).await?;
    Ok(merge)
}

/// Refresh the units of a series from its content source, then re-apply
/// snapshot progress if the source produced anything new.
///
/// New urls are inserted and changed source fields are updated; units the
/// source no longer lists are kept. Fails with
/// [`SourceUnavailable`](ErrorKind::SourceUnavailable) for a stub source
/// before anything is written.
#[instrument(skip_all, fields(source = source.id(), url = %series.url))]
pub async fn refresh_units(
    source: &SourceRef,
    tx: &mut Transaction,
    series: &Series,
    incoming: &[SnapshotUnit],
) -> Result<UnitMerge> {
    let series_id = series.id.ok_or_raise(|| ErrorKind::Store)?;
    let fetched = source.fetch_units(series).await?;

    let local: HashMap<String, Unit> = tx
        .units_for_series(series_id)
        .await
        .or_raise(|| ErrorKind::Store)?
        .into_iter()
        .map(|unit| (unit.url.clone(), unit))
        .collect();
    let now = UtcDateTime::now();
    let mut seen: HashSet<String> = HashSet::with_capacity(fetched.len());
    let mut merge = UnitMerge::default();
    for (order, fresh) in fetched.into_iter().enumerate() {
        if !seen.insert(fresh.url.clone()) {
            continue;
        }
        let fresh = Unit {
            id: None,
            series_id: Some(series_id),
            source_order: i32::try_from(order).unwrap_or(i32::MAX),
            ..fresh
        };
        match local.get(&fresh.url) {
            Some(existing) if existing.source_fields_differ(&fresh) => {
                merge.updated.push(Unit {
                    name: fresh.name,
                    scanlator: fresh.scanlator,
                    number: fresh.number,
                    uploaded_at: fresh.uploaded_at,
                    source_order: fresh.source_order,
                    ..existing.clone()
                });
            },
            Some(_) => {},
            None => merge.inserted.push(Unit { fetched_at: Some(now), ..fresh }),
        }
    }
    write(tx, &mut merge).await?;
    tracing::debug!(inserted = merge.inserted.len(), updated = merge.updated.len(), "synced units with source");

    if merge.inserted.is_empty() {
        return Ok(merge);
    }
    let progress = restore_units(tx, series_id, incoming).await?;
    Ok(combine(merge, progress))
}

async fn write(tx: &mut Transaction, merge: &mut UnitMerge) -> Result<()> {
    tx.update_units(&merge.updated).await.or_raise(|| ErrorKind::Store)?;
    let ids = tx.insert_units(&merge.inserted).await.or_raise(|| ErrorKind::Store)?;
    for (unit, id) in merge.inserted.iter_mut().zip(ids) {
        unit.id = Some(id);
    }
    Ok(())
}

/// Fold a later merge into an earlier one. A unit written by both is
/// reported once, in its latest state.
fn combine(first: UnitMerge, second: UnitMerge) -> UnitMerge {
    let mut inserted: BTreeMap<i64, Unit> = BTreeMap::new();
    let mut updated: BTreeMap<i64, Unit> = BTreeMap::new();
    for unit in first.inserted.into_iter().chain(second.inserted) {
        inserted.insert(unit.id.unwrap_or_default(), unit);
    }
    for unit in first.updated.into_iter().chain(second.updated) {
        let id = unit.id.unwrap_or_default();
        match inserted.get_mut(&id) {
            Some(slot) => *slot = unit,
            None => {
                updated.insert(id, unit);
            },
        }
    }
    UnitMerge { updated: updated.into_values().collect(), inserted: inserted.into_values().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ContentSource, SourceHandle};
    use crate::test_support::{library, seed};
    use async_trait::async_trait;
    use hoard_model::Medium;
    use rstest::rstest;
    use std::sync::Arc;

    fn local(consumed: bool, bookmark: bool, last_position: i64) -> Unit {
        Unit { id: Some(1), series_id: Some(1), consumed, bookmark, last_position, ..Unit::new("/c/1", "Local", 1.0) }
    }

    fn incoming(consumed: bool, bookmark: bool, last_position: i64) -> Unit {
        Unit { consumed, bookmark, last_position, ..Unit::new("/c/1", "Incoming", 1.5) }
    }

    #[rstest]
    // Consumed locally, not in the snapshot: local state and position survive.
    #[case(local(true, false, 42), incoming(false, false, 0), (true, false, 42))]
    #[case(local(true, false, 42), incoming(false, false, 7), (true, false, 42))]
    // Consumed in the snapshot: snapshot position wins unless unset.
    #[case(local(false, false, 42), incoming(true, false, 7), (true, false, 7))]
    #[case(local(false, false, 42), incoming(true, false, 0), (true, false, 42))]
    #[case(local(false, false, 0), incoming(false, false, 0), (false, false, 0))]
    // Bookmarks are OR'd.
    #[case(local(false, true, 0), incoming(false, false, 0), (false, true, 0))]
    #[case(local(false, false, 0), incoming(false, true, 0), (false, true, 0))]
    fn test_merge_unit(#[case] local: Unit, #[case] incoming: Unit, #[case] expected: (bool, bool, i64)) {
        let merged = merge_unit(&local, incoming);
        assert_eq!((merged.consumed, merged.bookmark, merged.last_position), expected);
        assert_eq!(merged.id, local.id);
        assert_eq!(merged.name, "Local", "source fields stay local");
        assert_eq!(merged.number, 1.0);
    }

    #[tokio::test]
    async fn test_consumed_unit_is_not_regressed() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();

        let snapshot = SnapshotUnit::from(&Unit::new("/c/1", "Chapter 1", 1.0));
        let merge = restore_units(&mut tx, series_id, &[snapshot]).await.unwrap();
        assert!(merge.is_empty(), "nothing would change");

        let stored = tx.unit_by_url(series_id, "/c/1").await.unwrap().unwrap();
        assert!(stored.consumed);
        assert_eq!(stored.last_position, 42);
    }

    #[tokio::test]
    async fn test_updates_and_inserts_are_split() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();

        let bookmarked = Unit { bookmark: true, ..Unit::new("/c/2", "Chapter 2", 2.0) };
        let fresh = Unit::new("/c/3", "Chapter 3", 3.0);
        let units = [SnapshotUnit::from(&bookmarked), SnapshotUnit::from(&fresh), SnapshotUnit::from(&fresh)];
        let merge = restore_units(&mut tx, series_id, &units).await.unwrap();

        assert_eq!(merge.updated.len(), 1);
        assert!(merge.updated[0].bookmark);
        assert_eq!(merge.inserted.len(), 1, "duplicate urls are merged once");
        assert!(merge.inserted[0].id.is_some());
        assert_eq!(tx.units_for_series(series_id).await.unwrap().len(), 3);
    }

    struct Listing(Vec<Unit>);

    #[async_trait]
    impl ContentSource for Listing {
        fn id(&self) -> i64 {
            1
        }

        fn name(&self) -> &str {
            "Listing"
        }

        async fn fetch_units(&self, _series: &Series) -> Result<Vec<Unit>> {
            Ok(self.0.clone())
        }
    }

    fn source(units: Vec<Unit>) -> SourceRef {
        let handle: SourceHandle = Arc::new(Listing(units));
        SourceRef::Installed(handle)
    }

    #[tokio::test]
    async fn test_refresh_inserts_new_units_and_reapplies_progress() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();
        let series = tx.series_by_key(1, "/title/1").await.unwrap().unwrap();

        let renamed = Unit::new("/c/1", "Chapter 1: Renamed", 1.0);
        let unchanged = Unit { source_order: 1, ..Unit::new("/c/2", "Chapter 2", 2.0) };
        let brand_new = Unit::new("/c/3", "Chapter 3", 3.0);
        let backup = [SnapshotUnit::from(&Unit { consumed: true, last_position: 5, ..brand_new.clone() })];

        let merge = refresh_units(&source(vec![renamed, unchanged, brand_new]), &mut tx, &series, &backup)
            .await
            .unwrap();
        assert_eq!(merge.inserted.len(), 1);
        assert!(merge.inserted[0].consumed, "snapshot progress applied to the new unit");
        assert_eq!(merge.updated.len(), 1);
        assert_eq!(merge.updated[0].name, "Chapter 1: Renamed");

        let first = tx.unit_by_url(series_id, "/c/1").await.unwrap().unwrap();
        assert!(first.consumed, "refresh never touches progress");
        let third = tx.unit_by_url(series_id, "/c/3").await.unwrap().unwrap();
        assert_eq!(third.last_position, 5);
        assert!(third.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_never_deletes() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();
        let series = tx.series_by_key(1, "/title/1").await.unwrap().unwrap();

        let merge = refresh_units(&source(Vec::new()), &mut tx, &series, &[]).await.unwrap();
        assert!(merge.is_empty());
        assert_eq!(tx.units_for_series(series_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_from_stub_fails_before_writing() {
        let library = library(Medium::Manga).await;
        seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();
        let series = tx.series_by_key(1, "/title/1").await.unwrap().unwrap();

        let err = refresh_units(&SourceRef::Stub(1), &mut tx, &series, &[]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::SourceUnavailable(1)));
    }
}

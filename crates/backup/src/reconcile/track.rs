use crate::error::{ErrorKind, Result};
use crate::snapshot::SnapshotTrack;
use exn::ResultExt;
use hoard_model::Track;
use hoard_store::Transaction;
use std::collections::BTreeMap;
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMerge {
    pub updated: Vec<Track>,
    pub inserted: Vec<Track>,
}

enum State {
    Unchanged,
    Updated,
    New,
}

/// Merge tracker links into the tracks of a series, matched by sync service.
///
/// A matched track takes the snapshot's remote media and library ids when
/// they differ and the higher of the two progress counters. Unmatched
/// tracks are inserted with a fresh id.
#[instrument(skip(tx, incoming), fields(count = incoming.len()))]
pub async fn restore_tracks(tx: &mut Transaction, series_id: i64, incoming: &[SnapshotTrack]) -> Result<TrackMerge> {
    let mut tracks: BTreeMap<i32, (Track, State)> = BTreeMap::new();
    for local in tx.tracks_for_series(series_id).await.or_raise(|| ErrorKind::Store)? {
        tracks.insert(local.sync_id, (local, State::Unchanged));
    }

    for snapshot in incoming {
        match tracks.get_mut(&snapshot.sync_id) {
            Some((local, state)) => {
                let mut changed = false;
                if local.media_id != snapshot.media_id {
                    local.media_id = snapshot.media_id;
                    changed = true;
                }
                if local.library_id != snapshot.library_id {
                    local.library_id = snapshot.library_id;
                    changed = true;
                }
                if snapshot.progress > local.progress {
                    local.progress = snapshot.progress;
                    changed = true;
                }
                if changed && matches!(state, State::Unchanged) {
                    *state = State::Updated;
                }
            },
            None => {
                let track = snapshot.to_track(series_id)?;
                tracks.insert(track.sync_id, (track, State::New));
            },
        }
    }

    let mut merge = TrackMerge::default();
    for (track, state) in tracks.into_values() {
        match state {
            State::Unchanged => {},
            State::Updated => merge.updated.push(track),
            State::New => merge.inserted.push(track),
        }
    }
    tx.update_tracks(&merge.updated).await.or_raise(|| ErrorKind::Store)?;
    let ids = tx.insert_tracks(&merge.inserted).await.or_raise(|| ErrorKind::Store)?;
    for (track, id) in merge.inserted.iter_mut().zip(ids) {
        track.id = Some(id);
    }
    Ok(merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{library, seed};
    use hoard_model::Medium;

    fn incoming(sync_id: i32, media_id: i64, progress: f32) -> SnapshotTrack {
        SnapshotTrack::from(&Track { progress, ..Track::new(sync_id, media_id, "Title One") })
    }

    #[tokio::test]
    async fn test_new_service_is_inserted() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();

        let merge = restore_tracks(&mut tx, series_id, &[incoming(9, 100, 10.0)]).await.unwrap();
        assert!(merge.updated.is_empty());
        assert_eq!(merge.inserted.len(), 1);
        let inserted = &merge.inserted[0];
        assert!(inserted.id.is_some());
        assert_eq!(inserted.progress, 10.0);

        let stored = tx.tracks_for_series(series_id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|t| t.sync_id == 9 && t.progress == 10.0));
    }

    #[tokio::test]
    async fn test_progress_never_regresses() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();

        let lower = restore_tracks(&mut tx, series_id, &[incoming(2, 555, 0.5)]).await.unwrap();
        assert_eq!(lower, TrackMerge::default());

        let higher = restore_tracks(&mut tx, series_id, &[incoming(2, 555, 12.0)]).await.unwrap();
        assert_eq!(higher.updated.len(), 1);
        assert_eq!(tx.tracks_for_series(series_id).await.unwrap()[0].progress, 12.0);
    }

    #[tokio::test]
    async fn test_remote_ids_are_corrected() {
        let library = library(Medium::Manga).await;
        let series_id = seed(&library).await;
        let mut tx = library.repository.begin().await.unwrap();

        let mut corrected = incoming(2, 777, 0.0);
        corrected.library_id = Some(31);
        restore_tracks(&mut tx, series_id, &[corrected]).await.unwrap();

        let stored = &tx.tracks_for_series(series_id).await.unwrap()[0];
        assert_eq!(stored.media_id, 777);
        assert_eq!(stored.library_id, Some(31));
        assert_eq!(stored.progress, 1.0, "local progress was higher");
    }
}

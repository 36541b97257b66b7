//! End-to-end capture and restore against real stores and a real snapshot
//! directory.

use async_trait::async_trait;
use hoard_backup::error::{ErrorKind, Result};
use hoard_backup::prefs::{JsonPreferences, MemoryPreferences};
use hoard_backup::snapshot::{SnapshotSeries, SnapshotTrack, SnapshotUnit};
use hoard_backup::source::{ContentSource, SourceRegistry};
use hoard_backup::{
    CaptureSelector, Context, Library, RestoreIssue, RestoreOptions, Snapshot, Target, create_snapshot,
    read_snapshot, restore_snapshot, validate,
};
use hoard_compress::Compression;
use hoard_model::{Category, Medium, Series, Track, Unit};
use hoard_storage::StorageBackend;
use hoard_storage::backend::LocalBackend;
use hoard_store::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    ctx: Context,
    backend: LocalBackend,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let manga = Database::connect(dir.path().join("manga.db")).await.unwrap();
    let anime = Database::connect(dir.path().join("anime.db")).await.unwrap();
    let ctx = Context {
        manga: Library::new(Medium::Manga, manga.repository()),
        anime: Library::new(Medium::Anime, anime.repository()),
        preferences: Arc::new(JsonPreferences::new(dir.path().join("preferences.json"))),
    };
    let backend = LocalBackend::new("snapshots", dir.path().join("snapshots")).unwrap();
    Fixture { dir, ctx, backend }
}

async fn in_memory_context() -> Context {
    Context {
        manga: Library::new(Medium::Manga, Database::connect_in_memory().await.unwrap().repository()),
        anime: Library::new(Medium::Anime, Database::connect_in_memory().await.unwrap().repository()),
        preferences: Arc::new(MemoryPreferences::default()),
    }
}

/// A favourite series with unit A read at position 42, in category "Reading".
async fn seed(library: &Library) -> i64 {
    let mut tx = library.repository.begin().await.unwrap();
    let series_id = tx.insert_series(&Series::new(1, "/series/a", "Series A")).await.unwrap();
    let category = tx.insert_category(&Category::new("Reading", 0)).await.unwrap();
    tx.replace_series_categories(series_id, &[category]).await.unwrap();
    let unit = Unit { series_id: Some(series_id), consumed: true, last_position: 42, ..Unit::new("/a", "A", 1.0) };
    tx.insert_units(&[unit]).await.unwrap();
    tx.commit().await.unwrap();
    series_id
}

fn incoming_series(units: Vec<SnapshotUnit>, tracks: Vec<SnapshotTrack>) -> Snapshot {
    let mut series = SnapshotSeries::from_series(&Series::new(1, "/series/a", "Series A"));
    series.units = units;
    series.tracks = tracks;
    let mut snapshot = Snapshot::default();
    snapshot.manga.series.push(series);
    snapshot
}

#[tokio::test]
async fn test_read_unit_is_not_regressed_by_an_older_snapshot() {
    let ctx = in_memory_context().await;
    let series_id = seed(&ctx.manga).await;
    let stale = SnapshotUnit::from(&Unit::new("/a", "A", 1.0));

    restore_snapshot(&ctx, &incoming_series(vec![stale], vec![]), CaptureSelector::all(), RestoreOptions::default())
        .await
        .unwrap();

    let mut tx = ctx.manga.repository.begin().await.unwrap();
    let unit = tx.unit_by_url(series_id, "/a").await.unwrap().unwrap();
    assert!(unit.consumed);
    assert_eq!(unit.last_position, 42);
}

#[tokio::test]
async fn test_unknown_tracking_service_gets_a_new_track() {
    let ctx = in_memory_context().await;
    let series_id = seed(&ctx.manga).await;
    let track = SnapshotTrack::from(&Track { id: Some(999), progress: 10.0, ..Track::new(5, 1234, "Series A") });

    let report =
        restore_snapshot(&ctx, &incoming_series(vec![], vec![track]), CaptureSelector::all(), RestoreOptions::default())
            .await
            .unwrap();
    assert_eq!(report.tracks_inserted, 1);

    let mut tx = ctx.manga.repository.begin().await.unwrap();
    let tracks = tx.tracks_for_series(series_id).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].sync_id, 5);
    assert_eq!(tracks[0].progress, 10.0);
    assert!(tracks[0].id.is_some());
}

#[tokio::test]
async fn test_categories_only_capture() {
    let f = fixture().await;
    seed(&f.ctx.manga).await;
    let path = create_snapshot(
        &f.ctx,
        &f.backend,
        Target::Manual(PathBuf::from("categories.json.gz")),
        CaptureSelector::from_bits(0x01),
        Compression::Gzip,
    )
    .await
    .unwrap();

    let snapshot = read_snapshot(&f.backend, &path).await.unwrap();
    assert!(!snapshot.manga.categories.is_empty());
    for series in &snapshot.manga.series {
        assert!(series.units.is_empty());
        assert!(series.history.is_empty());
        assert!(series.tracks.is_empty());
    }
}

#[tokio::test]
async fn test_two_captures_restore_without_duplicate_categories() {
    let f = fixture().await;
    seed(&f.ctx.manga).await;
    let mut snapshots = Vec::new();
    for name in ["first.json", "second.json"] {
        let target = Target::Manual(PathBuf::from(name));
        let path = create_snapshot(&f.ctx, &f.backend, target, CaptureSelector::all(), Compression::None).await.unwrap();
        snapshots.push(read_snapshot(&f.backend, &path).await.unwrap());
    }

    let empty = in_memory_context().await;
    for snapshot in &snapshots {
        restore_snapshot(&empty, snapshot, CaptureSelector::all(), RestoreOptions::default()).await.unwrap();
    }
    let mut tx = empty.manga.repository.begin().await.unwrap();
    let names: Vec<String> = tx.categories().await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Reading"]);
}

#[tokio::test]
async fn test_automatic_retention_keeps_the_configured_count() {
    let f = fixture().await;
    let older = [
        "automatic/hoard_2021-05-01_10-00.snapshot.json.gz",
        "automatic/hoard_2021-05-02_10-00.snapshot.json.gz",
        "automatic/hoard_2021-05-03_10-00.snapshot.json.gz",
    ];
    for name in older {
        f.backend.write(Path::new(name), b"{}").await.unwrap();
    }

    let path = create_snapshot(&f.ctx, &f.backend, Target::Automatic { keep: 3 }, CaptureSelector::all(), Compression::Gzip)
        .await
        .unwrap();

    let mut remaining: Vec<PathBuf> =
        f.backend.list(Some(Path::new("automatic"))).await.unwrap().into_iter().map(|file| file.path).collect();
    remaining.sort();
    assert_eq!(remaining, vec![PathBuf::from(older[1]), PathBuf::from(older[2]), path]);
    assert!(f.dir.path().join("snapshots").join(&remaining[2]).is_file());
}

struct Catalogue;

#[async_trait]
impl ContentSource for Catalogue {
    fn id(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "Catalogue"
    }

    async fn fetch_units(&self, series: &Series) -> Result<Vec<Unit>> {
        if series.url != "/series/a" {
            exn::bail!(ErrorKind::Source);
        }
        Ok(vec![Unit::new("/a", "A", 1.0), Unit::new("/b", "B", 2.0)])
    }
}

#[tokio::test]
async fn test_restore_refreshes_units_from_installed_sources() {
    let f = fixture().await;
    seed(&f.ctx.manga).await;
    let path = create_snapshot(
        &f.ctx,
        &f.backend,
        Target::Manual(PathBuf::from("full.json.bz2")),
        CaptureSelector::all(),
        Compression::Bzip2,
    )
    .await
    .unwrap();
    let snapshot = read_snapshot(&f.backend, &path).await.unwrap();

    let mut target = in_memory_context().await;
    assert!(!validate(&target, &snapshot).all_sources_installed());
    target.manga = target.manga.with_sources(SourceRegistry::new().with(Arc::new(Catalogue)));
    assert!(validate(&target, &snapshot).all_sources_installed());

    let report = restore_snapshot(&target, &snapshot, CaptureSelector::all(), RestoreOptions::default()).await.unwrap();
    assert!(report.issues.iter().all(|issue| !matches!(issue, RestoreIssue::StubSource { .. })));
    assert_eq!(report.units_inserted, 2, "one from the snapshot, one from the source");

    let mut tx = target.manga.repository.begin().await.unwrap();
    let series = tx.series_by_key(1, "/series/a").await.unwrap().unwrap();
    let units = tx.units_for_series(series.id.unwrap()).await.unwrap();
    assert_eq!(units.len(), 2);
    assert!(units.iter().any(|unit| unit.url == "/a" && unit.consumed && unit.last_position == 42));
}

#[tokio::test]
async fn test_preferences_round_trip_through_a_file() {
    let f = fixture().await;
    std::fs::write(f.dir.path().join("preferences.json"), r#"{"reader.zoom": 1.5, "sources.hidden": ["x"]}"#)
        .unwrap();
    let path = create_snapshot(
        &f.ctx,
        &f.backend,
        Target::Manual(PathBuf::from("prefs.json")),
        CaptureSelector::from_bits(0x10),
        Compression::None,
    )
    .await
    .unwrap();
    let snapshot = read_snapshot(&f.backend, &path).await.unwrap();
    assert_eq!(snapshot.preferences.len(), 2);

    let target = in_memory_context().await;
    let report = restore_snapshot(&target, &snapshot, CaptureSelector::all(), RestoreOptions::default()).await.unwrap();
    assert_eq!(report.preferences, 2);
}

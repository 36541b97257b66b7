//! Repository and transaction scope for the library store.
//!
//! Every read and write goes through a [`Transaction`]: a snapshot capture
//! reads one consistent state of the store, and a restore either lands in
//! full or not at all. A dry-run repository hands out transactions that roll
//! back instead of committing, so a restore can be rehearsed against the real
//! data.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{CategoryRow, HistoryRow, HistoryUrlRow, SeriesRow, TrackRow, UnitRow};
use exn::{OptionExt, ResultExt};
use hoard_model::{Category, History, Series, Track, Unit, millis};
use sqlx::{Sqlite, SqlitePool};
use tracing::instrument;

/// A history row paired with the url of its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub history: History,
    pub unit_url: String,
}

/// Entry point to one library store.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    /// Same store, but transactions roll back instead of committing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Open a transaction. Dropping it without [`commit`](Transaction::commit) rolls back.
    pub async fn begin(&self) -> Result<Transaction> {
        let tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Ok(Transaction { tx, dry_run: self.dry_run })
    }
}

/// An open transaction against one library store.
pub struct Transaction {
    tx: sqlx::Transaction<'static, Sqlite>,
    dry_run: bool,
}
impl Transaction {
    /// Commit everything written through this transaction.
    ///
    /// For a dry-run repository this rolls back instead.
    pub async fn commit(self) -> Result<()> {
        if self.dry_run {
            tracing::info!("dry run: rolling back store transaction");
            return self.rollback().await;
        }
        self.tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Series
    // =========================================================================

    /// List every series in the library (favourite flag set).
    pub async fn favorite_series(&mut self) -> Result<Vec<Series>> {
        let rows: Vec<SeriesRow> = sqlx::query_as(include_str!("../queries/list_favorite_series.sql"))
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Series::try_from).collect()
    }

    /// Look a series up by its natural key.
    pub async fn series_by_key(&mut self, source: i64, url: &str) -> Result<Option<Series>> {
        let row: Option<SeriesRow> = sqlx::query_as(include_str!("../queries/get_series_by_key.sql"))
            .bind(source)
            .bind(url)
            .fetch_optional(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Series::try_from).transpose()
    }

    /// Insert a series, returning its newly assigned id.
    #[instrument(skip_all, fields(source = series.source, url = %series.url))]
    pub async fn insert_series(&mut self, series: &Series) -> Result<i64> {
        let row = SeriesRow::try_from(series)?;
        let result = sqlx::query(include_str!("../queries/insert_series.sql"))
            .bind(row.source)
            .bind(row.url)
            .bind(row.title)
            .bind(row.author)
            .bind(row.artist)
            .bind(row.description)
            .bind(row.genres)
            .bind(row.status)
            .bind(row.cover_url)
            .bind(row.favorite)
            .bind(row.initialized)
            .bind(row.added_at)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite the descriptive fields of an existing series.
    ///
    /// The natural key and `added_at` are never changed.
    pub async fn update_series(&mut self, series: &Series) -> Result<()> {
        let id = series.id.ok_or_raise(|| ErrorKind::MissingId("series"))?;
        let row = SeriesRow::try_from(series)?;
        sqlx::query(include_str!("../queries/update_series.sql"))
            .bind(row.title)
            .bind(row.author)
            .bind(row.artist)
            .bind(row.description)
            .bind(row.genres)
            .bind(row.status)
            .bind(row.cover_url)
            .bind(row.favorite)
            .bind(row.initialized)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Units
    // =========================================================================

    pub async fn units_for_series(&mut self, series_id: i64) -> Result<Vec<Unit>> {
        let rows: Vec<UnitRow> = sqlx::query_as(include_str!("../queries/list_units_for_series.sql"))
            .bind(series_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Unit::try_from).collect()
    }

    pub async fn unit_by_url(&mut self, series_id: i64, url: &str) -> Result<Option<Unit>> {
        let row: Option<UnitRow> = sqlx::query_as(include_str!("../queries/get_unit_by_url.sql"))
            .bind(series_id)
            .bind(url)
            .fetch_optional(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Unit::try_from).transpose()
    }

    /// Insert units, returning their new ids in input order.
    #[instrument(skip_all, fields(count = units.len()))]
    pub async fn insert_units(&mut self, units: &[Unit]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(units.len());
        for unit in units {
            let row = UnitRow::try_from(unit)?;
            let result = sqlx::query(include_str!("../queries/insert_unit.sql"))
                .bind(row.series_id)
                .bind(row.url)
                .bind(row.name)
                .bind(row.scanlator)
                .bind(row.number)
                .bind(row.consumed)
                .bind(row.bookmark)
                .bind(row.last_position)
                .bind(row.uploaded_at)
                .bind(row.fetched_at)
                .bind(row.source_order)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            ids.push(result.last_insert_rowid());
        }
        Ok(ids)
    }

    /// Update units that already carry their local id.
    #[instrument(skip_all, fields(count = units.len()))]
    pub async fn update_units(&mut self, units: &[Unit]) -> Result<()> {
        for unit in units {
            let id = unit.id.ok_or_raise(|| ErrorKind::MissingId("unit"))?;
            let row = UnitRow::try_from(unit)?;
            sqlx::query(include_str!("../queries/update_unit.sql"))
                .bind(row.name)
                .bind(row.scanlator)
                .bind(row.number)
                .bind(row.consumed)
                .bind(row.bookmark)
                .bind(row.last_position)
                .bind(row.uploaded_at)
                .bind(row.fetched_at)
                .bind(row.source_order)
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Every category in the store, by display order.
    pub async fn categories(&mut self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(include_str!("../queries/list_categories.sql"))
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Category::try_from).collect()
    }

    pub async fn categories_for_series(&mut self, series_id: i64) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(include_str!("../queries/list_categories_for_series.sql"))
            .bind(series_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Category::try_from).collect()
    }

    /// Insert a category, returning its newly assigned id.
    pub async fn insert_category(&mut self, category: &Category) -> Result<i64> {
        let result = sqlx::query(include_str!("../queries/insert_category.sql"))
            .bind(&category.name)
            .bind(category.order)
            .bind(category.flags)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    /// Replace every category membership of a series with `category_ids`.
    pub async fn replace_series_categories(&mut self, series_id: i64, category_ids: &[i64]) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_series_categories.sql"))
            .bind(series_id)
            .execute(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for category_id in category_ids {
            sqlx::query(include_str!("../queries/insert_series_category.sql"))
                .bind(series_id)
                .bind(category_id)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// All history of a series, most recent first, with the url of each unit.
    pub async fn history_for_series(&mut self, series_id: i64) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryUrlRow> = sqlx::query_as(include_str!("../queries/list_history_for_series.sql"))
            .bind(series_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter()
            .map(|row| -> Result<HistoryEntry> {
                Ok(HistoryEntry { history: History::try_from(row.history)?, unit_url: row.url })
            })
            .collect()
    }

    pub async fn history_by_unit_url(&mut self, series_id: i64, url: &str) -> Result<Option<History>> {
        let row: Option<HistoryRow> = sqlx::query_as(include_str!("../queries/get_history_by_unit_url.sql"))
            .bind(series_id)
            .bind(url)
            .fetch_optional(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(History::try_from).transpose()
    }

    /// Insert history rows, or overwrite the existing row of the same unit.
    #[instrument(skip_all, fields(count = rows.len()))]
    pub async fn upsert_history(&mut self, rows: &[History]) -> Result<()> {
        for history in rows {
            sqlx::query(include_str!("../queries/upsert_history.sql"))
                .bind(history.unit_id)
                .bind(millis::to_millis(history.last_consumed))
                .bind(history.duration)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    pub async fn tracks_for_series(&mut self, series_id: i64) -> Result<Vec<Track>> {
        let rows: Vec<TrackRow> = sqlx::query_as(include_str!("../queries/list_tracks_for_series.sql"))
            .bind(series_id)
            .fetch_all(&mut *self.tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Track::try_from).collect()
    }

    /// Insert tracks, returning their new ids in input order.
    pub async fn insert_tracks(&mut self, tracks: &[Track]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(tracks.len());
        for track in tracks {
            let row = TrackRow::try_from(track)?;
            let result = sqlx::query(include_str!("../queries/insert_track.sql"))
                .bind(row.series_id)
                .bind(row.sync_id)
                .bind(row.media_id)
                .bind(row.library_id)
                .bind(row.title)
                .bind(row.progress)
                .bind(row.total)
                .bind(row.status)
                .bind(row.score)
                .bind(row.tracking_url)
                .bind(row.started_at)
                .bind(row.finished_at)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            ids.push(result.last_insert_rowid());
        }
        Ok(ids)
    }

    /// Update tracks that already carry their local id.
    pub async fn update_tracks(&mut self, tracks: &[Track]) -> Result<()> {
        for track in tracks {
            let id = track.id.ok_or_raise(|| ErrorKind::MissingId("track"))?;
            let row = TrackRow::try_from(track)?;
            sqlx::query(include_str!("../queries/update_track.sql"))
                .bind(row.media_id)
                .bind(row.library_id)
                .bind(row.title)
                .bind(row.progress)
                .bind(row.total)
                .bind(row.status)
                .bind(row.score)
                .bind(row.tracking_url)
                .bind(row.started_at)
                .bind(row.finished_at)
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }
}

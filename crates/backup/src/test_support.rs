//! Shared fixtures for the in-crate tests.

use crate::context::{Context, Library};
use crate::prefs::MemoryPreferences;
use hoard_model::millis::from_millis;
use hoard_model::{Category, History, Medium, Series, Track, Unit};
use hoard_store::Database;
use std::sync::Arc;

pub(crate) async fn library(medium: Medium) -> Library {
    Library::new(medium, Database::connect_in_memory().await.unwrap().repository())
}

pub(crate) async fn context() -> Context {
    let preferences = serde_json::json!({"reader.theme": "dark"}).as_object().cloned().unwrap();
    Context {
        manga: library(Medium::Manga).await,
        anime: library(Medium::Anime).await,
        preferences: Arc::new(MemoryPreferences::new(preferences)),
    }
}

/// One favourite series with two units (the first consumed, with history),
/// one category membership and one track, plus a non-favourite series.
/// Returns the favourite's id.
pub(crate) async fn seed(library: &Library) -> i64 {
    let mut tx = library.repository.begin().await.unwrap();
    let mut series = Series::new(1, "/title/1", "Title One");
    series.description = Some("The first one.".to_string());
    series.initialized = true;
    let series_id = tx.insert_series(&series).await.unwrap();

    let mut hidden = Series::new(1, "/title/2", "Browsed once");
    hidden.favorite = false;
    tx.insert_series(&hidden).await.unwrap();

    let reading = tx.insert_category(&Category::new("Reading", 1)).await.unwrap();
    tx.insert_category(&Category::new("Done", 2)).await.unwrap();
    tx.replace_series_categories(series_id, &[reading]).await.unwrap();

    let mut first = Unit::new("/c/1", "Chapter 1", 1.0);
    first.series_id = Some(series_id);
    first.consumed = true;
    first.last_position = 42;
    let mut second = Unit::new("/c/2", "Chapter 2", 2.0);
    second.series_id = Some(series_id);
    second.source_order = 1;
    let unit_ids = tx.insert_units(&[first, second]).await.unwrap();

    let mut history = History::new(unit_ids[0], from_millis(1_700_000_000_000).unwrap());
    history.duration = 60_000;
    tx.upsert_history(&[history]).await.unwrap();

    let mut track = Track::new(2, 555, "Title One");
    track.series_id = Some(series_id);
    track.progress = 1.0;
    tx.insert_tracks(&[track]).await.unwrap();

    tx.commit().await.unwrap();
    series_id
}

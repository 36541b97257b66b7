//! The portable snapshot model.
//!
//! A snapshot never carries local row ids: every record is identified by
//! its natural key (series by source and url, units and history by url,
//! categories by name, tracks by sync service) so it can be merged into a
//! store that assigned different ids. Timestamps are milliseconds since the
//! Unix epoch, with `0` meaning "unknown".

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use hoard_model::millis::{from_millis, from_optional_millis, to_millis};
use hoard_model::{Category, Medium, Series, Track, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::UtcDateTime;

/// Format version written by this build. Decoding rejects anything newer.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub manga: Section,
    #[serde(default)]
    pub anime: Section,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferences: Vec<Preference>,
}
impl Default for Snapshot {
    fn default() -> Self {
        Self { version: FORMAT_VERSION, manga: Section::default(), anime: Section::default(), preferences: Vec::new() }
    }
}
impl Snapshot {
    pub fn section(&self, medium: Medium) -> &Section {
        match medium {
            Medium::Manga => &self.manga,
            Medium::Anime => &self.anime,
        }
    }

    pub fn section_mut(&mut self, medium: Medium) -> &mut Section {
        match medium {
            Medium::Manga => &mut self.manga,
            Medium::Anime => &mut self.anime,
        }
    }
}

/// Everything captured from one library store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub series: Vec<SnapshotSeries>,
    #[serde(default)]
    pub categories: Vec<SnapshotCategory>,
    /// One entry per distinct source referenced by `series`.
    #[serde(default)]
    pub sources: Vec<SourceInfo>,
}
impl Section {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.categories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSeries {
    pub source: i64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub added_at: i64,
    #[serde(default)]
    pub units: Vec<SnapshotUnit>,
    /// Positions in the section's category list of the categories this
    /// series belongs to.
    #[serde(default)]
    pub categories: Vec<i32>,
    #[serde(default)]
    pub tracks: Vec<SnapshotTrack>,
    #[serde(default)]
    pub history: Vec<SnapshotHistory>,
}
impl SnapshotSeries {
    /// Identity and metadata only; units and the rest are attached separately.
    pub fn from_series(series: &Series) -> Self {
        Self {
            source: series.source,
            url: series.url.clone(),
            title: series.title.clone(),
            author: series.author.clone(),
            artist: series.artist.clone(),
            description: series.description.clone(),
            genres: series.genres.clone(),
            status: series.status,
            cover_url: series.cover_url.clone(),
            added_at: to_millis(series.added_at),
            units: Vec::new(),
            categories: Vec::new(),
            tracks: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Rebuild the series record, without a local id.
    pub fn to_series(&self) -> Result<Series> {
        let added_at = from_optional_millis(Some(self.added_at)).or_raise(|| ErrorKind::Encoding)?;
        Ok(Series {
            id: None,
            source: self.source,
            url: self.url.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            artist: self.artist.clone(),
            description: self.description.clone(),
            genres: self.genres.clone(),
            status: self.status,
            cover_url: self.cover_url.clone(),
            favorite: true,
            initialized: false,
            added_at: added_at.unwrap_or_else(UtcDateTime::now),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotUnit {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub scanlator: Option<String>,
    #[serde(default)]
    pub number: f32,
    #[serde(default)]
    pub consumed: bool,
    #[serde(default)]
    pub bookmark: bool,
    #[serde(default)]
    pub last_position: i64,
    #[serde(default)]
    pub uploaded_at: i64,
    #[serde(default)]
    pub fetched_at: i64,
    #[serde(default)]
    pub source_order: i32,
}
impl From<&Unit> for SnapshotUnit {
    fn from(unit: &Unit) -> Self {
        Self {
            url: unit.url.clone(),
            name: unit.name.clone(),
            scanlator: unit.scanlator.clone(),
            number: unit.number,
            consumed: unit.consumed,
            bookmark: unit.bookmark,
            last_position: unit.last_position,
            uploaded_at: unit.uploaded_at.map(to_millis).unwrap_or_default(),
            fetched_at: unit.fetched_at.map(to_millis).unwrap_or_default(),
            source_order: unit.source_order,
        }
    }
}
impl SnapshotUnit {
    pub fn to_unit(&self, series_id: i64) -> Result<Unit> {
        Ok(Unit {
            id: None,
            series_id: Some(series_id),
            url: self.url.clone(),
            name: self.name.clone(),
            scanlator: self.scanlator.clone(),
            number: self.number,
            consumed: self.consumed,
            bookmark: self.bookmark,
            last_position: self.last_position,
            uploaded_at: from_optional_millis(Some(self.uploaded_at)).or_raise(|| ErrorKind::Encoding)?,
            fetched_at: from_optional_millis(Some(self.fetched_at)).or_raise(|| ErrorKind::Encoding)?,
            source_order: self.source_order,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCategory {
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub flags: i64,
}
impl From<&Category> for SnapshotCategory {
    fn from(category: &Category) -> Self {
        Self { name: category.name.clone(), order: category.order, flags: category.flags }
    }
}
impl From<&SnapshotCategory> for Category {
    fn from(category: &SnapshotCategory) -> Self {
        Self { id: None, name: category.name.clone(), order: category.order, flags: category.flags }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTrack {
    pub sync_id: i32,
    pub media_id: i64,
    #[serde(default)]
    pub library_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub total: i32,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub tracking_url: String,
    #[serde(default)]
    pub started_at: i64,
    #[serde(default)]
    pub finished_at: i64,
}
impl From<&Track> for SnapshotTrack {
    fn from(track: &Track) -> Self {
        Self {
            sync_id: track.sync_id,
            media_id: track.media_id,
            library_id: track.library_id,
            title: track.title.clone(),
            progress: track.progress,
            total: track.total,
            status: track.status,
            score: track.score,
            tracking_url: track.tracking_url.clone(),
            started_at: track.started_at.map(to_millis).unwrap_or_default(),
            finished_at: track.finished_at.map(to_millis).unwrap_or_default(),
        }
    }
}
impl SnapshotTrack {
    pub fn to_track(&self, series_id: i64) -> Result<Track> {
        Ok(Track {
            id: None,
            series_id: Some(series_id),
            sync_id: self.sync_id,
            media_id: self.media_id,
            library_id: self.library_id,
            title: self.title.clone(),
            progress: self.progress,
            total: self.total,
            status: self.status,
            score: self.score,
            tracking_url: self.tracking_url.clone(),
            started_at: from_optional_millis(Some(self.started_at)).or_raise(|| ErrorKind::Encoding)?,
            finished_at: from_optional_millis(Some(self.finished_at)).or_raise(|| ErrorKind::Encoding)?,
        })
    }
}

/// When the unit at `url` was last consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHistory {
    pub url: String,
    pub last_consumed: i64,
    #[serde(default)]
    pub duration: i64,
}
impl SnapshotHistory {
    pub fn last_consumed(&self) -> Result<UtcDateTime> {
        from_millis(self.last_consumed).or_raise(|| ErrorKind::Encoding)
    }
}

/// A content source as it was known when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: i64,
    pub name: String,
}

/// One entry from the host application's preference store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub key: String,
    pub value: PreferenceValue,
}

/// The closed set of preference value kinds a snapshot can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PreferenceValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Bool(bool),
    String(String),
    StringSet(BTreeSet<String>),
}

use super::optional_millis;
use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use hoard_model::{Track, millis};

#[derive(sqlx::FromRow)]
pub(crate) struct TrackRow {
    pub(crate) id: i64,
    pub(crate) series_id: i64,
    pub(crate) sync_id: i32,
    pub(crate) media_id: i64,
    pub(crate) library_id: Option<i64>,
    pub(crate) title: String,
    pub(crate) progress: f64,
    pub(crate) total: i32,
    pub(crate) status: i32,
    pub(crate) score: f64,
    pub(crate) tracking_url: String,
    pub(crate) started_at: Option<i64>,
    pub(crate) finished_at: Option<i64>,
}
impl TryFrom<&Track> for TrackRow {
    type Error = Error;
    fn try_from(track: &Track) -> Result<Self, Self::Error> {
        Ok(Self {
            id: track.id.unwrap_or_default(),
            series_id: track.series_id.ok_or_raise(|| ErrorKind::MissingId("parent series of track"))?,
            sync_id: track.sync_id,
            media_id: track.media_id,
            library_id: track.library_id,
            title: track.title.clone(),
            progress: f64::from(track.progress),
            total: track.total,
            status: track.status,
            score: f64::from(track.score),
            tracking_url: track.tracking_url.clone(),
            started_at: optional_millis(track.started_at),
            finished_at: optional_millis(track.finished_at),
        })
    }
}
impl TryFrom<TrackRow> for Track {
    type Error = Error;
    fn try_from(row: TrackRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(row.id),
            series_id: Some(row.series_id),
            sync_id: row.sync_id,
            media_id: row.media_id,
            library_id: row.library_id,
            title: row.title,
            progress: row.progress as f32,
            total: row.total,
            status: row.status,
            score: row.score as f32,
            tracking_url: row.tracking_url,
            started_at: millis::from_optional_millis(row.started_at).or_raise(|| ErrorKind::InvalidData("start date"))?,
            finished_at: millis::from_optional_millis(row.finished_at)
                .or_raise(|| ErrorKind::InvalidData("finish date"))?,
        })
    }
}

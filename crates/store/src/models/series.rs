use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use hoard_model::{Series, millis};

#[derive(sqlx::FromRow)]
pub(crate) struct SeriesRow {
    pub(crate) id: i64,
    pub(crate) source: i64,
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) author: Option<String>,
    pub(crate) artist: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) genres: String,
    pub(crate) status: i32,
    pub(crate) cover_url: Option<String>,
    pub(crate) favorite: bool,
    pub(crate) initialized: bool,
    pub(crate) added_at: i64,
}
impl TryFrom<&Series> for SeriesRow {
    type Error = Error;
    fn try_from(series: &Series) -> Result<Self, Self::Error> {
        Ok(Self {
            id: series.id.unwrap_or_default(),
            source: series.source,
            url: series.url.clone(),
            title: series.title.clone(),
            author: series.author.clone(),
            artist: series.artist.clone(),
            description: series.description.clone(),
            genres: serde_json::to_string(&series.genres).or_raise(|| ErrorKind::InvalidData("genres"))?,
            status: series.status,
            cover_url: series.cover_url.clone(),
            favorite: series.favorite,
            initialized: series.initialized,
            added_at: millis::to_millis(series.added_at),
        })
    }
}
impl TryFrom<SeriesRow> for Series {
    type Error = Error;
    fn try_from(row: SeriesRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(row.id),
            source: row.source,
            url: row.url,
            title: row.title,
            author: row.author,
            artist: row.artist,
            description: row.description,
            genres: serde_json::from_str(&row.genres).or_raise(|| ErrorKind::InvalidData("genres"))?,
            status: row.status,
            cover_url: row.cover_url,
            favorite: row.favorite,
            initialized: row.initialized,
            added_at: millis::from_millis(row.added_at).or_raise(|| ErrorKind::InvalidData("added at"))?,
        })
    }
}

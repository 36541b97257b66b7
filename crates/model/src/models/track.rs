use time::UtcDateTime;

/// A link between a series and an external tracking service.
///
/// Natural key: `(series_id, sync_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: Option<i64>,
    pub series_id: Option<i64>,
    /// Identifier of the tracking service.
    pub sync_id: i32,
    /// Identifier of the title on the remote service.
    pub media_id: i64,
    /// Identifier of the user's list entry on the remote service, if any.
    pub library_id: Option<i64>,
    pub title: String,
    /// Last consumed unit number as reported to the service.
    pub progress: f32,
    pub total: i32,
    pub status: i32,
    pub score: f32,
    pub tracking_url: String,
    pub started_at: Option<UtcDateTime>,
    pub finished_at: Option<UtcDateTime>,
}
impl Track {
    pub fn new(sync_id: i32, media_id: i64, title: impl Into<String>) -> Self {
        Self {
            id: None,
            series_id: None,
            sync_id,
            media_id,
            library_id: None,
            title: title.into(),
            progress: 0.0,
            total: 0,
            status: 0,
            score: 0.0,
            tracking_url: String::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

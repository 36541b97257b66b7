use time::UtcDateTime;

/// A chapter (manga) or episode (anime).
///
/// Natural key: `url`, unique within the parent series.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: Option<i64>,
    pub series_id: Option<i64>,
    pub url: String,
    pub name: String,
    pub scanlator: Option<String>,
    /// Sequence number; negative when the source could not tell.
    pub number: f32,
    /// Read (manga) or seen (anime).
    pub consumed: bool,
    pub bookmark: bool,
    /// Page index or playback offset; zero means "from the start".
    pub last_position: i64,
    pub uploaded_at: Option<UtcDateTime>,
    pub fetched_at: Option<UtcDateTime>,
    /// Position in the source's own listing.
    pub source_order: i32,
}
impl Unit {
    pub fn new(url: impl Into<String>, name: impl Into<String>, number: f32) -> Self {
        Self {
            id: None,
            series_id: None,
            url: url.into(),
            name: name.into(),
            scanlator: None,
            number,
            consumed: false,
            bookmark: false,
            last_position: 0,
            uploaded_at: None,
            fetched_at: None,
            source_order: 0,
        }
    }

    /// Whether the source-provided fields differ from `other`.
    ///
    /// Progress (consumed, bookmark, position) is not compared.
    pub fn source_fields_differ(&self, other: &Unit) -> bool {
        self.name != other.name
            || self.number != other.number
            || self.scanlator != other.scanlator
            || self.uploaded_at != other.uploaded_at
            || self.source_order != other.source_order
    }
}

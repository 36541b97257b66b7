use time::UtcDateTime;

/// A manga or anime title.
///
/// Natural key: `(source, url)`. Series are never deleted by the snapshot
/// engine; removing one from the library only clears `favorite`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: Option<i64>,
    /// Identifier of the content source the series was added from.
    pub source: i64,
    /// Source-local URL or slug.
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    /// Publication status as reported by the source.
    pub status: i32,
    pub cover_url: Option<String>,
    pub favorite: bool,
    /// Set once full metadata has been fetched from the source.
    pub initialized: bool,
    pub added_at: UtcDateTime,
}
impl Series {
    pub fn new(source: i64, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            source,
            url: url.into(),
            title: title.into(),
            author: None,
            artist: None,
            description: None,
            genres: Vec::new(),
            status: 0,
            cover_url: None,
            favorite: true,
            initialized: false,
            added_at: UtcDateTime::now(),
        }
    }

    /// Whether the series has any descriptive text at all.
    pub fn has_description(&self) -> bool {
        self.description.as_deref().is_some_and(|d| !d.trim().is_empty())
    }
}

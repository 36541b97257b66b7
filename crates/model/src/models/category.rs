/// A user-defined grouping of series.
///
/// Natural key: `name` (case-sensitive, unique per store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    /// Display position. Not unique; snapshots reference categories by list
    /// position instead.
    pub order: i32,
    pub flags: i64,
}
impl Category {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self { id: None, name: name.into(), order, flags: 0 }
    }
}

use super::optional_millis;
use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use hoard_model::{Unit, millis};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UnitRow {
    pub(crate) id: i64,
    pub(crate) series_id: i64,
    pub(crate) url: String,
    pub(crate) name: String,
    pub(crate) scanlator: Option<String>,
    pub(crate) number: f64,
    pub(crate) consumed: bool,
    pub(crate) bookmark: bool,
    pub(crate) last_position: i64,
    pub(crate) uploaded_at: Option<i64>,
    pub(crate) fetched_at: Option<i64>,
    pub(crate) source_order: i32,
}
impl TryFrom<&Unit> for UnitRow {
    type Error = Error;
    fn try_from(unit: &Unit) -> Result<Self, Self::Error> {
        Ok(Self {
            id: unit.id.unwrap_or_default(),
            series_id: unit.series_id.ok_or_raise(|| ErrorKind::MissingId("parent series of unit"))?,
            url: unit.url.clone(),
            name: unit.name.clone(),
            scanlator: unit.scanlator.clone(),
            number: f64::from(unit.number),
            consumed: unit.consumed,
            bookmark: unit.bookmark,
            last_position: unit.last_position,
            uploaded_at: optional_millis(unit.uploaded_at),
            fetched_at: optional_millis(unit.fetched_at),
            source_order: unit.source_order,
        })
    }
}
impl TryFrom<UnitRow> for Unit {
    type Error = Error;
    fn try_from(row: UnitRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(row.id),
            series_id: Some(row.series_id),
            url: row.url,
            name: row.name,
            scanlator: row.scanlator,
            number: row.number as f32,
            consumed: row.consumed,
            bookmark: row.bookmark,
            last_position: row.last_position,
            uploaded_at: millis::from_optional_millis(row.uploaded_at)
                .or_raise(|| ErrorKind::InvalidData("upload date"))?,
            fetched_at: millis::from_optional_millis(row.fetched_at).or_raise(|| ErrorKind::InvalidData("fetch date"))?,
            source_order: row.source_order,
        })
    }
}

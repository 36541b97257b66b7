use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use hoard_model::{History, millis};

#[derive(sqlx::FromRow)]
pub(crate) struct HistoryRow {
    pub(crate) id: i64,
    pub(crate) unit_id: i64,
    pub(crate) last_consumed: i64,
    pub(crate) duration: i64,
}
impl TryFrom<HistoryRow> for History {
    type Error = Error;
    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(row.id),
            unit_id: row.unit_id,
            last_consumed: millis::from_millis(row.last_consumed)
                .or_raise(|| ErrorKind::InvalidData("last consumed date"))?,
            duration: row.duration,
        })
    }
}

/// A history row together with the url of the unit it belongs to.
#[derive(sqlx::FromRow)]
pub(crate) struct HistoryUrlRow {
    #[sqlx(flatten)]
    pub(crate) history: HistoryRow,
    pub(crate) url: String,
}

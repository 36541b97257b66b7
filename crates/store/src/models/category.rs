use crate::error::Error;
use hoard_model::Category;

#[derive(sqlx::FromRow)]
pub(crate) struct CategoryRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) sort: i32,
    pub(crate) flags: i64,
}
impl TryFrom<CategoryRow> for Category {
    type Error = Error;
    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self { id: Some(row.id), name: row.name, order: row.sort, flags: row.flags })
    }
}

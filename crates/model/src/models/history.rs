use time::UtcDateTime;

/// When a unit was last consumed.
///
/// There is at most one history row per unit; across installations it is
/// found again through the unit's url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    pub id: Option<i64>,
    pub unit_id: i64,
    pub last_consumed: UtcDateTime,
    /// Accumulated time spent on the unit, in milliseconds.
    pub duration: i64,
}
impl History {
    pub fn new(unit_id: i64, last_consumed: UtcDateTime) -> Self {
        Self { id: None, unit_id, last_consumed, duration: 0 }
    }
}

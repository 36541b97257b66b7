mod category;
mod history;
mod medium;
mod series;
mod track;
mod unit;

pub use self::category::Category;
pub use self::history::History;
pub use self::medium::Medium;
pub use self::series::Series;
pub use self::track::Track;
pub use self::unit::Unit;

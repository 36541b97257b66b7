use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Which library a series lives in.
///
/// Each medium has its own store with an identical schema, its own set of
/// content sources and its own categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Medium {
    Manga,
    Anime,
}
impl Medium {
    pub const ALL: [Medium; 2] = [Medium::Manga, Medium::Anime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Medium::Manga => "manga",
            Medium::Anime => "anime",
        }
    }

    /// What a single unit of this medium is called, for log output.
    pub fn unit_noun(&self) -> &'static str {
        match self {
            Medium::Manga => "chapter",
            Medium::Anime => "episode",
        }
    }
}
impl FromStr for Medium {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manga" => Ok(Medium::Manga),
            "anime" => Ok(Medium::Anime),
            _ => exn::bail!(ErrorKind::ParseError { field: "medium", value: s.to_string() }),
        }
    }
}
impl Display for Medium {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

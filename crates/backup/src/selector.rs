//! Which optional data categories a snapshot carries.
//!
//! Series identity and metadata are always captured. Everything else is
//! opt-in through a [`CaptureSelector`], which also gates what a restore is
//! allowed to write.
//!
//! Selectors travel as a legacy integer where each category owns a disjoint
//! bit-field slice, described by a `(mask, value)` pair. A category is
//! selected iff `flags & mask == value`; bits outside every slice are
//! ignored so that newer flag values still decode.

use crate::error::{Error, ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slice {
    name: &'static str,
    mask: u32,
    value: u32,
}
impl Slice {
    const fn selects(&self, flags: u32) -> bool {
        flags & self.mask == self.value
    }
}

const CATEGORIES: Slice = Slice { name: "categories", mask: 0x01, value: 0x01 };
const UNITS: Slice = Slice { name: "units", mask: 0x02, value: 0x02 };
const HISTORY: Slice = Slice { name: "history", mask: 0x04, value: 0x04 };
const TRACKING: Slice = Slice { name: "tracking", mask: 0x08, value: 0x08 };
const PREFERENCES: Slice = Slice { name: "preferences", mask: 0x10, value: 0x10 };

/// Decoded capture flags, one boolean per optional data category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSelector {
    pub categories: bool,
    pub units: bool,
    pub history: bool,
    pub tracking: bool,
    pub preferences: bool,
}

impl CaptureSelector {
    /// Every optional category.
    pub const fn all() -> Self {
        Self { categories: true, units: true, history: true, tracking: true, preferences: true }
    }

    /// Series identity and metadata only.
    pub const fn none() -> Self {
        Self { categories: false, units: false, history: false, tracking: false, preferences: false }
    }

    /// Decode a legacy flags value.
    pub const fn from_bits(flags: u32) -> Self {
        Self {
            categories: CATEGORIES.selects(flags),
            units: UNITS.selects(flags),
            history: HISTORY.selects(flags),
            tracking: TRACKING.selects(flags),
            preferences: PREFERENCES.selects(flags),
        }
    }

    /// Encode back into the legacy flags layout.
    pub fn bits(&self) -> u32 {
        self.slices().into_iter().filter(|(_, on)| *on).fold(0, |bits, (slice, _)| bits | slice.value)
    }

    fn slices(&self) -> [(Slice, bool); 5] {
        [
            (CATEGORIES, self.categories),
            (UNITS, self.units),
            (HISTORY, self.history),
            (TRACKING, self.tracking),
            (PREFERENCES, self.preferences),
        ]
    }
}

/// Parses a comma separated list of category names, or `all` / `none`.
impl FromStr for CaptureSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut selector = Self::none();
        for name in s.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name.to_lowercase().as_str() {
                "all" => selector = Self::all(),
                "none" => selector = Self::none(),
                "categories" => selector.categories = true,
                "units" | "chapters" | "episodes" => selector.units = true,
                "history" => selector.history = true,
                "tracking" | "tracks" => selector.tracking = true,
                "preferences" | "prefs" => selector.preferences = true,
                _ => exn::bail!(ErrorKind::InvalidSelector(name.to_string())),
            }
        }
        Ok(selector)
    }
}

impl Display for CaptureSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let names: Vec<&str> = self.slices().into_iter().filter(|(_, on)| *on).map(|(slice, _)| slice.name).collect();
        if names.is_empty() { f.write_str("none") } else { f.write_str(&names.join(",")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x00, CaptureSelector::none())]
    #[case(0x1F, CaptureSelector::all())]
    #[case(0x01, CaptureSelector { categories: true, ..CaptureSelector::none() })]
    #[case(0x0A, CaptureSelector { units: true, tracking: true, ..CaptureSelector::none() })]
    #[case(0xFFFF_FF00, CaptureSelector::none())]
    #[case(0x100 | 0x04, CaptureSelector { history: true, ..CaptureSelector::none() })]
    fn test_from_bits(#[case] flags: u32, #[case] expected: CaptureSelector) {
        assert_eq!(CaptureSelector::from_bits(flags), expected);
    }

    #[test]
    fn test_bits_drop_unknown_flags() {
        assert_eq!(CaptureSelector::from_bits(0xFF).bits(), 0x1F);
        assert_eq!(CaptureSelector::from_bits(0x12).bits(), 0x12);
    }

    #[rstest]
    #[case("", CaptureSelector::none())]
    #[case("all", CaptureSelector::all())]
    #[case("categories", CaptureSelector::from_bits(0x01))]
    #[case("units, history", CaptureSelector::from_bits(0x06))]
    #[case("Tracking,prefs", CaptureSelector::from_bits(0x18))]
    fn test_parse(#[case] input: &str, #[case] expected: CaptureSelector) {
        assert_eq!(input.parse::<CaptureSelector>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_category() {
        let err = "units,covers".parse::<CaptureSelector>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidSelector(name) if name == "covers"));
    }

    #[test]
    fn test_display_parses_back() {
        let selector = CaptureSelector::from_bits(0x15);
        assert_eq!(selector.to_string(), "categories,history,preferences");
        assert_eq!(selector.to_string().parse::<CaptureSelector>().unwrap(), selector);
        assert_eq!(CaptureSelector::none().to_string(), "none");
    }
}

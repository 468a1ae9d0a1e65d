use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Logical grouping a selected file belongs to. Each category installs into
/// one fixed folder on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Roms,
    Bios,
    Saves,
    States,
    Themes,
    Music,
    Screenshots,
    Config,
}

impl Category {
    pub const COUNT: usize = 8;

    /// Iteration order used everywhere archive members are produced.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Roms,
        Category::Bios,
        Category::Saves,
        Category::States,
        Category::Themes,
        Category::Music,
        Category::Screenshots,
        Category::Config,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Roms => "roms",
            Category::Bios => "bios",
            Category::Saves => "saves",
            Category::States => "states",
            Category::Themes => "themes",
            Category::Music => "music",
            Category::Screenshots => "screenshots",
            Category::Config => "config",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Category::Roms => "ROMs",
            Category::Bios => "BIOS",
            Category::Saves => "Save Files",
            Category::States => "Save States",
            Category::Themes => "Themes",
            Category::Music => "Music",
            Category::Screenshots => "Screenshots",
            Category::Config => "Config",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers_loosely() {
        assert_eq!("roms".parse::<Category>().unwrap(), Category::Roms);
        assert_eq!(" Screenshots ".parse::<Category>().unwrap(), Category::Screenshots);
        assert!(matches!(
            "videos".parse::<Category>(),
            Err(Error::UnknownCategory(name)) if name == "videos"
        ));
    }

    #[test]
    fn index_follows_iteration_order() {
        for (position, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), position);
        }
    }
}

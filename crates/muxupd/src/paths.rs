use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Category, Error};

/// One of the two storage devices an update can be installed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageRoot {
    #[default]
    Sd1,
    Sd2,
}

impl StorageRoot {
    pub const ALL: [StorageRoot; 2] = [StorageRoot::Sd1, StorageRoot::Sd2];

    pub const fn id(self) -> &'static str {
        match self {
            StorageRoot::Sd1 => "sd1",
            StorageRoot::Sd2 => "sd2",
        }
    }

    /// Absolute mount point of the device on the handheld.
    pub const fn prefix(self) -> &'static str {
        match self {
            StorageRoot::Sd1 => "/mnt/mmc",
            StorageRoot::Sd2 => "/mnt/sdcard",
        }
    }
}

impl fmt::Display for StorageRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StorageRoot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sd1" => Ok(StorageRoot::Sd1),
            "sd2" => Ok(StorageRoot::Sd2),
            _ => Err(Error::UnknownStorageRoot(s.to_string())),
        }
    }
}

pub const DEFAULT_ROM_SYSTEM: &str = "custom";

/// Folder names muOS ships under `ROMS/`.
pub const ROM_SYSTEM_CATALOG: &[&str] = &[
    "arcade", "atari2600", "atari7800", "fbneo", "gb", "gba", "gbc", "gg", "lynx", "mame",
    "md", "ms", "n64", "nds", "neogeo", "nes", "ngp", "pce", "pcecd", "ps", "psp", "scummvm",
    "sega32x", "segacd", "snes", "ws",
];

/// Name of the ROM subfolder files in the `roms` category install into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RomSystem(String);

impl RomSystem {
    /// Trims the tag, falling back to [`DEFAULT_ROM_SYSTEM`] when nothing is left.
    pub fn new(tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            Self(DEFAULT_ROM_SYSTEM.to_string())
        } else {
            Self(tag.to_string())
        }
    }

    /// Like [`RomSystem::new`] but rejects tags that would escape `ROMS/`.
    pub fn parse(tag: impl AsRef<str>) -> Result<Self, Error> {
        let system = Self::new(tag);
        if system.0.contains(['/', '\\']) || system.0 == "." || system.0 == ".." {
            return Err(Error::InvalidRomSystem(system.0));
        }
        Ok(system)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_catalogued(&self) -> bool {
        ROM_SYSTEM_CATALOG.contains(&self.0.as_str())
    }
}

impl Default for RomSystem {
    fn default() -> Self {
        Self(DEFAULT_ROM_SYSTEM.to_string())
    }
}

impl fmt::Display for RomSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveContext {
    pub storage_root: StorageRoot,
    pub rom_system: RomSystem,
}

impl ResolveContext {
    pub fn new(storage_root: StorageRoot, rom_system: RomSystem) -> Self {
        Self {
            storage_root,
            rom_system,
        }
    }
}

/// Destination folder on the device for every file of `category`.
pub fn resolve(category: Category, context: &ResolveContext) -> String {
    resolve_under(category, context.storage_root.prefix(), &context.rom_system)
}

pub(crate) fn resolve_under(category: Category, root: &str, rom_system: &RomSystem) -> String {
    match category {
        Category::Roms => format!("{root}/ROMS/{rom_system}"),
        Category::Bios => format!("{root}/MUOS/bios"),
        Category::Saves => format!("{root}/MUOS/save/file"),
        Category::States => format!("{root}/MUOS/save/state"),
        Category::Themes => format!("{root}/MUOS/theme"),
        Category::Music => format!("{root}/MUOS/music"),
        Category::Screenshots => format!("{root}/MUOS/screenshot"),
        Category::Config => format!("{root}/MUOS/info/config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_category_under_sd1() {
        let context = ResolveContext::new(StorageRoot::Sd1, RomSystem::new("gba"));
        let resolved = Category::ALL.map(|category| resolve(category, &context));
        assert_eq!(
            resolved,
            [
                "/mnt/mmc/ROMS/gba",
                "/mnt/mmc/MUOS/bios",
                "/mnt/mmc/MUOS/save/file",
                "/mnt/mmc/MUOS/save/state",
                "/mnt/mmc/MUOS/theme",
                "/mnt/mmc/MUOS/music",
                "/mnt/mmc/MUOS/screenshot",
                "/mnt/mmc/MUOS/info/config",
            ]
        );
    }

    #[test]
    fn switching_root_reroots_roms() {
        let context = ResolveContext::new(StorageRoot::Sd2, RomSystem::new("gba"));
        assert_eq!(resolve(Category::Roms, &context), "/mnt/sdcard/ROMS/gba");
        assert_eq!(
            resolve_under(Category::Bios, "/mnt/mmc", &RomSystem::default()),
            "/mnt/mmc/MUOS/bios"
        );
    }

    #[test]
    fn empty_rom_system_falls_back_to_custom() {
        assert_eq!(RomSystem::new("   ").as_str(), DEFAULT_ROM_SYSTEM);
        let context = ResolveContext::new(StorageRoot::Sd1, RomSystem::new(""));
        assert_eq!(resolve(Category::Roms, &context), "/mnt/mmc/ROMS/custom");
    }

    #[test]
    fn rom_system_rejects_separators() {
        assert!(RomSystem::parse("snes").is_ok());
        assert!(RomSystem::parse("pico-8").is_ok());
        assert!(matches!(
            RomSystem::parse("../MUOS"),
            Err(Error::InvalidRomSystem(_))
        ));
        assert!(RomSystem::new("gba").is_catalogued());
        assert!(!RomSystem::new("pico-8").is_catalogued());
    }

    #[test]
    fn storage_root_ids_round_trip() {
        for root in StorageRoot::ALL {
            assert_eq!(root.id().parse::<StorageRoot>().unwrap(), root);
        }
        assert!("sd3".parse::<StorageRoot>().is_err());
    }
}

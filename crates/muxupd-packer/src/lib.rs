use chrono::Utc;
use colored::Colorize;
use muxupd::{
    assemble, output_file_name, Category, CompressionOptions, ProgressSink, RomSystem, Session,
    StorageRoot, ZipArchiveService, DEFAULT_COMPRESSION_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod job;
pub mod scan;

pub use job::{PackJob, PackOutcome};

pub const CONFIG_FILE_NAME: &str = "muxupd.toml";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub storage: StorageRoot,
    pub rom_system: RomSystem,
    pub level: Option<u32>,
    /// Selections per category, relative to the manifest folder.
    pub files: BTreeMap<Category, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default)]
    config: ConfigSection,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    files: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigSection {
    #[serde(default)]
    storage: StorageRoot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rom_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<u32>,
}

impl TryFrom<ConfigFile> for Config {
    type Error = Error;

    fn try_from(file: ConfigFile) -> Result<Self, Error> {
        let ConfigFile { config, files } = file;
        let rom_system = match config.rom_system {
            Some(tag) => RomSystem::parse(tag)?,
            None => RomSystem::default(),
        };

        let files = files
            .into_iter()
            .map(|(category, entries)| -> Result<_, Error> {
                Ok((category.parse::<Category>()?, entries))
            })
            .collect::<Result<_, Error>>()?;

        Ok(Self {
            storage: config.storage,
            rom_system,
            level: config.level,
            files,
        })
    }
}

impl Config {
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        let config_file = ConfigFile {
            config: ConfigSection {
                storage: self.storage,
                rom_system: Some(self.rom_system.to_string()),
                level: self.level,
            },
            files: self
                .files
                .iter()
                .map(|(category, entries)| (category.to_string(), entries.clone()))
                .collect(),
        };

        toml::to_string_pretty(&config_file)
    }

    pub fn compression(&self) -> Result<CompressionOptions, Error> {
        Ok(CompressionOptions::new(
            self.level.unwrap_or(u32::from(DEFAULT_COMPRESSION_LEVEL)),
        )?)
    }
}

pub fn load_config(folder: &Path) -> Result<Config, Error> {
    let config_file = folder.join(CONFIG_FILE_NAME);
    let str = std::fs::read_to_string(&config_file)?;
    let config_file =
        toml::from_str::<ConfigFile>(&str).map_err(|e| Error::ConfigError(e.to_string()))?;
    config_file.try_into()
}

/// Turns the manifest selections into a session. Paths that do not exist are
/// skipped with a warning.
pub fn build_session(folder: &Path, config: &Config) -> Result<Session, Error> {
    let mut session = Session::new(config.storage, config.rom_system.clone());

    for (category, entries) in &config.files {
        for entry in entries {
            let candidate = folder.join(entry);
            if !candidate.exists() {
                log::debug!("{category}: {} does not exist, skipping", candidate.display());
                eprintln!(
                    "{} {} {}",
                    "File".dimmed(),
                    entry.dimmed(),
                    "does not exist, skipping".dimmed()
                );
                continue;
            }

            let selected = scan::select(&candidate)?;
            let found = selected.len();
            let added = session.registry.add_all(*category, selected);
            if added < found {
                log::debug!("{category}: {} duplicate(s) in {entry} ignored", found - added);
            }
        }
    }

    Ok(session)
}

/// Packs `session` and writes the archive into `output_dir`. The file name is
/// taken when the archive is finished; nothing is written on failure.
pub fn pack_session(
    session: &Session,
    output_dir: &Path,
    options: &CompressionOptions,
    sink: &mut dyn ProgressSink,
) -> Result<PathBuf, Error> {
    let summary = session.summary();
    if summary.exceeds_size_warning {
        log::warn!(
            "archive holds {} which may be too large for the device to unpack",
            muxupd::format_size(summary.total_size)
        );
    }

    let mut service = ZipArchiveService::new();
    let bytes = assemble(
        &session.registry,
        &session.context(),
        &mut service,
        options,
        sink,
    )?;

    let output_path = output_dir.join(output_file_name(Utc::now()));
    std::fs::write(&output_path, bytes)?;
    log::info!(
        "wrote {} ({} files)",
        output_path.display(),
        summary.total_files
    );
    Ok(output_path)
}

pub fn pack_with_config(
    folder: &Path,
    output_dir: &Path,
    config: Config,
    sink: &mut dyn ProgressSink,
) -> Result<PathBuf, Error> {
    let options = config.compression()?;
    let session = build_session(folder, &config)?;
    pack_session(&session, output_dir, &options, sink)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    ConfigError(String),
    #[error(transparent)]
    Pack(#[from] muxupd::Error),
    #[error("{0}")]
    IOError(#[from] std::io::Error),
    #[error("Failed to walk {path}: {source}")]
    WalkError {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_toml() {
        let mut files = BTreeMap::new();
        files.insert(Category::Roms, vec!["roms/Tetris.gb".to_string()]);
        files.insert(Category::Bios, vec!["bios".to_string()]);
        let config = Config {
            storage: StorageRoot::Sd2,
            rom_system: RomSystem::new("gb"),
            level: Some(9),
            files,
        };

        let toml = config.to_toml_string().expect("serialize manifest");
        let parsed: ConfigFile = toml::from_str(&toml).expect("parse manifest");
        let parsed = Config::try_from(parsed).expect("valid manifest");
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: ConfigFile = toml::from_str("").expect("parse empty manifest");
        let config = Config::try_from(parsed).expect("valid manifest");
        assert_eq!(config, Config::default());
        assert_eq!(config.compression().unwrap().level(), DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(toml::from_str::<ConfigFile>("[config]\nstorage = \"sd3\"\n").is_err());

        let parsed: ConfigFile =
            toml::from_str("[files]\nvideos = [\"a.mp4\"]\n").expect("parse manifest");
        assert!(matches!(
            Config::try_from(parsed),
            Err(Error::Pack(muxupd::Error::UnknownCategory(name))) if name == "videos"
        ));

        let parsed: ConfigFile =
            toml::from_str("[config]\nrom_system = \"../MUOS\"\n").expect("parse manifest");
        assert!(matches!(
            Config::try_from(parsed),
            Err(Error::Pack(muxupd::Error::InvalidRomSystem(_)))
        ));

        let config = Config {
            level: Some(12),
            ..Config::default()
        };
        assert!(config.compression().is_err());
    }
}

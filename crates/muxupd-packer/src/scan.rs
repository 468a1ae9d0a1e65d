use colored::Colorize;
use muxupd::SelectedFile;
use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

use crate::{Error, CONFIG_FILE_NAME};

fn is_manifest(name: &OsStr) -> bool {
    name.to_str()
        .map(|name| name.eq_ignore_ascii_case(CONFIG_FILE_NAME))
        .unwrap_or(false)
}

/// Files picked by selecting `path`: the file itself, or every file below it
/// when it is a folder. Folder entries keep the folder name in their relative path.
/// A manifest is never selected, even when named directly.
pub fn select(path: &Path) -> Result<Vec<SelectedFile>, Error> {
    if path.is_file() {
        if path.file_name().is_some_and(is_manifest) {
            return Ok(Vec::new());
        }
        return Ok(vec![SelectedFile::from_path(path)?]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| Error::WalkError {
            path: path.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if entry.depth() == 1 && is_manifest(entry.file_name()) {
            continue;
        }
        if entry.file_name().to_str().is_none() {
            eprintln!(
                "{} {}",
                entry.path().display().to_string().dimmed(),
                "has an invalid UTF-8 name, skipping".dimmed()
            );
            continue;
        }

        files.push(SelectedFile::from_folder_entry(path, entry.path())?);
    }

    Ok(files)
}

use bytesize::ByteSize;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Category, Error, Result};

/// Total size above which an archive may not be handled well by the device.
pub const LARGE_ARCHIVE_THRESHOLD: u64 = 2 * 1024 * 1024 * 1024;

/// Handle to the bytes of a selected file. Disk files are only opened when the
/// archive is written.
#[derive(Debug, Clone)]
pub enum FileContent {
    Disk(PathBuf),
    Memory(Arc<[u8]>),
}

impl FileContent {
    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(match self {
            FileContent::Disk(path) => Box::new(File::open(path)?),
            FileContent::Memory(bytes) => Box::new(Cursor::new(Arc::clone(bytes))),
        })
    }

    pub fn describe(&self) -> String {
        match self {
            FileContent::Disk(path) => path.display().to_string(),
            FileContent::Memory(_) => "<memory>".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Path below the selection root, `/` separated. Equal to `name` for single files.
    pub relative_path: String,
    pub size: u64,
    pub content: FileContent,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        Self {
            relative_path: name.clone(),
            size: bytes.len() as u64,
            name,
            content: FileContent::Memory(bytes),
        }
    }

    /// Same as [`SelectedFile::from_bytes`] but placed at `relative_path`.
    pub fn nested(relative_path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let relative_path = relative_path.into();
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path.as_str())
            .to_string();
        let mut file = Self::from_bytes(name, bytes);
        file.relative_path = relative_path;
        file
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = file_name(path)?;
        let size = std::fs::metadata(path)?.len();

        Ok(Self {
            relative_path: name.clone(),
            name,
            size,
            content: FileContent::Disk(path.to_path_buf()),
        })
    }

    /// Entry found while walking a selected folder. The folder's own name is
    /// kept as the first segment of the relative path.
    pub fn from_folder_entry(folder: &Path, path: &Path) -> Result<Self> {
        let name = file_name(path)?;
        let size = std::fs::metadata(path)?.len();
        let below = path.strip_prefix(folder).unwrap_or(path);

        let mut segments = Vec::new();
        if let Some(folder_name) = folder.file_name() {
            segments.push(folder_name.to_string_lossy().into_owned());
        }
        segments.extend(
            below
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned()),
        );

        Ok(Self {
            name,
            relative_path: segments.join("/"),
            size,
            content: FileContent::Disk(path.to_path_buf()),
        })
    }

    fn same_selection(&self, other: &SelectedFile) -> bool {
        self.name == other.name && self.size == other.size && self.relative_path == other.relative_path
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid file name: {}", path.display()),
            ))
        })
}

/// Selected files per category.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    files: [Vec<SelectedFile>; Category::COUNT],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `file` unless the category already holds an entry with the same
    /// name, size and relative path. Returns whether it was inserted.
    pub fn add(&mut self, category: Category, file: SelectedFile) -> bool {
        let files = &mut self.files[category.index()];
        if files.iter().any(|existing| existing.same_selection(&file)) {
            log::debug!("{category}: {} already selected", file.relative_path);
            return false;
        }
        files.push(file);
        true
    }

    pub fn add_all<I>(&mut self, category: Category, files: I) -> usize
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        files
            .into_iter()
            .map(|file| self.add(category, file))
            .filter(|inserted| *inserted)
            .count()
    }

    pub fn remove_at(&mut self, category: Category, index: usize) -> Result<SelectedFile> {
        let files = &mut self.files[category.index()];
        if index >= files.len() {
            return Err(Error::IndexOutOfRange {
                category,
                index,
                len: files.len(),
            });
        }
        Ok(files.remove(index))
    }

    pub fn clear(&mut self, category: Category) {
        self.files[category.index()].clear();
    }

    pub fn files(&self, category: Category) -> &[SelectedFile] {
        &self.files[category.index()]
    }

    /// Every entry in category order, then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &SelectedFile)> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.files(category).iter().map(move |file| (category, file)))
    }

    pub fn total_count(&self) -> usize {
        self.files.iter().map(Vec::len).sum()
    }

    pub fn total_size(&self) -> u64 {
        self.files
            .iter()
            .flat_map(|files| files.iter())
            .map(|file| file.size)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }
}

pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> SelectedFile {
        SelectedFile::from_bytes(name, vec![0u8; size])
    }

    #[test]
    fn adding_same_file_twice_is_a_no_op() {
        let mut registry = Registry::new();
        assert!(registry.add(Category::Bios, file("scph1001.bin", 4)));
        assert!(!registry.add(Category::Bios, file("scph1001.bin", 4)));
        assert_eq!(registry.total_count(), 1);
    }

    #[test]
    fn dedup_key_includes_size_and_relative_path() {
        let mut registry = Registry::new();
        registry.add(Category::Roms, file("game.gba", 4));
        registry.add(Category::Roms, file("game.gba", 5));
        registry.add(Category::Roms, SelectedFile::nested("hacks/game.gba", vec![0u8; 4]));
        // same file in another category is a different selection
        registry.add(Category::Saves, file("game.gba", 4));
        assert_eq!(registry.files(Category::Roms).len(), 3);
        assert_eq!(registry.total_count(), 4);
    }

    #[test]
    fn totals_aggregate_across_categories() {
        let mut registry = Registry::new();
        registry.add(Category::Roms, file("a", 10));
        registry.add(Category::Roms, file("b", 20));
        registry.add(Category::Roms, file("c", 0));
        registry.add(Category::Music, file("d", 5));
        assert_eq!(registry.total_count(), 4);
        assert_eq!(registry.total_size(), 35);
    }

    #[test]
    fn remove_out_of_range_leaves_registry_untouched() {
        let mut registry = Registry::new();
        registry.add(Category::Themes, file("dark.muxthm", 3));

        let err = registry.remove_at(Category::Themes, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange {
                category: Category::Themes,
                index: 1,
                len: 1
            }
        ));
        assert_eq!(registry.total_count(), 1);

        let removed = registry.remove_at(Category::Themes, 0).unwrap();
        assert_eq!(removed.name, "dark.muxthm");
        assert!(registry.is_empty());
    }

    #[test]
    fn iter_follows_category_then_insertion_order() {
        let mut registry = Registry::new();
        registry.add(Category::Config, file("z.cfg", 1));
        registry.add(Category::Roms, file("b.gba", 1));
        registry.add(Category::Roms, file("a.gba", 1));

        let order: Vec<_> = registry
            .iter()
            .map(|(category, file)| (category, file.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Category::Roms, "b.gba"),
                (Category::Roms, "a.gba"),
                (Category::Config, "z.cfg"),
            ]
        );
    }

    #[test]
    fn nested_keeps_base_name() {
        let file = SelectedFile::nested("pack/sub/tile.png", vec![1u8, 2]);
        assert_eq!(file.name, "tile.png");
        assert_eq!(file.relative_path, "pack/sub/tile.png");
        assert_eq!(file.size, 2);
    }

    #[test]
    fn folder_entries_keep_folder_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        let folder = dir.path().join("hacks");
        std::fs::create_dir_all(folder.join("fr")).expect("create folders");
        let rom = folder.join("fr").join("game.gba");
        std::fs::write(&rom, b"rom").expect("write rom");

        let entry = SelectedFile::from_folder_entry(&folder, &rom).expect("entry");
        assert_eq!(entry.name, "game.gba");
        assert_eq!(entry.relative_path, "hacks/fr/game.gba");
        assert_eq!(entry.size, 3);
    }
}

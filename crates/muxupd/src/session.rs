use crate::render::{render, TreeLine};
use crate::{
    tree, Registry, ResolveContext, Result, RomSystem, StorageRoot, TreeNode,
    LARGE_ARCHIVE_THRESHOLD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total_files: usize,
    pub total_size: u64,
    pub exceeds_size_warning: bool,
}

/// Everything the user has chosen so far. Owned by whoever drives the
/// packer and passed to each operation explicitly.
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub registry: Registry,
    storage_root: StorageRoot,
    rom_system: RomSystem,
}

impl Session {
    pub fn new(storage_root: StorageRoot, rom_system: RomSystem) -> Self {
        Self {
            registry: Registry::new(),
            storage_root,
            rom_system,
        }
    }

    pub fn storage_root(&self) -> StorageRoot {
        self.storage_root
    }

    pub fn set_storage_root(&mut self, storage_root: StorageRoot) {
        self.storage_root = storage_root;
    }

    pub fn rom_system(&self) -> &RomSystem {
        &self.rom_system
    }

    pub fn set_rom_system(&mut self, rom_system: RomSystem) {
        self.rom_system = rom_system;
    }

    pub fn context(&self) -> ResolveContext {
        ResolveContext::new(self.storage_root, self.rom_system.clone())
    }

    /// `None` while nothing is selected.
    pub fn preview(&self) -> Result<Option<TreeNode>> {
        if self.registry.is_empty() {
            return Ok(None);
        }
        tree::build(&self.registry, &self.context()).map(Some)
    }

    pub fn preview_lines(&self) -> Result<Vec<TreeLine>> {
        Ok(self.preview()?.map(|root| render(&root)).unwrap_or_default())
    }

    pub fn summary(&self) -> Summary {
        let total_size = self.registry.total_size();
        Summary {
            total_files: self.registry.total_count(),
            total_size,
            exceeds_size_warning: total_size > LARGE_ARCHIVE_THRESHOLD,
        }
    }

    pub fn can_build(&self) -> bool {
        !self.registry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, SelectedFile};

    #[test]
    fn empty_session_has_no_preview() {
        let session = Session::default();
        assert!(session.preview().unwrap().is_none());
        assert!(session.preview_lines().unwrap().is_empty());
        assert!(!session.can_build());
    }

    #[test]
    fn switching_root_keeps_selection() {
        let mut session = Session::new(StorageRoot::Sd1, RomSystem::new("nes"));
        session
            .registry
            .add(Category::Roms, SelectedFile::from_bytes("mario.nes", vec![0u8; 8]));

        let before = session.preview().unwrap().unwrap();
        assert!(before.contains_file("mnt/mmc/ROMS/nes/mario.nes"));

        session.set_storage_root(StorageRoot::Sd2);
        session.set_rom_system(RomSystem::new("famicom"));
        let after = session.preview().unwrap().unwrap();
        assert!(after.contains_file("mnt/sdcard/ROMS/famicom/mario.nes"));
        assert_eq!(session.registry.total_count(), 1);
        assert!(session.can_build());
    }

    #[test]
    fn summary_flags_large_archives() {
        let mut session = Session::default();
        let mut huge = SelectedFile::from_bytes("big.iso", vec![0u8]);
        huge.size = LARGE_ARCHIVE_THRESHOLD;
        session.registry.add(Category::Roms, huge);
        assert!(!session.summary().exceeds_size_warning);

        session
            .registry
            .add(Category::Bios, SelectedFile::from_bytes("x.bin", vec![0u8]));
        let summary = session.summary();
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.total_size, LARGE_ARCHIVE_THRESHOLD + 1);
        assert!(summary.exceeds_size_warning);
    }
}

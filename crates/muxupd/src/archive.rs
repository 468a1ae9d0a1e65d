use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::sync::mpsc::Sender;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::paths::resolve;
use crate::tree::split_path;
use crate::{Category, Error, FileContent, Registry, ResolveContext, Result, TreeNode};

pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;
const MAX_COMPRESSION_LEVEL: u8 = 9;
const COPY_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A file was handed to the archive service.
    Adding { processed: usize, total: usize },
    /// Percentage of content written by the archive service, never decreasing.
    Compressing { percent: u8 },
}

pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent),
{
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for Sender<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        // receiver gone means nobody is watching anymore
        let _ = self.send(event);
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _event: ProgressEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    level: u8,
}

impl CompressionOptions {
    pub fn new(level: u32) -> Result<Self> {
        if level > u32::from(MAX_COMPRESSION_LEVEL) {
            return Err(Error::InvalidCompressionLevel(level));
        }
        Ok(Self { level: level as u8 })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    fn file_options(&self, size: u64) -> SimpleFileOptions {
        let options = SimpleFileOptions::default()
            .last_modified_time(zip::DateTime::default())
            .large_file(size >= u64::from(u32::MAX));

        if self.level == 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level.into()))
        }
    }
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Container writer the assembler feeds. Registration is cheap; all reading
/// and compressing happens in `finalize`.
pub trait ArchiveService {
    fn register(&mut self, path: String, content: FileContent, size: u64);

    fn finalize(
        &mut self,
        options: &CompressionOptions,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>>;

    /// Drops everything registered so far.
    fn discard(&mut self);
}

struct PendingEntry {
    path: String,
    content: FileContent,
    size: u64,
}

/// Writes a zip archive into memory, members in registration order.
#[derive(Default)]
pub struct ZipArchiveService {
    pending: Vec<PendingEntry>,
}

impl ZipArchiveService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl ArchiveService for ZipArchiveService {
    fn register(&mut self, path: String, content: FileContent, size: u64) {
        self.pending.push(PendingEntry {
            path,
            content,
            size,
        });
    }

    fn finalize(
        &mut self,
        options: &CompressionOptions,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>> {
        let pending = std::mem::take(&mut self.pending);
        let mut meter = PercentMeter::new(pending.iter().map(|entry| entry.size).sum());
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut buffer = vec![0u8; COPY_CHUNK];

        sink.report(ProgressEvent::Compressing { percent: 0 });
        for entry in pending {
            let unreadable = |source| Error::UnreadableContent {
                path: entry.content.describe(),
                source,
            };

            writer.start_file(entry.path.as_str(), options.file_options(entry.size))?;
            let mut reader = entry.content.open().map_err(unreadable)?;
            loop {
                let read = reader.read(&mut buffer).map_err(unreadable)?;
                if read == 0 {
                    break;
                }
                writer.write_all(&buffer[..read])?;
                if let Some(percent) = meter.advance(read as u64) {
                    sink.report(ProgressEvent::Compressing { percent });
                }
            }
        }

        let bytes = writer.finish()?.into_inner();
        if let Some(percent) = meter.complete() {
            sink.report(ProgressEvent::Compressing { percent });
        }
        Ok(bytes)
    }

    fn discard(&mut self) {
        self.pending.clear();
    }
}

/// Turns byte counts into whole percentages, reporting each value once.
struct PercentMeter {
    total: u64,
    done: u64,
    reported: u8,
}

impl PercentMeter {
    fn new(total: u64) -> Self {
        Self {
            total,
            done: 0,
            reported: 0,
        }
    }

    fn advance(&mut self, bytes: u64) -> Option<u8> {
        self.done = self.done.saturating_add(bytes).min(self.total);
        let percent = (self.done.saturating_mul(100) / self.total.max(1)) as u8;
        self.bump(percent)
    }

    fn complete(&mut self) -> Option<u8> {
        self.bump(100)
    }

    fn bump(&mut self, percent: u8) -> Option<u8> {
        if percent > self.reported {
            self.reported = percent;
            Some(percent)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannedEntry {
    pub category: Category,
    pub path: String,
    pub size: u64,
    pub content: FileContent,
}

/// Relative path a file is stored under inside the archive. Uses the same
/// segment rules as the preview tree.
pub fn archive_path(category: Category, relative_path: &str, context: &ResolveContext) -> String {
    let full = format!("{}/{relative_path}", resolve(category, context));
    split_path(&full).join("/")
}

/// Archive members in category order, then selection order. Fails when two
/// files would land on the same path or a file would shadow a folder.
pub fn archive_plan(registry: &Registry, context: &ResolveContext) -> Result<Vec<PlannedEntry>> {
    let mut seen = HashSet::new();
    let mut shape = TreeNode::default();
    let mut plan = Vec::with_capacity(registry.total_count());

    for (category, file) in registry.iter() {
        let path = archive_path(category, &file.relative_path, context);
        if !seen.insert(path.clone()) {
            return Err(Error::DuplicateArchivePath { path });
        }
        shape.insert_path(&path)?;

        plan.push(PlannedEntry {
            category,
            path,
            size: file.size,
            content: file.content.clone(),
        });
    }

    Ok(plan)
}

/// Registers every selected file with `service` and returns the finished
/// archive. On failure nothing registered is kept.
pub fn assemble(
    registry: &Registry,
    context: &ResolveContext,
    service: &mut dyn ArchiveService,
    options: &CompressionOptions,
    sink: &mut dyn ProgressSink,
) -> Result<Vec<u8>> {
    let plan = archive_plan(registry, context)?;
    if plan.is_empty() {
        return Err(Error::NothingToPack);
    }

    let total = plan.len();
    for (index, entry) in plan.into_iter().enumerate() {
        log::debug!("+ {} ({} bytes)", entry.path, entry.size);
        service.register(entry.path, entry.content, entry.size);
        sink.report(ProgressEvent::Adding {
            processed: index + 1,
            total,
        });
    }

    service.finalize(options, sink).map_err(|err| {
        service.discard();
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_level_is_bounded() {
        assert_eq!(CompressionOptions::default().level(), 6);
        assert_eq!(CompressionOptions::new(0).unwrap().level(), 0);
        assert!(matches!(
            CompressionOptions::new(10),
            Err(Error::InvalidCompressionLevel(10))
        ));
    }

    #[test]
    fn meter_never_goes_backwards() {
        let mut meter = PercentMeter::new(200);
        assert_eq!(meter.advance(1), None);
        assert_eq!(meter.advance(1), Some(1));
        assert_eq!(meter.advance(98), Some(50));
        assert_eq!(meter.advance(500), Some(100));
        assert_eq!(meter.complete(), None);
    }

    #[test]
    fn empty_content_still_completes() {
        let mut meter = PercentMeter::new(0);
        assert_eq!(meter.advance(0), None);
        assert_eq!(meter.complete(), Some(100));
    }

    #[test]
    fn archive_path_is_relative() {
        let context = ResolveContext::default();
        assert_eq!(
            archive_path(Category::Music, "album/01.mp3", &context),
            "mnt/mmc/MUOS/music/album/01.mp3"
        );
    }
}

use crate::Category;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown category `{0}`")]
    UnknownCategory(String),

    #[error("Unknown storage root `{0}`, expected sd1 or sd2")]
    UnknownStorageRoot(String),

    #[error("ROM system `{0}` must be a single folder name")]
    InvalidRomSystem(String),

    #[error("No {category} file at index {index} ({len} selected)")]
    IndexOutOfRange {
        category: Category,
        index: usize,
        len: usize,
    },

    #[error("`{path}` is used both as a file and as a folder")]
    PathConflict { path: String },

    #[error("More than one file would be stored at `{path}`")]
    DuplicateArchivePath { path: String },

    #[error("Compression level must be between 0 and 9, got {0}")]
    InvalidCompressionLevel(u32),

    #[error("No files selected")]
    NothingToPack,

    #[error("Could not read `{path}`: {source}")]
    UnreadableContent {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

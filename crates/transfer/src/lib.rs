//! Local side of a media upload: classify the file, read it in
//! service-sized chunks, and report progress.

mod chunked;
mod progress;
mod types;
mod validation;

use std::path::PathBuf;

pub use chunked::{Chunk, ChunkReader};
pub use progress::{ProgressChannel, SpeedCalculator, UploadProgress};
pub use types::{ChunkAttempt, UploadSession};
pub use validation::{
    MAX_IMAGE_BYTES, MAX_VIDEO_BYTES, MediaFile, MediaKind, check_size, classify_extension,
    is_file_uploadable, mime_type_for_extension,
};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("media file {} has no data", .0.display())]
    EmptyFile(PathBuf),

    #[error("unsupported media type '{extension}' for {}", path.display())]
    UnsupportedMediaType { path: PathBuf, extension: String },

    #[error("{kind} file {} is {size} bytes, limit is {limit}", path.display())]
    MediaTooLarge {
        path: PathBuf,
        kind: MediaKind,
        size: u64,
        limit: u64,
    },

    #[error("invalid chunk granularity: {0}")]
    InvalidGranularity(String),

    #[error("{sent} bytes at offset {offset} would pass the declared size {total}")]
    OffsetOverrun { offset: u64, sent: u64, total: u64 },

    #[error("file ended early at offset {offset}: expected {expected} bytes, read {actual}")]
    UnexpectedEof {
        offset: u64,
        expected: usize,
        actual: usize,
    },
}

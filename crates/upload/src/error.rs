//! Upload error types.

use std::path::PathBuf;

use gphotos_transfer::{MediaKind, TransferError};

/// Errors produced by an upload call. All of them are terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("media file {} has no data", .0.display())]
    EmptyFile(PathBuf),

    #[error("cannot match extension '{extension}' of {} to a known image or video type", path.display())]
    UnsupportedMediaType { path: PathBuf, extension: String },

    #[error("{kind} file {} is {size} bytes, above the {limit} byte upload limit", path.display())]
    MediaTooLarge {
        path: PathBuf,
        kind: MediaKind,
        size: u64,
        limit: u64,
    },

    #[error("upload session could not be started: {0}")]
    SessionInitFailed(String),

    #[error("upload failed with HTTP {status}: {body}")]
    UploadFailed { status: u16, body: String },

    #[error("gave up after {attempts} attempts at offset {offset} (last status: {})", fmt_status(*.last_status))]
    RetryLimitExceeded {
        attempts: u32,
        offset: u64,
        last_status: Option<u16>,
    },

    #[error("service returned an empty upload token")]
    MissingToken,

    #[error("cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::NotFound(path) => Self::NotFound(path),
            TransferError::EmptyFile(path) => Self::EmptyFile(path),
            TransferError::UnsupportedMediaType { path, extension } => {
                Self::UnsupportedMediaType { path, extension }
            }
            TransferError::MediaTooLarge {
                path,
                kind,
                size,
                limit,
            } => Self::MediaTooLarge {
                path,
                kind,
                size,
                limit,
            },
            TransferError::InvalidGranularity(raw) => {
                Self::SessionInitFailed(format!("invalid chunk granularity '{raw}'"))
            }
            TransferError::Io(e) => Self::Io(e),
            e @ TransferError::UnexpectedEof { .. } => Self::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                e.to_string(),
            )),
            e @ TransferError::OffsetOverrun { .. } => Self::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            )),
        }
    }
}

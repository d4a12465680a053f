use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::TransferError;

/// Largest image the service accepts: 200 MiB.
pub const MAX_IMAGE_BYTES: u64 = 200 * 1024 * 1024;

/// Largest video the service accepts: 10 GiB.
pub const MAX_VIDEO_BYTES: u64 = 10 * 1024 * 1024 * 1024;

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/bmp",
    "image/gif",
    "image/heic",
    "image/heif",
    "image/vnd.microsoft.icon",
    "image/x-icon",
    "image/jpeg",
    "image/png",
    "image/tiff",
    "image/webp",
];

const VIDEO_MIME_TYPES: &[&str] = &[
    "video/3gpp",
    "video/3gpp2",
    "video/x-ms-asf",
    "video/x-msvideo",
    "video/divx",
    "video/mpeg",
    "video/mp4",
    "video/x-m4v",
    "video/mp2t",
    "video/x-matroska",
    "video/mmv",
    "video/mod",
    "video/quicktime",
    "video/x-ms-wmv",
];

/// Extensions the MIME database either misses or maps to a type the service
/// names differently.
const MIME_OVERRIDES: &[(&str, &str)] = &[
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("divx", "video/divx"),
    ("m4v", "video/x-m4v"),
    ("ts", "video/mp2t"),
    ("mts", "video/mp2t"),
    ("m2ts", "video/mp2t"),
    ("mod", "video/mod"),
    ("mmv", "video/mmv"),
];

/// Media class derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl MediaKind {
    /// Size ceiling for this kind; `None` for unsupported media.
    pub fn max_bytes(self) -> Option<u64> {
        match self {
            Self::Image => Some(MAX_IMAGE_BYTES),
            Self::Video => Some(MAX_VIDEO_BYTES),
            Self::Unsupported => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Unsupported => "unsupported",
        })
    }
}

/// Returns the accepted MIME type for `extension` (with or without the
/// leading dot), or `None` when it is not an accepted image or video type.
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() {
        return None;
    }

    if let Some((_, mime)) = MIME_OVERRIDES.iter().find(|(e, _)| *e == ext) {
        return Some(*mime);
    }

    mime_guess::from_ext(&ext)
        .iter_raw()
        .find_map(|candidate| {
            IMAGE_MIME_TYPES
                .iter()
                .chain(VIDEO_MIME_TYPES)
                .find(|accepted| accepted.eq_ignore_ascii_case(candidate))
                .copied()
        })
}

/// Classifies a file extension as image, video or unsupported.
pub fn classify_extension(extension: &str) -> MediaKind {
    match mime_type_for_extension(extension) {
        Some(mime) if mime.starts_with("image/") => MediaKind::Image,
        Some(_) => MediaKind::Video,
        None => MediaKind::Unsupported,
    }
}

/// True when the extension of `path` maps to an accepted image or video type.
pub fn is_file_uploadable(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| classify_extension(&ext) != MediaKind::Unsupported)
        .unwrap_or(false)
}

/// Fails with [`TransferError::MediaTooLarge`] when `size` exceeds the
/// ceiling for `kind`.
pub fn check_size(path: &Path, kind: MediaKind, size: u64) -> Result<(), TransferError> {
    match kind.max_bytes() {
        Some(limit) if size > limit => Err(TransferError::MediaTooLarge {
            path: path.to_path_buf(),
            kind,
            size,
            limit,
        }),
        _ => Ok(()),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// MediaFile
// ---------------------------------------------------------------------------

/// A local file that passed every pre-upload check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime_type: &'static str,
    pub kind: MediaKind,
}

impl MediaFile {
    /// Resolves and validates `path`.
    ///
    /// Checks run in order: the file exists, is non-empty, has a supported
    /// extension, and fits under the ceiling for its kind.
    pub async fn resolve(path: &Path) -> Result<Self, TransferError> {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(TransferError::NotFound(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransferError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let size = meta.len();
        if size == 0 {
            return Err(TransferError::EmptyFile(path.to_path_buf()));
        }

        let extension = extension_of(path).unwrap_or_default();
        let Some(mime_type) = mime_type_for_extension(&extension) else {
            return Err(TransferError::UnsupportedMediaType {
                path: path.to_path_buf(),
                extension,
            });
        };
        let kind = classify_extension(&extension);
        check_size(path, kind, size)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(path = %path.display(), size, mime_type, %kind, "resolved media file");

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size,
            mime_type,
            kind,
        })
    }
}

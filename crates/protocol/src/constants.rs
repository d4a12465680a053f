use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default endpoint for REST requests (Library API v1).
pub const BASE_URL: &str = "https://photoslibrary.googleapis.com/v1/";

// ---------------------------------------------------------------------------
// REST paths (relative to `BASE_URL`)
// ---------------------------------------------------------------------------

pub const PATH_UPLOADS: &str = "uploads";
pub const PATH_ALBUMS: &str = "albums";
pub const PATH_SHARED_ALBUMS: &str = "sharedAlbums";
pub const PATH_SHARED_ALBUMS_JOIN: &str = "sharedAlbums:join";
pub const PATH_SHARED_ALBUMS_LEAVE: &str = "sharedAlbums:leave";
pub const PATH_MEDIA_ITEMS: &str = "mediaItems";
pub const PATH_MEDIA_ITEMS_SEARCH: &str = "mediaItems:search";
pub const PATH_MEDIA_ITEMS_BATCH_CREATE: &str = "mediaItems:batchCreate";
pub const PATH_MEDIA_ITEMS_BATCH_GET: &str = "mediaItems:batchGet";

/// Album-scoped actions, appended as `albums/{id}:{action}`.
pub const ALBUM_ACTION_ADD_ENRICHMENT: &str = "addEnrichment";
pub const ALBUM_ACTION_BATCH_ADD: &str = "batchAddMediaItems";
pub const ALBUM_ACTION_BATCH_REMOVE: &str = "batchRemoveMediaItems";
pub const ALBUM_ACTION_SHARE: &str = "share";
pub const ALBUM_ACTION_UNSHARE: &str = "unshare";

// ---------------------------------------------------------------------------
// Upload protocol headers
// ---------------------------------------------------------------------------

pub const HEADER_UPLOAD_CONTENT_TYPE: &str = "X-Goog-Upload-Content-Type";
pub const HEADER_UPLOAD_PROTOCOL: &str = "X-Goog-Upload-Protocol";
pub const HEADER_UPLOAD_COMMAND: &str = "X-Goog-Upload-Command";
pub const HEADER_UPLOAD_FILE_NAME: &str = "X-Goog-Upload-File-Name";
pub const HEADER_UPLOAD_RAW_SIZE: &str = "X-Goog-Upload-Raw-Size";
pub const HEADER_UPLOAD_URL: &str = "X-Goog-Upload-URL";
pub const HEADER_UPLOAD_CHUNK_GRANULARITY: &str = "X-Goog-Upload-Chunk-Granularity";
pub const HEADER_UPLOAD_OFFSET: &str = "X-Goog-Upload-Offset";
pub const HEADER_UPLOAD_STATUS: &str = "X-Goog-Upload-Status";
pub const HEADER_UPLOAD_SIZE_RECEIVED: &str = "X-Goog-Upload-Size-Received";

/// Value of `X-Goog-Upload-Protocol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadProtocol {
    /// Whole payload in a single request.
    Raw,
    /// Session-based transfer negotiated by a `start` command.
    Resumable,
}

impl UploadProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Resumable => "resumable",
        }
    }
}

/// Value of `X-Goog-Upload-Command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadCommand {
    Start,
    Upload,
    UploadFinalize,
    Query,
}

impl UploadCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Upload => "upload",
            Self::UploadFinalize => "upload, finalize",
            Self::Query => "query",
        }
    }

    /// Command for a chunk transmission; the last chunk finalizes the session.
    pub fn for_chunk(last: bool) -> Self {
        if last {
            Self::UploadFinalize
        } else {
            Self::Upload
        }
    }
}

impl fmt::Display for UploadCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Upload method
// ---------------------------------------------------------------------------

/// Wire protocol used to send media bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadMethod {
    /// One raw request carrying the whole file.
    Simple,
    /// Resumable session, whole file sent in one `upload, finalize` request.
    ResumableSingle,
    /// Resumable session, file sent in service-sized chunks.
    #[default]
    ResumableMultipart,
}

impl UploadMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::ResumableSingle => "resumable-single",
            Self::ResumableMultipart => "resumable-multipart",
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadMethod {
    type Err = crate::ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" | "raw" => Ok(Self::Simple),
            "resumable-single" | "single" => Ok(Self::ResumableSingle),
            "resumable-multipart" | "multipart" | "chunked" => Ok(Self::ResumableMultipart),
            other => Err(crate::ProtocolError::UnknownUploadMethod(other.to_string())),
        }
    }
}

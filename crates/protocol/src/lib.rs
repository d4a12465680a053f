pub mod constants;
pub mod filters;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{UploadCommand, UploadMethod, UploadProtocol};
pub use filters::Filter;
pub use messages::{ApiErrorResponse, Paged};
pub use types::{
    Album, AlbumPosition, MediaItem, NewMediaItemResult, PositionType, UploadItem, UploadToken,
};

/// Errors raised while building or parsing protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown upload method: {0}")]
    UnknownUploadMethod(String),

    #[error("upload token is blank")]
    BlankUploadToken,

    #[error("album position requires an album id")]
    PositionWithoutAlbum,

    #[error("only one of relative media item or relative enrichment item may be set")]
    ConflictingRelativeItems,

    #[error("position {0:?} requires a relative item id")]
    MissingRelativeItem(types::PositionType),

    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

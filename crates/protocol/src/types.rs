use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Upload token
// ---------------------------------------------------------------------------

/// Opaque handle returned by a completed byte upload.
///
/// Redeemed once via `mediaItems:batchCreate`; the string has no structure
/// the client may rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadToken(String);

impl UploadToken {
    /// Wraps a token, rejecting blank strings.
    pub fn new(token: impl Into<String>) -> Result<Self, ProtocolError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ProtocolError::BlankUploadToken);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Albums
// ---------------------------------------------------------------------------

/// An album in the user's library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_photo_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_photo_media_item_id: Option<String>,
    #[serde(default)]
    pub is_writeable: bool,
    #[serde(default, with = "int64")]
    pub media_items_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_info: Option<ShareInfo>,
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} media items", self.title, self.media_items_count)
    }
}

/// Sharing state of an album.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareInfo {
    #[serde(default)]
    pub shared_album_options: SharedAlbumOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shareable_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(default)]
    pub is_joined: bool,
    #[serde(default)]
    pub is_owned: bool,
    #[serde(default)]
    pub is_joinable: bool,
}

/// Options that control sharing of an album.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedAlbumOptions {
    /// Collaborators may add media items.
    #[serde(default)]
    pub is_collaborative: bool,
    /// Owner and collaborators may comment.
    #[serde(default)]
    pub is_commentable: bool,
}

// ---------------------------------------------------------------------------
// Media items
// ---------------------------------------------------------------------------

/// A photo or video in the user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub product_url: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub mime_type: String,
    pub media_metadata: MediaMetadata,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_info: Option<ContributorInfo>,
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.filename,
            self.media_metadata.creation_time.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Metadata common to photos and videos.
///
/// Width and height are int64 values the service sends as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture_f_number: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso_equivalent: Option<u32>,
    /// Duration string such as `"0.008s"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Processing state, e.g. `READY` or `PROCESSING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
}

/// Who added a media item to a shared album.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// RPC status attached to per-item batch results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

impl Status {
    /// `code == 0` is OK in the RPC status model.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{} ({})", msg, self.code),
            None => write!(f, "status {}", self.code),
        }
    }
}

// ---------------------------------------------------------------------------
// Media item creation
// ---------------------------------------------------------------------------

/// A media item to create from an upload token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub simple_media_item: SimpleMediaItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleMediaItem {
    pub upload_token: String,
    /// Overrides the name sent during the byte upload when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Per-item outcome of `mediaItems:batchCreate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItemResult {
    #[serde(default)]
    pub upload_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_item: Option<MediaItem>,
}

/// Client-side description of an uploaded file awaiting creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub upload_token: UploadToken,
    pub file_name: Option<String>,
    pub description: Option<String>,
}

impl UploadItem {
    /// Builds an item; `file_name` is reduced to its final path component.
    pub fn new(
        upload_token: UploadToken,
        file_name: Option<&str>,
        description: Option<String>,
    ) -> Self {
        let file_name = file_name
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().into_owned());
        Self {
            upload_token,
            file_name,
            description,
        }
    }

    pub fn to_new_media_item(&self) -> NewMediaItem {
        NewMediaItem {
            description: self.description.clone(),
            simple_media_item: SimpleMediaItem {
                upload_token: self.upload_token.as_str().to_string(),
                file_name: self.file_name.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Album position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionType {
    PositionTypeUnspecified,
    FirstInAlbum,
    #[default]
    LastInAlbum,
    AfterMediaItem,
    AfterEnrichmentItem,
}

/// Where new items or enrichments are inserted in an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPosition {
    pub position: PositionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_media_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_enrichment_item_id: Option<String>,
}

/// A trimmed, non-blank id, or `None`.
fn present(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

impl AlbumPosition {
    /// Builds the position for a request, or `None` for the service default
    /// (append at the end).
    pub fn resolve(
        album_id: Option<&str>,
        position: PositionType,
        relative_media_item_id: Option<&str>,
        relative_enrichment_item_id: Option<&str>,
    ) -> Result<Option<Self>, ProtocolError> {
        let album_id = present(album_id);
        let media_id = present(relative_media_item_id);
        let enrichment_id = present(relative_enrichment_item_id);

        if album_id.is_none()
            && (position != PositionType::LastInAlbum
                || media_id.is_some()
                || enrichment_id.is_some())
        {
            return Err(ProtocolError::PositionWithoutAlbum);
        }
        if media_id.is_some() && enrichment_id.is_some() {
            return Err(ProtocolError::ConflictingRelativeItems);
        }

        let pos = match position {
            PositionType::LastInAlbum | PositionType::PositionTypeUnspecified => None,
            PositionType::FirstInAlbum => Some(Self {
                position,
                relative_media_item_id: None,
                relative_enrichment_item_id: None,
            }),
            PositionType::AfterMediaItem => {
                let id = media_id.ok_or(ProtocolError::MissingRelativeItem(position))?;
                Some(Self {
                    position,
                    relative_media_item_id: Some(id.to_string()),
                    relative_enrichment_item_id: None,
                })
            }
            PositionType::AfterEnrichmentItem => {
                let id = enrichment_id.ok_or(ProtocolError::MissingRelativeItem(position))?;
                Some(Self {
                    position,
                    relative_media_item_id: None,
                    relative_enrichment_item_id: Some(id.to_string()),
                })
            }
        };
        Ok(pos)
    }
}

// ---------------------------------------------------------------------------
// Enrichments
// ---------------------------------------------------------------------------

/// An enrichment to add to an album. Exactly one field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrichmentItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_enrichment: Option<TextEnrichment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_enrichment: Option<LocationEnrichment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_enrichment: Option<MapEnrichment>,
}

impl NewEnrichmentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text_enrichment: Some(TextEnrichment { text: text.into() }),
            location_enrichment: None,
            map_enrichment: None,
        }
    }

    pub fn location(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            text_enrichment: None,
            location_enrichment: Some(LocationEnrichment {
                location: Location::new(name, latitude, longitude),
            }),
            map_enrichment: None,
        }
    }

    pub fn map(origin: Location, destination: Location) -> Self {
        Self {
            text_enrichment: None,
            location_enrichment: None,
            map_enrichment: Some(MapEnrichment {
                origin,
                destination,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEnrichment {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEnrichment {
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEnrichment {
    pub origin: Location,
    pub destination: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_name: String,
    pub latlng: LatLng,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            location_name: name.into(),
            latlng: LatLng {
                latitude,
                longitude,
            },
        }
    }
}

/// WGS84 coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// An enrichment already present in an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentItem {
    pub id: String,
}

// ---------------------------------------------------------------------------
// int64 fields encoded as JSON strings
// ---------------------------------------------------------------------------

mod int64 {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

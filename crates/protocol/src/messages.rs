use serde::{Deserialize, Serialize};

use crate::filters::Filter;
use crate::types::{
    Album, AlbumPosition, EnrichmentItem, MediaItem, NewEnrichmentItem, NewMediaItem,
    NewMediaItemResult, ShareInfo, SharedAlbumOptions, Status,
};

/// A list response carrying a continuation token.
pub trait Paged {
    type Item;

    fn next_page_token(&self) -> Option<&str>;

    fn into_items(self) -> Vec<Self::Item>;
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAlbumRequest {
    pub album: NewAlbum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
}

/// Body of `mediaItems:batchCreate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    pub new_media_items: Vec<NewMediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_position: Option<AlbumPosition>,
}

/// Body of `mediaItems:search`. Without `album_id` or `filters` the service
/// returns the whole library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<String>,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Filter>,
}

/// Body of `albums/{id}:batchAddMediaItems` and `:batchRemoveMediaItems`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemIdsRequest {
    pub media_item_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAlbumRequest {
    pub shared_album_options: SharedAlbumOptions,
}

/// Body of `sharedAlbums:join` and `sharedAlbums:leave`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTokenRequest {
    pub share_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEnrichmentRequest {
    pub new_enrichment_item: NewEnrichmentItem,
    pub album_position: AlbumPosition,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response of `GET albums` and `GET sharedAlbums`; only one list is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsListResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub albums: Vec<Album>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_albums: Vec<Album>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl Paged for AlbumsListResponse {
    type Item = Album;

    fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }

    fn into_items(mut self) -> Vec<Album> {
        self.albums.append(&mut self.shared_albums);
        self.albums
    }
}

/// Response of `GET mediaItems` and `mediaItems:search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_items: Vec<MediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl Paged for MediaItemsResponse {
    type Item = MediaItem;

    fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }

    fn into_items(self) -> Vec<MediaItem> {
        self.media_items
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsBatchGetResponse {
    #[serde(default)]
    pub media_item_results: Vec<MediaItemResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_item: Option<MediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub new_media_item_results: Vec<NewMediaItemResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAlbumResponse {
    pub share_info: ShareInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSharedAlbumResponse {
    pub album: Album,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEnrichmentResponse {
    pub enrichment_item: EnrichmentItem,
}

/// Error envelope returned by the REST endpoints on non-success status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PositionType, SimpleMediaItem};

    #[test]
    fn batch_create_omits_absent_album() {
        let req = BatchCreateRequest {
            album_id: None,
            new_media_items: vec![NewMediaItem {
                description: None,
                simple_media_item: SimpleMediaItem {
                    upload_token: "tok".into(),
                    file_name: None,
                },
            }],
            album_position: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("albumId"));
        assert!(!json.contains("albumPosition"));
        assert!(json.contains(r#""newMediaItems":[{"simpleMediaItem":{"uploadToken":"tok"}}]"#));
    }

    #[test]
    fn batch_create_with_position() {
        let req = BatchCreateRequest {
            album_id: Some("a1".into()),
            new_media_items: Vec::new(),
            album_position: AlbumPosition::resolve(Some("a1"), PositionType::FirstInAlbum, None, None)
                .unwrap(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["albumId"], "a1");
        assert_eq!(json["albumPosition"]["position"], "FIRST_IN_ALBUM");
    }

    #[test]
    fn albums_page_exposes_token() {
        let json = r#"{"albums":[{"id":"a","title":"A","mediaItemsCount":"2"}],"nextPageToken":"next"}"#;
        let page: AlbumsListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token(), Some("next"));
        assert_eq!(page.into_items().len(), 1);

        let shared: AlbumsListResponse =
            serde_json::from_str(r#"{"sharedAlbums":[{"id":"s"}],"nextPageToken":""}"#).unwrap();
        assert_eq!(shared.next_page_token(), None);
        assert_eq!(shared.into_items()[0].id, "s");
    }

    #[test]
    fn empty_media_page_parses() {
        let page: MediaItemsResponse = serde_json::from_str("{}").unwrap();
        assert!(page.next_page_token().is_none());
        assert!(page.into_items().is_empty());
    }

    #[test]
    fn search_request_shape() {
        let req = SearchRequest {
            album_id: Some("a1".into()),
            page_size: 100,
            page_token: None,
            filters: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"albumId":"a1","pageSize":100}"#);
    }

    #[test]
    fn api_error_envelope() {
        let json = r#"{"error":{"code":400,"message":"Invalid album id","status":"INVALID_ARGUMENT"}}"#;
        let err: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.code, 400);
        assert_eq!(err.error.status, "INVALID_ARGUMENT");
    }

    #[test]
    fn batch_create_response_partial_failure() {
        let json = r#"{"newMediaItemResults":[
            {"uploadToken":"t1","status":{"message":"Success"}},
            {"uploadToken":"t2","status":{"code":3,"message":"Failed: invalid token"}}
        ]}"#;
        let resp: BatchCreateResponse = serde_json::from_str(json).unwrap();
        assert!(resp.new_media_item_results[0].status.as_ref().unwrap().is_ok());
        assert!(!resp.new_media_item_results[1].status.as_ref().unwrap().is_ok());
    }
}

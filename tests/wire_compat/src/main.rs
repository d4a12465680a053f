fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use gphotos_protocol::filters::{ContentCategory, Feature, MediaType};
    use gphotos_protocol::messages::{
        AddEnrichmentRequest, AlbumsListResponse, ApiErrorResponse, BatchCreateRequest,
        BatchCreateResponse, MediaItemsBatchGetResponse, MediaItemsResponse, Paged,
        SearchRequest, ShareAlbumResponse,
    };
    use gphotos_protocol::types::NewEnrichmentItem;
    use gphotos_protocol::{
        Album, AlbumPosition, MediaItem, PositionType, UploadItem, UploadToken,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn parse_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        serde_json::from_value(load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// The service writes `2.0` as `2`; serde writes an `f64` as `2.0`.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Asserts that `value` serializes to exactly the fixture's JSON
    /// (order-independent, float-normalized).
    fn assert_serializes_to<T: serde::Serialize>(value: &T, name: &str) {
        let fixture = load_fixture(name);
        let actual = serde_json::to_value(value)
            .unwrap_or_else(|e| panic!("failed to serialize {name}: {e}"));
        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&actual),
            "wire mismatch for {name}:\n  service: {fixture}\n  ours:    {actual}"
        );
    }

    /// Deserializes a fixture, re-serializes it and compares.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let parsed: T = parse_fixture(name);
        assert_serializes_to(&parsed, name);
    }

    // --- Resources ---

    #[test]
    fn fixture_album() {
        roundtrip_test::<Album>("album.json");

        let album: Album = parse_fixture("album.json");
        assert_eq!(album.media_items_count, 128);
        let share = album.share_info.unwrap();
        assert!(share.shared_album_options.is_collaborative);
        assert!(!share.shared_album_options.is_commentable);
    }

    #[test]
    fn fixture_media_item_photo() {
        roundtrip_test::<MediaItem>("media_item_photo.json");

        let item: MediaItem = parse_fixture("media_item_photo.json");
        let photo = item.media_metadata.photo.as_ref().unwrap();
        assert_eq!(photo.camera_model.as_deref(), Some("Pixel 7"));
        assert_eq!(photo.iso_equivalent, Some(45));
        assert!(item.media_metadata.video.is_none());
        assert_eq!(item.to_string(), "PXL_20230601_123456.jpg 2023-06-01 12:34:56");
    }

    #[test]
    fn fixture_media_item_video() {
        roundtrip_test::<MediaItem>("media_item_video.json");

        let item: MediaItem = parse_fixture("media_item_video.json");
        let video = item.media_metadata.video.unwrap();
        assert_eq!(video.status.as_deref(), Some("READY"));
        assert_eq!(
            item.contributor_info.unwrap().display_name.as_deref(),
            Some("Ana")
        );
    }

    #[test]
    fn fixture_error_response() {
        roundtrip_test::<ApiErrorResponse>("error_response.json");

        let err: ApiErrorResponse = parse_fixture("error_response.json");
        assert_eq!(err.error.code, 400);
        assert_eq!(err.error.status, "INVALID_ARGUMENT");
    }

    // --- List responses ---

    #[test]
    fn fixture_albums_list_response() {
        let resp: AlbumsListResponse = parse_fixture("albums_list_response.json");
        assert_eq!(
            resp.next_page_token(),
            Some("CkgKQnR5cGUuZ29vZ2xlYXBpcy5jb20v")
        );

        // mediaItemsCount arrives as a string or a number.
        let albums = resp.into_items();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].media_items_count, 128);
        assert!(albums[0].is_writeable);
        assert_eq!(albums[1].media_items_count, 7);
        assert!(!albums[1].is_writeable);
    }

    #[test]
    fn fixture_media_items_response_last_page() {
        let resp: MediaItemsResponse = parse_fixture("media_items_response.json");
        assert!(resp.next_page_token().is_none());
        let items = resp.into_items();
        assert_eq!(items.len(), 1);
        assert!(items[0].media_metadata.photo.is_some());
    }

    #[test]
    fn fixture_batch_get_response() {
        let resp: MediaItemsBatchGetResponse = parse_fixture("batch_get_response.json");
        assert_eq!(resp.media_item_results.len(), 2);
        assert!(resp.media_item_results[0].status.is_none());
        let failed = resp.media_item_results[1].status.as_ref().unwrap();
        assert!(!failed.is_ok());
        assert!(resp.media_item_results[1].media_item.is_none());
    }

    #[test]
    fn fixture_batch_create_response() {
        let resp: BatchCreateResponse = parse_fixture("batch_create_response.json");
        let results = resp.new_media_item_results;
        assert_eq!(results.len(), 2);

        // Success carries a message but no code.
        assert!(results[0].status.as_ref().unwrap().is_ok());
        assert_eq!(results[0].media_item.as_ref().unwrap().filename, "tram.jpg");
        assert_eq!(results[1].status.as_ref().unwrap().code, 3);
        assert!(results[1].media_item.is_none());
    }

    #[test]
    fn fixture_share_album_response() {
        let resp: ShareAlbumResponse = parse_fixture("share_album_response.json");
        assert_eq!(resp.share_info.share_token.as_deref(), Some("AOVP0mTshare"));
        assert!(resp.share_info.is_joinable);
    }

    // --- Requests built by the client ---

    #[test]
    fn fixture_batch_create_request() {
        let items = [
            UploadItem::new(
                UploadToken::new("CAIS6QIAkVvBsrqnVuuM1yC8mL0").unwrap(),
                Some("/home/ana/Pictures/tram.jpg"),
                Some("Tram 28".into()),
            ),
            UploadItem::new(
                UploadToken::new("CAIS6QIAkVvBsrqnVuuM1yC8mL1").unwrap(),
                None,
                None,
            ),
        ];
        let req = BatchCreateRequest {
            album_id: Some("AF1QipAlbumA".into()),
            new_media_items: items.iter().map(UploadItem::to_new_media_item).collect(),
            album_position: AlbumPosition::resolve(
                Some("AF1QipAlbumA"),
                PositionType::AfterMediaItem,
                Some("AF1QipPhoto01"),
                None,
            )
            .unwrap(),
        };
        assert_serializes_to(&req, "batch_create_request.json");
    }

    #[test]
    fn fixture_search_request() {
        let mut filter = gphotos_protocol::Filter::date_range(
            gphotos_protocol::filters::Date::new(2023, 6, 1),
            gphotos_protocol::filters::Date::new(2023, 6, 30),
        );
        filter.content_filter = gphotos_protocol::Filter::categories([
            ContentCategory::Landscapes,
            ContentCategory::Cityscapes,
        ])
        .content_filter;
        if let Some(content) = filter.content_filter.as_mut() {
            content.excluded_content_categories = vec![ContentCategory::Selfies];
        }
        filter.feature_filter = gphotos_protocol::Filter::favorites().feature_filter;
        filter.media_type_filter =
            gphotos_protocol::Filter::media_types([MediaType::Photo]).media_type_filter;
        filter.include_archived_media = true;
        filter.validate().unwrap();

        let req = SearchRequest {
            album_id: None,
            page_size: 100,
            page_token: Some("CkgKQnR5cGUuZ29vZ2xlYXBpcy5jb20v".into()),
            filters: Some(filter.tidy()),
        };
        assert_serializes_to(&req, "search_request.json");

        let parsed: SearchRequest = parse_fixture("search_request.json");
        let features = parsed.filters.unwrap().feature_filter.unwrap();
        assert_eq!(features.included_features, [Feature::Favorites]);
    }

    #[test]
    fn fixture_add_enrichment_request() {
        let req = AddEnrichmentRequest {
            new_enrichment_item: NewEnrichmentItem::location("Belém Tower", 38.6916, -9.216),
            album_position: AlbumPosition::resolve(
                Some("AF1QipAlbumA"),
                PositionType::FirstInAlbum,
                None,
                None,
            )
            .unwrap()
            .unwrap(),
        };
        assert_serializes_to(&req, "add_enrichment_request.json");
    }
}

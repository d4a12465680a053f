//! Album and sharing endpoints.

use std::collections::HashSet;

use gphotos_protocol::constants::{
    ALBUM_ACTION_ADD_ENRICHMENT, ALBUM_ACTION_BATCH_ADD, ALBUM_ACTION_BATCH_REMOVE,
    ALBUM_ACTION_SHARE, ALBUM_ACTION_UNSHARE, PATH_ALBUMS, PATH_SHARED_ALBUMS,
    PATH_SHARED_ALBUMS_JOIN, PATH_SHARED_ALBUMS_LEAVE,
};
use gphotos_protocol::messages::{
    AddEnrichmentRequest, AddEnrichmentResponse, AlbumsListResponse, CreateAlbumRequest,
    JoinSharedAlbumResponse, MediaItemIdsRequest, NewAlbum, ShareAlbumRequest,
    ShareAlbumResponse, ShareTokenRequest,
};
use gphotos_protocol::types::{EnrichmentItem, NewEnrichmentItem, ShareInfo, SharedAlbumOptions};
use gphotos_protocol::{Album, AlbumPosition};
use tracing::info;

use crate::client::{Client, Error, encode_segment};
use crate::paging::{
    BATCH_SIZE, DEFAULT_ALBUM_PAGE_SIZE, ListOptions, MAX_ALBUM_PAGE_SIZE, collect_pages,
    list_params,
};

fn album_path(album_id: &str) -> String {
    format!("{PATH_ALBUMS}/{}", encode_segment(album_id))
}

fn album_action(album_id: &str, action: &str) -> String {
    format!("{}:{action}", album_path(album_id))
}

fn non_blank<'a>(value: &'a str, what: &str) -> Result<&'a str, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be blank")));
    }
    Ok(value)
}

impl Client {
    // -----------------------------------------------------------------------
    // Albums
    // -----------------------------------------------------------------------

    /// Lists the albums shown in the user's Albums tab.
    pub async fn list_albums(&self, options: &ListOptions) -> Result<Vec<Album>, Error> {
        self.list_album_endpoint(PATH_ALBUMS, options).await
    }

    /// Lists albums shared with or by the user.
    pub async fn list_shared_albums(&self, options: &ListOptions) -> Result<Vec<Album>, Error> {
        self.list_album_endpoint(PATH_SHARED_ALBUMS, options).await
    }

    async fn list_album_endpoint(
        &self,
        path: &str,
        options: &ListOptions,
    ) -> Result<Vec<Album>, Error> {
        let page_size = options.resolve_page_size(DEFAULT_ALBUM_PAGE_SIZE, MAX_ALBUM_PAGE_SIZE)?;
        let exclude = options.exclude_non_app_created_data;

        collect_pages(options, &self.pages, |token| async move {
            let params = list_params(page_size, DEFAULT_ALBUM_PAGE_SIZE, exclude, token.as_deref());
            self.get::<AlbumsListResponse>(path, &params).await
        })
        .await
    }

    pub async fn get_album(&self, album_id: &str) -> Result<Album, Error> {
        let album_id = non_blank(album_id, "album id")?;
        self.get(&album_path(album_id), &[]).await
    }

    /// Finds an album by title, ignoring case. Scans every album page.
    pub async fn get_album_by_title(&self, title: &str) -> Result<Option<Album>, Error> {
        let wanted = title.trim().to_lowercase();
        let albums = self.list_albums(&ListOptions::default()).await?;
        Ok(albums
            .into_iter()
            .find(|a| a.title.trim().to_lowercase() == wanted))
    }

    pub async fn create_album(&self, title: &str) -> Result<Album, Error> {
        let title = non_blank(title, "album title")?;
        let req = CreateAlbumRequest {
            album: NewAlbum {
                title: title.to_string(),
            },
        };
        let album: Album = self.post(PATH_ALBUMS, &req).await?;
        info!(album = %album.id, title, "album created");
        Ok(album)
    }

    /// Returns the album with `title`, creating it when none exists.
    pub async fn get_or_create_album(&self, title: &str) -> Result<Album, Error> {
        match self.get_album_by_title(title).await? {
            Some(album) => Ok(album),
            None => self.create_album(title).await,
        }
    }

    /// Adds existing media items to an album. Duplicate ids are sent once;
    /// ids go out in batches of 50.
    pub async fn add_media_items_to_album<S: AsRef<str>>(
        &self,
        album_id: &str,
        media_item_ids: &[S],
    ) -> Result<(), Error> {
        let album_id = non_blank(album_id, "album id")?;
        let mut seen = HashSet::new();
        let ids: Vec<String> = media_item_ids
            .iter()
            .map(|id| id.as_ref().to_string())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        self.batch_album_ids(album_id, ALBUM_ACTION_BATCH_ADD, &ids)
            .await?;
        info!(album = album_id, count = ids.len(), "media items added to album");
        Ok(())
    }

    /// Removes media items from an album, in batches of 50.
    pub async fn remove_media_items_from_album<S: AsRef<str>>(
        &self,
        album_id: &str,
        media_item_ids: &[S],
    ) -> Result<(), Error> {
        let album_id = non_blank(album_id, "album id")?;
        let ids: Vec<String> = media_item_ids
            .iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        self.batch_album_ids(album_id, ALBUM_ACTION_BATCH_REMOVE, &ids)
            .await?;
        info!(album = album_id, count = ids.len(), "media items removed from album");
        Ok(())
    }

    async fn batch_album_ids(
        &self,
        album_id: &str,
        action: &str,
        ids: &[String],
    ) -> Result<(), Error> {
        let path = album_action(album_id, action);
        for batch in ids.chunks(BATCH_SIZE) {
            let req = MediaItemIdsRequest {
                media_item_ids: batch.to_vec(),
            };
            self.post_unit(&path, &req).await?;
        }
        Ok(())
    }

    /// Adds a text, location or map enrichment at `position`.
    pub async fn add_enrichment(
        &self,
        album_id: &str,
        item: NewEnrichmentItem,
        position: AlbumPosition,
    ) -> Result<EnrichmentItem, Error> {
        let album_id = non_blank(album_id, "album id")?;
        let req = AddEnrichmentRequest {
            new_enrichment_item: item,
            album_position: position,
        };
        let resp: AddEnrichmentResponse = self
            .post(&album_action(album_id, ALBUM_ACTION_ADD_ENRICHMENT), &req)
            .await?;
        Ok(resp.enrichment_item)
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    pub async fn share_album(
        &self,
        album_id: &str,
        options: SharedAlbumOptions,
    ) -> Result<ShareInfo, Error> {
        let album_id = non_blank(album_id, "album id")?;
        let req = ShareAlbumRequest {
            shared_album_options: options,
        };
        let resp: ShareAlbumResponse = self
            .post(&album_action(album_id, ALBUM_ACTION_SHARE), &req)
            .await?;
        info!(album = album_id, "album shared");
        Ok(resp.share_info)
    }

    pub async fn unshare_album(&self, album_id: &str) -> Result<(), Error> {
        let album_id = non_blank(album_id, "album id")?;
        self.post_unit(
            &album_action(album_id, ALBUM_ACTION_UNSHARE),
            &serde_json::json!({}),
        )
        .await?;
        info!(album = album_id, "album unshared");
        Ok(())
    }

    /// Fetches a shared album by its share token.
    pub async fn get_shared_album(&self, share_token: &str) -> Result<Album, Error> {
        let share_token = non_blank(share_token, "share token")?;
        let path = format!("{PATH_SHARED_ALBUMS}/{}", encode_segment(share_token));
        self.get(&path, &[]).await
    }

    pub async fn join_shared_album(&self, share_token: &str) -> Result<Album, Error> {
        let req = ShareTokenRequest {
            share_token: non_blank(share_token, "share token")?.to_string(),
        };
        let resp: JoinSharedAlbumResponse = self.post(PATH_SHARED_ALBUMS_JOIN, &req).await?;
        Ok(resp.album)
    }

    pub async fn leave_shared_album(&self, share_token: &str) -> Result<(), Error> {
        let req = ShareTokenRequest {
            share_token: non_blank(share_token, "share token")?.to_string(),
        };
        self.post_unit(PATH_SHARED_ALBUMS_LEAVE, &req).await
    }
}

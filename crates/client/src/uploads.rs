//! Turning uploaded bytes into library items.
//!
//! An upload token only becomes a media item once it is passed to
//! `mediaItems:batchCreate`, optionally straight into an album.

use std::path::{Path, PathBuf};

use gphotos_protocol::constants::PATH_MEDIA_ITEMS_BATCH_CREATE;
use gphotos_protocol::messages::{BatchCreateRequest, BatchCreateResponse};
use gphotos_protocol::{AlbumPosition, NewMediaItemResult, ProtocolError, UploadItem};
use gphotos_upload::{FileUploadResult, upload_many};
use tracing::{info, warn};

use crate::client::{Client, Error};
use crate::paging::BATCH_SIZE;

/// Outcome of [`Client::upload_multiple`].
#[derive(Debug)]
pub struct UploadReport {
    /// One entry per input path, in input order.
    pub uploads: Vec<FileUploadResult>,
    /// Creation results for the files whose bytes were uploaded.
    pub created: Vec<NewMediaItemResult>,
}

impl UploadReport {
    pub fn failed_uploads(&self) -> impl Iterator<Item = &FileUploadResult> {
        self.uploads.iter().filter(|r| !r.is_success())
    }

    /// Items the service created successfully.
    pub fn created_items(&self) -> impl Iterator<Item = &NewMediaItemResult> {
        self.created
            .iter()
            .filter(|r| r.status.as_ref().is_none_or(|s| s.is_ok()) && r.media_item.is_some())
    }
}

impl Client {
    /// Creates media items from upload tokens, 50 per request, optionally
    /// inside `album_id` at `position`.
    pub async fn create_media_items(
        &self,
        items: &[UploadItem],
        album_id: Option<&str>,
        position: Option<AlbumPosition>,
    ) -> Result<Vec<NewMediaItemResult>, Error> {
        if items.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one upload item is required".into(),
            ));
        }
        let album_id = album_id.map(str::trim).filter(|id| !id.is_empty());
        if album_id.is_none() && position.is_some() {
            return Err(ProtocolError::PositionWithoutAlbum.into());
        }

        let mut results = Vec::with_capacity(items.len());
        for batch in items.chunks(BATCH_SIZE) {
            let req = BatchCreateRequest {
                album_id: album_id.map(str::to_string),
                new_media_items: batch.iter().map(UploadItem::to_new_media_item).collect(),
                album_position: position.clone(),
            };
            let resp: BatchCreateResponse = self.post(PATH_MEDIA_ITEMS_BATCH_CREATE, &req).await?;
            results.extend(resp.new_media_item_results);
        }

        for result in &results {
            match &result.status {
                Some(status) if !status.is_ok() => {
                    warn!(token = %result.upload_token, %status, "media item not created");
                }
                _ => {}
            }
        }
        info!(count = results.len(), album = album_id.unwrap_or("-"), "media items created");
        Ok(results)
    }

    /// Uploads one file and creates a media item for it.
    pub async fn upload_single(
        &self,
        path: &Path,
        album_id: Option<&str>,
        description: Option<String>,
    ) -> Result<NewMediaItemResult, Error> {
        let token = self.uploader().upload(path, self.upload_method()).await?;
        let item = UploadItem::new(token, path.to_str(), description);

        self.create_media_items(&[item], album_id, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("batch create returned no results".into()))
    }

    /// Uploads `paths` with up to `concurrency` in flight, then creates media
    /// items for every file that uploaded. Failed uploads are reported, not
    /// raised.
    pub async fn upload_multiple(
        &self,
        paths: &[PathBuf],
        album_id: Option<&str>,
        concurrency: usize,
    ) -> Result<UploadReport, Error> {
        let uploads = upload_many(self.uploader(), paths, self.upload_method(), concurrency).await;

        let items: Vec<UploadItem> = uploads
            .iter()
            .filter_map(|u| {
                let token = u.result.as_ref().ok()?;
                Some(UploadItem::new(token.clone(), u.path.to_str(), None))
            })
            .collect();

        let created = if items.is_empty() {
            Vec::new()
        } else {
            self.create_media_items(&items, album_id, None).await?
        };

        Ok(UploadReport { uploads, created })
    }
}

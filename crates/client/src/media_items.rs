//! Media item listing, lookup and search.

use chrono::NaiveDate;
use gphotos_protocol::constants::{PATH_MEDIA_ITEMS, PATH_MEDIA_ITEMS_BATCH_GET, PATH_MEDIA_ITEMS_SEARCH};
use gphotos_protocol::filters::ContentCategory;
use gphotos_protocol::messages::{MediaItemsBatchGetResponse, MediaItemsResponse, SearchRequest};
use gphotos_protocol::{Filter, MediaItem};
use tracing::warn;

use crate::client::{Client, Error, encode_segment};
use crate::paging::{
    BATCH_SIZE, DEFAULT_MEDIA_ITEM_PAGE_SIZE, ListOptions, MAX_MEDIA_ITEM_PAGE_SIZE, PageEvent,
    collect_pages, list_params,
};

impl Client {
    /// Lists every media item in the library, newest first.
    pub async fn list_media_items(&self, options: &ListOptions) -> Result<Vec<MediaItem>, Error> {
        let page_size = self.media_page_size(options)?;
        let exclude = options.exclude_non_app_created_data;

        collect_pages(options, &self.pages, |token| async move {
            let params = list_params(
                page_size,
                DEFAULT_MEDIA_ITEM_PAGE_SIZE,
                exclude,
                token.as_deref(),
            );
            self.get::<MediaItemsResponse>(PATH_MEDIA_ITEMS, &params).await
        })
        .await
    }

    /// Lists the contents of one album, in album order.
    pub async fn media_items_by_album(
        &self,
        album_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<MediaItem>, Error> {
        if album_id.trim().is_empty() {
            return Err(Error::InvalidArgument("album id must not be blank".into()));
        }
        self.search(Some(album_id.trim()), None, options).await
    }

    /// Searches the library. Empty sub-filters are dropped before sending.
    pub async fn search_media_items(
        &self,
        filter: Filter,
        options: &ListOptions,
    ) -> Result<Vec<MediaItem>, Error> {
        let mut filter = filter.tidy();
        if options.exclude_non_app_created_data {
            filter.exclude_non_app_created_data = true;
        }
        filter.validate()?;
        self.search(None, Some(filter), options).await
    }

    /// Items created within `start..=end`.
    pub async fn media_items_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        options: &ListOptions,
    ) -> Result<Vec<MediaItem>, Error> {
        self.search_media_items(Filter::date_range(start, end), options)
            .await
    }

    /// Items matching any of `categories`.
    pub async fn media_items_by_categories(
        &self,
        categories: &[ContentCategory],
        options: &ListOptions,
    ) -> Result<Vec<MediaItem>, Error> {
        self.search_media_items(Filter::categories(categories.iter().copied()), options)
            .await
    }

    async fn search(
        &self,
        album_id: Option<&str>,
        filters: Option<Filter>,
        options: &ListOptions,
    ) -> Result<Vec<MediaItem>, Error> {
        let page_size = self.media_page_size(options)?;

        collect_pages(options, &self.pages, |page_token| {
            let req = SearchRequest {
                album_id: album_id.map(str::to_string),
                page_size,
                page_token,
                filters: filters.clone(),
            };
            async move {
                self.post::<_, MediaItemsResponse>(PATH_MEDIA_ITEMS_SEARCH, &req)
                    .await
            }
        })
        .await
    }

    fn media_page_size(&self, options: &ListOptions) -> Result<u32, Error> {
        options.resolve_page_size(DEFAULT_MEDIA_ITEM_PAGE_SIZE, MAX_MEDIA_ITEM_PAGE_SIZE)
    }

    pub async fn get_media_item(&self, media_item_id: &str) -> Result<MediaItem, Error> {
        let id = media_item_id.trim();
        if id.is_empty() {
            return Err(Error::InvalidArgument("media item id must not be blank".into()));
        }
        let path = format!("{PATH_MEDIA_ITEMS}/{}", encode_segment(id));
        self.get(&path, &[]).await
    }

    /// Fetches many items by id, 50 per request. Ids the service reports a
    /// failed status for are logged and left out of the result.
    pub async fn get_media_items_by_ids<S: AsRef<str>>(
        &self,
        media_item_ids: &[S],
    ) -> Result<Vec<MediaItem>, Error> {
        let batches: Vec<&[S]> = media_item_ids.chunks(BATCH_SIZE).collect();
        let mut items = Vec::with_capacity(media_item_ids.len());

        for (index, batch) in batches.iter().enumerate() {
            let params: Vec<(&str, String)> = batch
                .iter()
                .map(|id| ("mediaItemIds", id.as_ref().to_string()))
                .collect();
            let resp: MediaItemsBatchGetResponse =
                self.get(PATH_MEDIA_ITEMS_BATCH_GET, &params).await?;

            let mut found = Vec::with_capacity(resp.media_item_results.len());
            for result in resp.media_item_results {
                match (result.media_item, result.status) {
                    (_, Some(status)) if !status.is_ok() => {
                        warn!(%status, "media item lookup failed, skipping");
                    }
                    (Some(item), _) => found.push(item),
                    (None, _) => warn!("media item result without item, skipping"),
                }
            }

            let page_number = index as u32 + 1;
            if index + 1 < batches.len() {
                let event = PageEvent::for_page(&found, page_number, items.len() + found.len());
                let _ = self.pages.send(event);
            }
            items.extend(found);
        }

        Ok(items)
    }
}

//! Page-token driven listing.
//!
//! Every list endpoint returns at most one page plus a `nextPageToken`.
//! [`collect_pages`] follows the tokens until the service stops returning
//! one, the caller's page budget runs out, or the caller cancels.

use std::future::Future;

use chrono::{DateTime, Utc};
use gphotos_protocol::{Album, MediaItem, Paged};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::Error;

pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_ALBUM_PAGE_SIZE: u32 = 50;
pub const DEFAULT_ALBUM_PAGE_SIZE: u32 = 50;
pub const MAX_MEDIA_ITEM_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MEDIA_ITEM_PAGE_SIZE: u32 = 100;

/// Maximum ids per batch request (batch get, batch add/remove, batch create).
pub const BATCH_SIZE: usize = 50;

/// Options shared by every listing call.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Items per page; `None` uses the endpoint default.
    pub page_size: Option<u32>,
    /// Stop after this many pages.
    pub max_pages: Option<u32>,
    pub exclude_non_app_created_data: bool,
    pub cancel: Option<CancellationToken>,
}

impl ListOptions {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn app_created_only(mut self) -> Self {
        self.exclude_non_app_created_data = true;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Resolves the page size against an endpoint's limits.
    pub(crate) fn resolve_page_size(&self, default: u32, max: u32) -> Result<u32, Error> {
        let size = self.page_size.unwrap_or(default);
        if !(MIN_PAGE_SIZE..=max).contains(&size) {
            return Err(Error::InvalidArgument(format!(
                "page size must be between {MIN_PAGE_SIZE} and {max}, got {size}"
            )));
        }
        Ok(size)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Emitted whenever a listing continues onto another page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEvent {
    /// Items on the page just received.
    pub page_size: usize,
    /// 1-based.
    pub page_number: u32,
    /// Items received so far, this page included.
    pub record_count: usize,
    /// Earliest and latest creation time on the page, for media items.
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

impl PageEvent {
    pub(crate) fn for_page<T: Dated>(items: &[T], page_number: u32, record_count: usize) -> Self {
        let dates = || items.iter().filter_map(T::created);
        Self {
            page_size: items.len(),
            page_number,
            record_count,
            min_date: dates().min(),
            max_date: dates().max(),
        }
    }
}

/// Items that may carry a creation timestamp.
pub(crate) trait Dated {
    fn created(&self) -> Option<DateTime<Utc>>;
}

impl Dated for Album {
    fn created(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Dated for MediaItem {
    fn created(&self) -> Option<DateTime<Utc>> {
        Some(self.media_metadata.creation_time)
    }
}

/// Query parameters for GET list endpoints. `pageSize` is only sent when it
/// differs from the endpoint default.
pub(crate) fn list_params(
    page_size: u32,
    default_page_size: u32,
    exclude_non_app_created_data: bool,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(3);
    if page_size != default_page_size {
        params.push(("pageSize", page_size.to_string()));
    }
    if exclude_non_app_created_data {
        params.push(("excludeNonAppCreatedData", "true".to_string()));
    }
    if let Some(token) = page_token.filter(|t| !t.trim().is_empty()) {
        params.push(("pageToken", token.to_string()));
    }
    params
}

/// Fetches pages with `fetch(page_token)` and concatenates their items.
///
/// Cancellation is checked before every request; a cancelled listing
/// returns what it has collected so far.
pub(crate) async fn collect_pages<R, F, Fut>(
    options: &ListOptions,
    events: &broadcast::Sender<PageEvent>,
    mut fetch: F,
) -> Result<Vec<R::Item>, Error>
where
    R: Paged,
    R::Item: Dated,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<R, Error>>,
{
    let max_pages = options.max_pages.unwrap_or(u32::MAX);
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page_number = 1u32;

    while page_number <= max_pages {
        if options.is_cancelled() {
            debug!(page_number, collected = items.len(), "listing cancelled");
            break;
        }

        let page = fetch(page_token.take()).await?;
        let next = page.next_page_token().map(str::to_string);
        let batch = page.into_items();

        if next.is_some() {
            let event = PageEvent::for_page(&batch, page_number, items.len() + batch.len());
            debug!(
                page = page_number,
                page_size = event.page_size,
                total = event.record_count,
                "page received"
            );
            let _ = events.send(event);
        }
        items.extend(batch);

        match next {
            Some(token) => page_token = Some(token),
            None => break,
        }
        page_number += 1;
    }

    Ok(items)
}

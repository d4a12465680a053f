//! Uploading several files with bounded parallelism.
//!
//! Each file runs independently through the engine. If one fails, the
//! others continue; the caller gets one result per input path, in input
//! order.

use std::path::PathBuf;

use futures_util::stream::{self, StreamExt};
use gphotos_protocol::{UploadMethod, UploadToken};
use tracing::{error, info};

use crate::engine::UploadEngine;
use crate::error::UploadError;

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileUploadResult {
    pub path: PathBuf,
    pub result: Result<UploadToken, UploadError>,
}

impl FileUploadResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Uploads `paths` with at most `concurrency` uploads in flight.
///
/// Chunks of a single file are always sent in order; parallelism is only
/// across files. A `concurrency` of 0 is treated as 1.
pub async fn upload_many(
    engine: &UploadEngine,
    paths: &[PathBuf],
    method: UploadMethod,
    concurrency: usize,
) -> Vec<FileUploadResult> {
    stream::iter(paths.iter().cloned())
        .map(|path| async move {
            let result = engine.upload(&path, method).await;
            match &result {
                Ok(_) => info!(path = %path.display(), "upload completed"),
                Err(e) => error!(path = %path.display(), error = %e, "upload failed"),
            }
            FileUploadResult { path, result }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

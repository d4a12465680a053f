//! Upload state machine.
//!
//! One call to [`UploadEngine::upload`] owns its session, file handle and
//! retry counter. Nothing is shared between concurrent uploads except the
//! transport and the progress channel.

use std::path::Path;
use std::sync::Arc;

use gphotos_protocol::UploadToken;
use gphotos_protocol::constants::{
    HEADER_UPLOAD_CHUNK_GRANULARITY, HEADER_UPLOAD_COMMAND, HEADER_UPLOAD_CONTENT_TYPE,
    HEADER_UPLOAD_FILE_NAME, HEADER_UPLOAD_OFFSET, HEADER_UPLOAD_PROTOCOL,
    HEADER_UPLOAD_RAW_SIZE, HEADER_UPLOAD_SIZE_RECEIVED, HEADER_UPLOAD_STATUS,
    HEADER_UPLOAD_URL, UploadCommand, UploadMethod, UploadProtocol,
};
use gphotos_transfer::{
    ChunkAttempt, ChunkReader, MediaFile, ProgressChannel, UploadProgress, UploadSession,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::transport::{Headers, HttpResponse, HttpTransport};

/// Failed sends tolerated per chunk before the upload is abandoned.
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Drives the upload protocol against the service.
pub struct UploadEngine {
    transport: Arc<dyn HttpTransport>,
    upload_url: String,
    retry_limit: u32,
    progress: ProgressChannel,
    cancel: CancellationToken,
}

impl UploadEngine {
    /// Creates an engine that starts uploads at `upload_url`.
    pub fn new(transport: Arc<dyn HttpTransport>, upload_url: impl Into<String>) -> Self {
        Self {
            transport,
            upload_url: upload_url.into(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            progress: ProgressChannel::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the per-chunk retry ceiling.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Receives an event after every confirmed chunk.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    /// Token observed by [`upload`](Self::upload). Cancelling it stops every
    /// in-flight upload at its next send.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads `path` and returns the token for `mediaItems:batchCreate`.
    pub async fn upload(
        &self,
        path: &Path,
        method: UploadMethod,
    ) -> Result<UploadToken, UploadError> {
        self.upload_with_cancel(path, method, &self.cancel).await
    }

    /// Like [`upload`](Self::upload) but observes a caller-supplied token.
    pub async fn upload_with_cancel(
        &self,
        path: &Path,
        method: UploadMethod,
        cancel: &CancellationToken,
    ) -> Result<UploadToken, UploadError> {
        let media = MediaFile::resolve(path).await?;

        info!(
            file = %media.file_name,
            size = media.size,
            mime = media.mime_type,
            %method,
            "uploading media"
        );

        match method {
            UploadMethod::Simple => self.upload_simple(&media, cancel).await,
            UploadMethod::ResumableSingle => {
                let session = self.start_session(&media, cancel).await?;
                self.upload_single(&media, &session, cancel).await
            }
            UploadMethod::ResumableMultipart => {
                let session = self.start_session(&media, cancel).await?;
                self.upload_chunks(&media, session, cancel).await
            }
        }
    }

    // -----------------------------------------------------------------------
    // Branches
    // -----------------------------------------------------------------------

    async fn upload_simple(
        &self,
        media: &MediaFile,
        cancel: &CancellationToken,
    ) -> Result<UploadToken, UploadError> {
        let body = read_declared(media).await?;
        let headers: Headers = vec![
            (HEADER_UPLOAD_CONTENT_TYPE, media.mime_type.to_string()),
            (HEADER_UPLOAD_PROTOCOL, UploadProtocol::Raw.as_str().to_string()),
        ];

        check_cancelled(cancel)?;
        let resp = self.transport.send(&self.upload_url, body, headers).await?;
        if !resp.is_success() {
            return Err(failed(&resp));
        }
        token_from(&resp)
    }

    async fn start_session(
        &self,
        media: &MediaFile,
        cancel: &CancellationToken,
    ) -> Result<UploadSession, UploadError> {
        let headers: Headers = vec![
            (HEADER_UPLOAD_CONTENT_TYPE, media.mime_type.to_string()),
            (HEADER_UPLOAD_COMMAND, UploadCommand::Start.as_str().to_string()),
            (HEADER_UPLOAD_FILE_NAME, media.file_name.clone()),
            (
                HEADER_UPLOAD_PROTOCOL,
                UploadProtocol::Resumable.as_str().to_string(),
            ),
            (HEADER_UPLOAD_RAW_SIZE, media.size.to_string()),
        ];

        check_cancelled(cancel)?;
        let resp = self
            .transport
            .send(&self.upload_url, Vec::new(), headers)
            .await?;

        if !resp.is_success() {
            return Err(UploadError::SessionInitFailed(format!(
                "start returned HTTP {}: {}",
                resp.status,
                resp.text()
            )));
        }

        let url = resp
            .header(HEADER_UPLOAD_URL)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                UploadError::SessionInitFailed(format!("response has no {HEADER_UPLOAD_URL}"))
            })?;
        let granularity = resp.header(HEADER_UPLOAD_CHUNK_GRANULARITY).ok_or_else(|| {
            UploadError::SessionInitFailed(format!(
                "response has no {HEADER_UPLOAD_CHUNK_GRANULARITY}"
            ))
        })?;

        let session = UploadSession::new(url, granularity, media.size)?;
        debug!(
            file = %media.file_name,
            granularity = session.granularity(),
            chunks = session.chunk_count(),
            status = resp.header(HEADER_UPLOAD_STATUS).unwrap_or_default(),
            "upload session started"
        );
        Ok(session)
    }

    async fn upload_single(
        &self,
        media: &MediaFile,
        session: &UploadSession,
        cancel: &CancellationToken,
    ) -> Result<UploadToken, UploadError> {
        let body = read_declared(media).await?;
        let headers: Headers = vec![
            (HEADER_UPLOAD_OFFSET, "0".to_string()),
            (
                HEADER_UPLOAD_COMMAND,
                UploadCommand::UploadFinalize.as_str().to_string(),
            ),
        ];

        check_cancelled(cancel)?;
        let resp = self
            .transport
            .send(session.upload_url(), body, headers)
            .await?;
        if resp.is_success() {
            return token_from(&resp);
        }

        warn!(
            file = %media.file_name,
            status = resp.status,
            "single-request upload failed, querying session"
        );
        self.query(session).await;
        Err(failed(&resp))
    }

    async fn upload_chunks(
        &self,
        media: &MediaFile,
        mut session: UploadSession,
        cancel: &CancellationToken,
    ) -> Result<UploadToken, UploadError> {
        let mut reader =
            ChunkReader::open_sized(&media.path, session.granularity(), media.size).await?;
        let mut index: u64 = 0;

        while let Some(chunk) = reader.next_chunk().await? {
            let last = session.is_last_chunk(index);
            let command = UploadCommand::for_chunk(last);
            let mut failures: u32 = 0;

            let resp = loop {
                check_cancelled(cancel)?;

                let headers: Headers = vec![
                    (HEADER_UPLOAD_COMMAND, command.as_str().to_string()),
                    (HEADER_UPLOAD_OFFSET, session.offset().to_string()),
                ];
                let status = match self
                    .transport
                    .send(session.upload_url(), chunk.data.clone(), headers)
                    .await
                {
                    Ok(resp) if resp.is_success() => break resp,
                    Ok(resp) => Some(resp.status),
                    Err(e) => {
                        warn!(file = %media.file_name, error = %e, "chunk send failed");
                        None
                    }
                };

                failures += 1;
                let attempt = ChunkAttempt {
                    attempt: failures,
                    offset: chunk.offset,
                    len: chunk.len(),
                    status,
                };
                if failures > self.retry_limit {
                    warn!(
                        file = %media.file_name,
                        attempts = failures,
                        offset = session.offset(),
                        "retry limit exceeded"
                    );
                    return Err(UploadError::RetryLimitExceeded {
                        attempts: failures,
                        offset: session.offset(),
                        last_status: status,
                    });
                }

                debug!(
                    file = %media.file_name,
                    attempt = attempt.attempt,
                    range = ?attempt.range(),
                    status = ?attempt.status,
                    "chunk rejected, will resend"
                );
                self.query(&session).await;
            };

            session.advance(chunk.len() as u64)?;
            self.progress.emit(UploadProgress {
                file_name: media.file_name.clone(),
                total_bytes: media.size,
                chunk_index: index,
                offset: chunk.offset,
                bytes_uploaded: session.offset(),
                chunk_size: chunk.len() as u64,
            });

            if last {
                info!(file = %media.file_name, chunks = index + 1, "upload finalized");
                return token_from(&resp);
            }
            index += 1;
        }

        Err(UploadError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("{} ended before the final chunk", media.path.display()),
        )))
    }

    /// Sends a `query` command and logs what the service reports. Failures
    /// are logged and otherwise ignored.
    async fn query(&self, session: &UploadSession) {
        let headers: Headers = vec![(
            HEADER_UPLOAD_COMMAND,
            UploadCommand::Query.as_str().to_string(),
        )];
        match self
            .transport
            .send(session.upload_url(), Vec::new(), headers)
            .await
        {
            Ok(resp) => debug!(
                status = resp.status,
                upload_status = resp.header(HEADER_UPLOAD_STATUS).unwrap_or_default(),
                size_received = resp.header(HEADER_UPLOAD_SIZE_RECEIVED).unwrap_or_default(),
                "upload session query"
            ),
            Err(e) => warn!(error = %e, "upload session query failed"),
        }
    }
}

/// Reads the whole file, holding it to the size it was validated at.
async fn read_declared(media: &MediaFile) -> Result<Vec<u8>, UploadError> {
    let mut body = tokio::fs::read(&media.path).await?;
    let declared = media.size as usize;
    if body.len() < declared {
        return Err(UploadError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "{} shrank to {} bytes after validation, expected {declared}",
                media.path.display(),
                body.len()
            ),
        )));
    }
    body.truncate(declared);
    Ok(body)
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), UploadError> {
    if cancel.is_cancelled() {
        Err(UploadError::Cancelled)
    } else {
        Ok(())
    }
}

fn failed(resp: &HttpResponse) -> UploadError {
    UploadError::UploadFailed {
        status: resp.status,
        body: resp.text(),
    }
}

fn token_from(resp: &HttpResponse) -> Result<UploadToken, UploadError> {
    UploadToken::new(resp.text().trim()).map_err(|_| UploadError::MissingToken)
}

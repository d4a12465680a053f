use std::ops::Range;

use crate::TransferError;

/// State of one resumable upload, owned by a single in-flight call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    upload_url: String,
    granularity: u64,
    total_bytes: u64,
    offset: u64,
}

impl UploadSession {
    /// Creates a session from the values returned by a `start` command.
    ///
    /// `granularity` is the raw `X-Goog-Upload-Chunk-Granularity` header
    /// value and must parse to a positive integer.
    pub fn new(
        upload_url: impl Into<String>,
        granularity: &str,
        total_bytes: u64,
    ) -> Result<Self, TransferError> {
        let parsed: i64 = granularity
            .trim()
            .parse()
            .map_err(|_| TransferError::InvalidGranularity(granularity.to_string()))?;
        if parsed <= 0 {
            return Err(TransferError::InvalidGranularity(granularity.to_string()));
        }
        Ok(Self {
            upload_url: upload_url.into(),
            granularity: parsed as u64,
            total_bytes,
            offset: 0,
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn granularity(&self) -> u64 {
        self.granularity
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Bytes confirmed by the service so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// `ceil(total_bytes / granularity)`.
    pub fn chunk_count(&self) -> u64 {
        self.total_bytes.div_ceil(self.granularity)
    }

    /// True when chunk `index` (0-based) is the one that finalizes the session.
    pub fn is_last_chunk(&self, index: u64) -> bool {
        index + 1 == self.chunk_count()
    }

    /// Records `sent` confirmed bytes. Moving past `total_bytes` is an
    /// error and leaves the offset unchanged.
    pub fn advance(&mut self, sent: u64) -> Result<(), TransferError> {
        match self.offset.checked_add(sent) {
            Some(next) if next <= self.total_bytes => {
                self.offset = next;
                Ok(())
            }
            _ => Err(TransferError::OffsetOverrun {
                offset: self.offset,
                sent,
                total: self.total_bytes,
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.offset == self.total_bytes
    }
}

/// One network exchange inside the chunk retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAttempt {
    /// 1-based attempt number for the current chunk.
    pub attempt: u32,
    pub offset: u64,
    pub len: usize,
    /// HTTP status, `None` when the request never got a response.
    pub status: Option<u16>,
}

impl ChunkAttempt {
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.len as u64
    }
}

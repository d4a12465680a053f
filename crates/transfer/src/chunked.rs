use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::TransferError;

/// One slice of the source file, positioned at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset one past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file front to back in fixed-size chunks.
///
/// The cursor only moves forward; a chunk that must be resent is kept by the
/// caller rather than read again. The file handle is closed when the reader
/// is dropped.
pub struct ChunkReader {
    file: tokio::fs::File,
    chunk_size: u64,
    offset: u64,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading of the whole file. `chunk_size` must
    /// be non-zero.
    pub async fn open(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let file_size = tokio::fs::metadata(path).await?.len();
        Self::open_sized(path, chunk_size, file_size).await
    }

    /// Opens `path` and reads exactly its first `file_size` bytes.
    ///
    /// Bytes appended after `file_size` are never read, so the chunks always
    /// add up to the size declared to the service. A file that shrank below
    /// `file_size` fails with [`TransferError::UnexpectedEof`].
    pub async fn open_sized(
        path: &Path,
        chunk_size: u64,
        file_size: u64,
    ) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidGranularity("0".into()));
        }
        let file = tokio::fs::File::open(path).await?;
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            file_size,
        })
    }

    /// Reads the next chunk. Returns `None` at EOF.
    ///
    /// The final chunk is shorter when the file size is not a multiple of
    /// the chunk size.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let expected = remaining.min(self.chunk_size) as usize;
        let mut data = Vec::with_capacity(expected);
        (&mut self.file)
            .take(expected as u64)
            .read_to_end(&mut data)
            .await?;

        if data.len() != expected {
            return Err(TransferError::UnexpectedEof {
                offset: self.offset,
                expected,
                actual: data.len(),
            });
        }

        let chunk = Chunk {
            offset: self.offset,
            data,
        };
        self.offset = chunk.end();
        Ok(Some(chunk))
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_media(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_all_chunks() {
        let dir = TempDir::new().unwrap();
        let path = write_media(dir.path(), "clip.mp4", b"ftypmp42xx");

        let mut reader = ChunkReader::open(&path, 4).await.unwrap();
        assert_eq!(reader.file_size(), 10);
        assert_eq!(reader.remaining(), 10);

        let head = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(head.offset, 0);
        assert_eq!(&head.data, b"ftyp");
        assert_eq!(reader.remaining(), 6);

        let brand = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(brand.offset, 4);
        assert_eq!(&brand.data, b"mp42");

        let tail = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(tail.offset, 8);
        assert_eq!(&tail.data, b"xx");
        assert_eq!(tail.end(), 10);

        assert!(reader.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exact_multiple_has_full_last_chunk() {
        let dir = TempDir::new().unwrap();
        let path = write_media(dir.path(), "clip.mp4", &[7u8; 12]);

        let mut reader = ChunkReader::open(&path, 4).await.unwrap();
        let mut sizes = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            sizes.push(chunk.len());
        }
        assert_eq!(sizes, vec![4, 4, 4]);
    }

    #[tokio::test]
    async fn rejects_zero_chunk_size() {
        let dir = TempDir::new().unwrap();
        let path = write_media(dir.path(), "clip.mp4", b"x");
        assert!(matches!(
            ChunkReader::open(&path, 0).await,
            Err(TransferError::InvalidGranularity(_))
        ));
    }

    #[tokio::test]
    async fn truncated_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_media(dir.path(), "clip.mp4", b"0123456789");

        let mut reader = ChunkReader::open(&path, 6).await.unwrap();
        reader.next_chunk().await.unwrap().unwrap();

        // Shrink the file underneath the reader.
        std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(7)
            .unwrap();

        match reader.next_chunk().await {
            Err(TransferError::UnexpectedEof {
                offset,
                expected,
                actual,
            }) => {
                assert_eq!(offset, 6);
                assert_eq!(expected, 4);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sized_reader_ignores_appended_bytes() {
        let dir = TempDir::new().unwrap();
        let path = write_media(dir.path(), "clip.mp4", &[1u8; 400]);

        let mut reader = ChunkReader::open_sized(&path, 100, 250).await.unwrap();
        assert_eq!(reader.file_size(), 250);

        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            chunks.push((chunk.offset, chunk.len()));
        }
        assert_eq!(chunks, vec![(0, 100), (100, 100), (200, 50)]);
        assert_eq!(reader.offset(), 250);
    }
}

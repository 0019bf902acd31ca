use std::fmt;
use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream::{self, Stream, TryStreamExt};
use md5::{Digest, Md5};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;

/// Future returned by [`ByteSource::read_range`].
pub type SourceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send + 'a>>;

/// Chunked body of a single part.
pub type PartStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Largest chunk a [`FileSource`] part stream holds at once.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Part planning
// ---------------------------------------------------------------------------

/// A contiguous byte range of the source, the unit of independent transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based part number.
    pub index: u32,
    /// First byte of the part.
    pub start: u64,
    /// One past the last byte of the part.
    pub end: u64,
}

impl PartRange {
    /// Length of the part in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always `false` for ranges produced by [`plan_parts`].
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Splits `total_size` bytes into ordered parts of `part_size` bytes.
///
/// Every part has exactly `part_size` bytes except the last, which holds
/// the (non-empty) remainder. Part numbers start at 1.
pub fn plan_parts(total_size: u64, part_size: u64) -> Result<Vec<PartRange>, TransferError> {
    if total_size == 0 {
        return Err(TransferError::EmptySource);
    }
    if part_size == 0 {
        return Err(TransferError::InvalidPartSize);
    }

    let count = total_size.div_ceil(part_size);
    if count > u64::from(u32::MAX) {
        return Err(TransferError::TooManyParts(count));
    }

    let parts = (0..count)
        .map(|i| {
            let start = i * part_size;
            PartRange {
                index: i as u32 + 1,
                start,
                end: std::cmp::min(start + part_size, total_size),
            }
        })
        .collect();
    Ok(parts)
}

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes MD5 of `data` and returns the hex-encoded digest.
///
/// For unencrypted single-part objects this is what the object store
/// reports as the part's ETag.
pub fn part_md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Part bodies
// ---------------------------------------------------------------------------

/// The bytes of one part, produced lazily as the transfer consumes them.
pub struct PartBody {
    range: PartRange,
    stream: PartStream,
}

impl PartBody {
    pub fn new(range: PartRange, stream: PartStream) -> Self {
        Self { range, stream }
    }

    /// A body over bytes already in memory, numbered `part_number`.
    pub fn in_memory(part_number: u32, data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let range = PartRange {
            index: part_number,
            start: 0,
            end: data.len() as u64,
        };
        Self::new(range, Box::pin(stream::iter([Ok::<_, std::io::Error>(data)])))
    }

    pub fn range(&self) -> PartRange {
        self.range
    }

    pub fn part_number(&self) -> u32 {
        self.range.index
    }

    /// Declared length of the body in bytes.
    pub fn len(&self) -> u64 {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn into_stream(self) -> PartStream {
        self.stream
    }

    /// Drains the body into one buffer.
    pub async fn into_vec(self) -> Result<Vec<u8>, TransferError> {
        let mut out = Vec::with_capacity(self.len() as usize);
        let mut stream = self.stream;
        while let Some(chunk) = stream.try_next().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Hashes every chunk as it passes through the returned body.
    ///
    /// The digest is complete once the body has been fully consumed.
    pub fn with_md5(self) -> (Self, PartDigest) {
        let digest = PartDigest::default();
        let hasher = Arc::clone(&digest.hasher);
        let stream = self.stream.inspect_ok(move |chunk| {
            hasher
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .update(chunk);
        });
        let body = Self {
            range: self.range,
            stream: Box::pin(stream),
        };
        (body, digest)
    }
}

impl fmt::Debug for PartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartBody")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Running MD5 of a [`PartBody`] created by [`PartBody::with_md5`].
#[derive(Clone, Default)]
pub struct PartDigest {
    hasher: Arc<Mutex<Md5>>,
}

impl PartDigest {
    /// Hex digest of everything hashed so far.
    pub fn hex(&self) -> String {
        let hasher = self
            .hasher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        hex::encode(hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Byte sources
// ---------------------------------------------------------------------------

/// A file-like source that can serve arbitrary byte ranges.
///
/// Parts must be independent of each other so that several can be in
/// flight at once. A part body does no I/O until it is polled.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Returns `true` if the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazy body covering exactly the bytes of `range`.
    fn stream_range(&self, range: PartRange) -> Result<PartBody, TransferError>;

    /// Reads the whole of `range` into memory.
    fn read_range(&self, range: PartRange) -> SourceFuture<'_> {
        Box::pin(async move { self.stream_range(range)?.into_vec().await })
    }
}

/// A local file, opened once per part when its body is first polled.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
}

impl FileSource {
    /// Opens `path` and records its current size.
    pub async fn open(path: &Path) -> Result<Self, TransferError> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            len: metadata.len(),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn stream_range(&self, range: PartRange) -> Result<PartBody, TransferError> {
        check_range(range, self.len)?;
        let cursor = FileCursor {
            path: self.path.clone(),
            file: None,
            offset: range.start,
            remaining: range.len(),
        };
        Ok(PartBody::new(
            range,
            Box::pin(stream::try_unfold(cursor, next_file_chunk)),
        ))
    }
}

struct FileCursor {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    offset: u64,
    remaining: u64,
}

async fn next_file_chunk(mut cursor: FileCursor) -> std::io::Result<Option<(Bytes, FileCursor)>> {
    if cursor.remaining == 0 {
        return Ok(None);
    }
    let mut file = match cursor.file.take() {
        Some(file) => file,
        None => {
            let mut file = tokio::fs::File::open(&cursor.path).await?;
            file.seek(SeekFrom::Start(cursor.offset)).await?;
            file
        }
    };

    // A file that shrank since it was opened fails with UnexpectedEof.
    let n = cursor.remaining.min(READ_CHUNK_SIZE as u64) as usize;
    let mut buf = vec![0u8; n];
    file.read_exact(&mut buf).await?;

    cursor.remaining -= n as u64;
    cursor.file = Some(file);
    Ok(Some((Bytes::from(buf), cursor)))
}

/// An in-memory source. Part bodies share the buffer without copying.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn stream_range(&self, range: PartRange) -> Result<PartBody, TransferError> {
        check_range(range, self.len())?;
        let slice = self.data.slice(range.start as usize..range.end as usize);
        Ok(PartBody::new(range, Box::pin(stream::iter([Ok::<_, std::io::Error>(slice)]))))
    }
}

fn check_range(range: PartRange, len: u64) -> Result<(), TransferError> {
    if range.start > range.end || range.end > len {
        return Err(TransferError::OutOfRange {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

//! Part planning and byte sources for multipart uploads.
//!
//! A file is split into fixed-size, 1-indexed parts; each part is read
//! independently so transfers can run concurrently. Part bodies are
//! streamed, so only the chunks currently on the wire are held in memory.

mod chunked;
mod progress;
mod validation;

pub use chunked::{
    ByteSource, FileSource, MemorySource, PartBody, PartDigest, PartRange, PartStream,
    READ_CHUNK_SIZE, SourceFuture, part_md5_hex, plan_parts,
};
pub use progress::SpeedCalculator;
pub use validation::{partition_supported, rejection_message, validate_video_file};

pub use videoup_protocol::PART_SIZE;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source is empty")]
    EmptySource,

    #[error("part size must be greater than zero")]
    InvalidPartSize,

    #[error("too many parts: {0}")]
    TooManyParts(u64),

    #[error("range {start}..{end} is outside a source of {len} bytes")]
    OutOfRange { start: u64, end: u64, len: u64 },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

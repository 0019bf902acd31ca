//! Upload error types.

/// Errors produced while uploading a file.
///
/// Every variant ends the file's upload; none is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Validation(String),

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("part {part} failed: {message}")]
    Transfer { part: u32, message: String },

    #[error("failed to read part {part}: {source}")]
    Read {
        part: u32,
        #[source]
        source: videoup_transfer::TransferError,
    },

    #[error("received {received} of {expected} part receipts")]
    IncompleteReceipts { received: usize, expected: usize },

    #[error("finalize failed: {0}")]
    Finalize(String),

    #[error("abort failed: {0}")]
    Abort(String),

    #[error("job registration failed: {0}")]
    JobRegistration(String),

    #[error("cancelled")]
    Cancelled,

    #[error("source error: {0}")]
    Source(#[from] videoup_transfer::TransferError),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl UploadError {
    /// Short category name used in logs and alerts.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "validation",
            UploadError::Authorization(_) => "authorization",
            UploadError::Transfer { .. } | UploadError::Read { .. } => "transfer",
            UploadError::IncompleteReceipts { .. } => "transfer",
            UploadError::Finalize(_) => "finalize",
            UploadError::Abort(_) => "abort",
            UploadError::JobRegistration(_) => "job",
            UploadError::Cancelled => "cancelled",
            UploadError::Source(_) => "source",
            UploadError::Client(_) => "client",
        }
    }
}

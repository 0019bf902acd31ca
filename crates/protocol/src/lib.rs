//! Wire types for the video upload control plane.
//!
//! Field names follow the control-plane function's PascalCase JSON.

pub mod constants;
pub mod envelope;
pub mod messages;
pub mod task;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{PART_SIZE, SUPPORTED_EXTENSIONS, UploadAction};
pub use envelope::{Envelope, Error};
pub use messages::{
    AbortRequest, AuthorizeRequest, AuthorizeResponse, CompletedPart, FinalizeRequest,
};
pub use task::{
    AnalysisSetting, EmbeddingSetting, ExtractionSetting, PreProcessSetting, S3Object,
    StartTaskRequest, VideoSource,
};
pub use types::{FileStatus, UploadProgress};

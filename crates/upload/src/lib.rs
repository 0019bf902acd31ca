//! Resumable multipart video uploads.
//!
//! Pipeline per file:
//! 1. Chunk the source into fixed-size parts
//! 2. Authorize a multipart session with the control plane
//! 3. Transfer every part concurrently to its presigned destination
//! 4. Finalize with the receipts sorted by part number
//! 5. Hand the assembled object to job registration
//!
//! Files are processed one at a time by [`SessionQueue`].

pub mod api;
pub mod control_plane;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod job;
pub mod part_uploader;
pub mod queue;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError};
pub use control_plane::{ControlPlane, HttpControlPlane, UploadFuture};
pub use coordinator::{CoordinatorConfig, UploadCoordinator};
pub use credentials::{CredentialProvider, StaticCredentials};
pub use error::UploadError;
pub use job::{HttpJobRegistrar, JobRegistrar, JobSettings};
pub use part_uploader::{HttpPartUploader, PartUploader};
pub use queue::{EnqueueReport, QueueEntry, SessionQueue};
pub use types::{
    Authorization, FileReady, Receipt, UploadEvent, UploadReport, UploadSession, UploadState,
};

use serde::{Deserialize, Serialize};

use crate::constants::UploadAction;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Opens a multipart session and requests one presigned URL per part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthorizeRequest {
    pub file_name: String,
    pub num_parts: u32,
    pub action: UploadAction,
}

impl AuthorizeRequest {
    pub fn new(file_name: impl Into<String>, num_parts: u32) -> Self {
        Self {
            file_name: file_name.into(),
            num_parts,
            action: UploadAction::Create,
        }
    }
}

/// A transferred part, as the object store expects it on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompletedPart {
    #[serde(rename = "ETag")]
    pub etag: String,
    pub part_number: u32,
}

/// Assembles the transferred parts into the final object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FinalizeRequest {
    pub task_id: String,
    pub file_name: String,
    pub multipart_upload: Vec<CompletedPart>,
    pub upload_id: String,
    pub action: UploadAction,
}

impl FinalizeRequest {
    pub fn new(
        task_id: impl Into<String>,
        file_name: impl Into<String>,
        upload_id: impl Into<String>,
        parts: Vec<CompletedPart>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            file_name: file_name.into(),
            multipart_upload: parts,
            upload_id: upload_id.into(),
            action: UploadAction::Complete,
        }
    }
}

/// Discards a multipart session and any parts already stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AbortRequest {
    pub task_id: String,
    pub file_name: String,
    pub upload_id: String,
    pub action: UploadAction,
}

impl AbortRequest {
    pub fn new(
        task_id: impl Into<String>,
        file_name: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            file_name: file_name.into(),
            upload_id: upload_id.into(),
            action: UploadAction::Abort,
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Body of a successful `create` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthorizeResponse {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
    /// Single-shot PUT URL for the whole object; unused by multipart uploads.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upload_url: String,
    #[serde(rename = "S3Bucket")]
    pub s3_bucket: String,
    #[serde(rename = "S3Key")]
    pub s3_key: String,
    pub upload_id: String,
    #[serde(default)]
    pub upload_part_urls: Vec<String>,
}

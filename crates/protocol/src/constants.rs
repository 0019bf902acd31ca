use serde::{Deserialize, Serialize};

/// Fixed multipart part size: 5 MiB.
pub const PART_SIZE: u64 = 5 * 1024 * 1024;

/// Video container extensions accepted for upload (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["avi", "mov", "mp4"];

/// Control-plane endpoint managing multipart sessions.
pub const PRESIGNED_URL_PATH: &str = "/extraction/video/manage-s3-presigned-url";

/// Endpoint that registers an analysis job for an uploaded video.
pub const START_TASK_PATH: &str = "/extraction/video/start-task";

/// Header carrying the API gateway key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Action verb sent to the presigned-URL endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadAction {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "abort")]
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_size_is_five_mib() {
        assert_eq!(PART_SIZE, 5_242_880);
    }

    #[test]
    fn upload_action_serialization() {
        assert_eq!(
            serde_json::to_string(&UploadAction::Create).unwrap(),
            "\"create\""
        );
        assert_eq!(
            serde_json::to_string(&UploadAction::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(
            serde_json::to_string(&UploadAction::Abort).unwrap(),
            "\"abort\""
        );
    }
}

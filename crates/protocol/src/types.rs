use serde::{Deserialize, Serialize};

/// Position of a file in the upload queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "failed")]
    Failed,
}

impl FileStatus {
    /// Returns `true` once the file will not change state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Done | FileStatus::Failed)
    }
}

/// Progress of the file currently being transferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub file_name: String,
    pub completed_parts: u32,
    pub part_count: u32,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Zeroed progress for a file that has not transferred anything yet.
    pub fn start(file_name: impl Into<String>, part_count: u32, total_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            completed_parts: 0,
            part_count,
            transferred_bytes: 0,
            total_bytes,
        }
    }

    /// Returns the part-based progress as a percentage (0-100).
    pub fn percentage(&self) -> f64 {
        if self.part_count == 0 {
            return 0.0;
        }
        self.completed_parts as f64 / self.part_count as f64 * 100.0
    }

    /// Returns `true` once every part has a receipt.
    pub fn is_complete(&self) -> bool {
        self.part_count > 0 && self.completed_parts == self.part_count
    }
}

//! Data types for the upload flow.

use std::collections::BTreeMap;

use videoup_protocol::{CompletedPart, FileStatus, UploadProgress};
use videoup_transfer::{PartRange, plan_parts};

use crate::error::UploadError;

/// Lifecycle of one file's upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Chunking,
    Authorizing,
    Transferring,
    Finalizing,
    Completed,
    Failed,
}

impl UploadState {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadState::Completed | UploadState::Failed)
    }

    /// Returns `true` while the control plane or object store is involved.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            UploadState::Authorizing | UploadState::Transferring | UploadState::Finalizing
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: UploadState) -> bool {
        use UploadState::*;
        match (self, next) {
            (Idle, Chunking)
            | (Chunking, Authorizing)
            | (Authorizing, Transferring)
            | (Transferring, Finalizing)
            | (Finalizing, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// A successful part transfer: the store's integrity token plus the
/// caller-supplied part number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub part_number: u32,
    pub etag: String,
}

/// Upload session issued by the control plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorization {
    pub task_id: String,
    pub upload_id: String,
    pub bucket: String,
    pub key: String,
    /// One presigned destination per part; index 0 is part 1.
    pub part_urls: Vec<String>,
}

impl Authorization {
    /// Identifier of the session for its whole lifetime.
    pub fn session_id(&self) -> &str {
        &self.task_id
    }
}

/// Handoff produced once an upload is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReady {
    pub file_name: String,
    pub task_id: String,
    pub upload_id: String,
    pub bucket: String,
    pub key: String,
    pub total_bytes: u64,
    pub part_count: u32,
}

/// Event emitted while uploads run.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The coordinator moved a file to a new state.
    State { file_name: String, state: UploadState },
    /// A part receipt arrived.
    Progress(UploadProgress),
    /// The file is assembled in storage and can be registered.
    FileReady(FileReady),
    /// The file's upload failed.
    Failed { file_name: String, error: String },
    /// The queue changed a file's status.
    Queue { file_name: String, status: FileStatus },
}

/// Final report of one coordinator run.
#[derive(Debug)]
pub struct UploadReport {
    pub file_name: String,
    pub state: UploadState,
    pub progress: UploadProgress,
    pub outcome: Result<FileReady, UploadError>,
}

/// In-memory state of one file's upload.
///
/// Owned by the coordinator for the duration of a run and dropped
/// afterwards; nothing survives a restart.
#[derive(Debug)]
pub struct UploadSession {
    file_name: String,
    total_bytes: u64,
    part_size: u64,
    state: UploadState,
    parts: Vec<PartRange>,
    authorization: Option<Authorization>,
    receipts: BTreeMap<u32, String>,
    transferred_bytes: u64,
}

impl UploadSession {
    /// Creates an idle session for `total_bytes` of `file_name`.
    pub fn new(file_name: impl Into<String>, total_bytes: u64, part_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            total_bytes,
            part_size,
            state: UploadState::Idle,
            parts: Vec::new(),
            authorization: None,
            receipts: BTreeMap::new(),
            transferred_bytes: 0,
        }
    }

    /// Moves to `next`, returning `false` (and staying put) if illegal.
    pub fn advance(&mut self, next: UploadState) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }

    /// Plans the part layout.
    pub fn chunk(&mut self) -> Result<&[PartRange], UploadError> {
        self.parts = plan_parts(self.total_bytes, self.part_size)?;
        Ok(&self.parts)
    }

    /// Stores the control-plane session.
    ///
    /// Rejects sessions whose destination count differs from the plan.
    pub fn authorize(&mut self, authorization: Authorization) -> Result<(), UploadError> {
        if authorization.part_urls.len() != self.parts.len() {
            return Err(UploadError::Authorization(format!(
                "expected {} part URLs, got {}",
                self.parts.len(),
                authorization.part_urls.len()
            )));
        }
        self.authorization = Some(authorization);
        Ok(())
    }

    /// Records a receipt.
    ///
    /// Returns `false` for unknown part numbers and duplicates; those do
    /// not count towards completion.
    pub fn record_receipt(&mut self, receipt: Receipt) -> bool {
        let Some(part) = self.part(receipt.part_number) else {
            return false;
        };
        let len = part.len();
        if self.receipts.contains_key(&receipt.part_number) {
            return false;
        }
        self.receipts.insert(receipt.part_number, receipt.etag);
        self.transferred_bytes += len;
        true
    }

    /// Returns all receipts ordered by part number.
    ///
    /// Fails unless every planned part has exactly one receipt.
    pub fn ordered_receipts(&self) -> Result<Vec<CompletedPart>, UploadError> {
        if !self.is_complete() {
            return Err(UploadError::IncompleteReceipts {
                received: self.receipts.len(),
                expected: self.parts.len(),
            });
        }
        Ok(self
            .receipts
            .iter()
            .map(|(&part_number, etag)| CompletedPart {
                etag: etag.clone(),
                part_number,
            })
            .collect())
    }

    /// Returns `true` once every planned part has a receipt.
    pub fn is_complete(&self) -> bool {
        !self.parts.is_empty() && self.receipts.len() == self.parts.len()
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> UploadProgress {
        UploadProgress {
            file_name: self.file_name.clone(),
            completed_parts: self.receipts.len() as u32,
            part_count: self.part_count(),
            transferred_bytes: self.transferred_bytes,
            total_bytes: self.total_bytes,
        }
    }

    fn part(&self, part_number: u32) -> Option<&PartRange> {
        let idx = usize::try_from(part_number).ok()?.checked_sub(1)?;
        self.parts.get(idx)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn parts(&self) -> &[PartRange] {
        &self.parts
    }

    pub fn part_count(&self) -> u32 {
        self.parts.len() as u32
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        self.authorization.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorization(parts: usize) -> Authorization {
        Authorization {
            task_id: "task-1".into(),
            upload_id: "upload-1".into(),
            bucket: "bucket".into(),
            key: "tasks/task-1/clip.mp4".into(),
            part_urls: (1..=parts).map(|i| format!("https://s3/p{i}")).collect(),
        }
    }

    fn receipt(part_number: u32) -> Receipt {
        Receipt {
            part_number,
            etag: format!("\"etag-{part_number}\""),
        }
    }

    fn chunked_session() -> UploadSession {
        let mut session = UploadSession::new("clip.mp4", 25, 10);
        session.chunk().unwrap();
        session
    }

    #[test]
    fn legal_transitions() {
        use UploadState::*;
        assert!(Idle.can_advance_to(Chunking));
        assert!(Chunking.can_advance_to(Authorizing));
        assert!(Authorizing.can_advance_to(Transferring));
        assert!(Transferring.can_advance_to(Finalizing));
        assert!(Finalizing.can_advance_to(Completed));
        for s in [Idle, Chunking, Authorizing, Transferring, Finalizing] {
            assert!(s.can_advance_to(Failed), "{s:?} -> Failed");
        }
    }

    #[test]
    fn illegal_transitions() {
        use UploadState::*;
        assert!(!Idle.can_advance_to(Transferring));
        assert!(!Chunking.can_advance_to(Finalizing));
        assert!(!Transferring.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Chunking));
    }

    #[test]
    fn advance_rejects_skips() {
        let mut session = UploadSession::new("clip.mp4", 10, 5);
        assert!(!session.advance(UploadState::Transferring));
        assert_eq!(session.state(), UploadState::Idle);
        assert!(session.advance(UploadState::Chunking));
        assert_eq!(session.state(), UploadState::Chunking);
    }

    #[test]
    fn chunk_empty_file_fails() {
        let mut session = UploadSession::new("clip.mp4", 0, 5);
        assert!(matches!(session.chunk(), Err(UploadError::Source(_))));
    }

    #[test]
    fn authorize_checks_url_count() {
        let mut session = chunked_session();
        assert_eq!(session.part_count(), 3);
        assert!(matches!(
            session.authorize(authorization(2)),
            Err(UploadError::Authorization(_))
        ));
        assert!(session.authorization().is_none());
        session.authorize(authorization(3)).unwrap();
        assert_eq!(session.authorization().unwrap().session_id(), "task-1");
    }

    #[test]
    fn receipts_are_ordered_regardless_of_arrival() {
        let mut session = chunked_session();
        assert!(session.record_receipt(receipt(3)));
        assert!(session.record_receipt(receipt(1)));
        assert!(session.record_receipt(receipt(2)));

        let parts = session.ordered_receipts().unwrap();
        let numbers: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(parts[0].etag, "\"etag-1\"");
    }

    #[test]
    fn duplicate_and_unknown_receipts_ignored() {
        let mut session = chunked_session();
        assert!(session.record_receipt(receipt(1)));
        assert!(!session.record_receipt(receipt(1)));
        assert!(!session.record_receipt(receipt(0)));
        assert!(!session.record_receipt(receipt(4)));
        assert_eq!(session.progress().completed_parts, 1);
    }

    #[test]
    fn incomplete_receipts_rejected() {
        let mut session = chunked_session();
        session.record_receipt(receipt(1));
        session.record_receipt(receipt(3));
        match session.ordered_receipts() {
            Err(UploadError::IncompleteReceipts { received, expected }) => {
                assert_eq!(received, 2);
                assert_eq!(expected, 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn progress_counts_part_bytes() {
        let mut session = chunked_session();
        session.record_receipt(receipt(3));
        let p = session.progress();
        assert_eq!(p.completed_parts, 1);
        assert_eq!(p.part_count, 3);
        assert_eq!(p.transferred_bytes, 5);
        assert_eq!(p.total_bytes, 25);

        session.record_receipt(receipt(1));
        assert_eq!(session.progress().transferred_bytes, 15);
    }

    #[test]
    fn unchunked_session_is_never_complete() {
        let session = UploadSession::new("clip.mp4", 10, 5);
        assert!(!session.is_complete());
        assert!(session.ordered_receipts().is_err());
    }
}

//! Session queue: uploads files strictly one after another.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use videoup_protocol::FileStatus;
use videoup_transfer::{
    ByteSource, FileSource, partition_supported, rejection_message, validate_video_file,
};

use crate::coordinator::UploadCoordinator;
use crate::error::UploadError;
use crate::job::JobRegistrar;
use crate::types::{FileReady, UploadEvent};

/// A file waiting in, or processed by, the queue.
pub struct QueueEntry {
    pub file_name: String,
    pub source: Arc<dyn ByteSource>,
    pub status: FileStatus,
    /// User-facing failure message.
    pub error: Option<String>,
    pub ready: Option<FileReady>,
}

impl std::fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueEntry")
            .field("file_name", &self.file_name)
            .field("bytes", &self.source.len())
            .field("status", &self.status)
            .field("error", &self.error)
            .finish()
    }
}

/// Outcome of [`SessionQueue::enqueue_paths`].
#[derive(Debug, Default)]
pub struct EnqueueReport {
    /// Number of files added to the queue.
    pub added: usize,
    /// Alert naming the files rejected for their format.
    pub rejection: Option<String>,
    /// Supported files that could not be opened.
    pub unreadable: Vec<(PathBuf, UploadError)>,
}

/// Ordered list of files, each driven through the coordinator in turn.
///
/// One file's failure never stops the rest of the batch.
pub struct SessionQueue {
    coordinator: UploadCoordinator,
    registrar: Option<Arc<dyn JobRegistrar>>,
    entries: Vec<QueueEntry>,
}

impl SessionQueue {
    pub fn new(coordinator: UploadCoordinator, registrar: Option<Arc<dyn JobRegistrar>>) -> Self {
        Self {
            coordinator,
            registrar,
            entries: Vec::new(),
        }
    }

    /// Takes the coordinator's event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.coordinator.take_events()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.coordinator.cancel_token()
    }

    /// Adds a file as `pending`.
    ///
    /// Unsupported formats are rejected here and never enter the queue.
    pub fn enqueue(
        &mut self,
        file_name: impl Into<String>,
        source: Arc<dyn ByteSource>,
    ) -> Result<(), UploadError> {
        let file_name = file_name.into();
        validate_video_file(&file_name).map_err(|e| UploadError::Validation(e.to_string()))?;

        self.entries.push(QueueEntry {
            file_name,
            source,
            status: FileStatus::Pending,
            error: None,
            ready: None,
        });
        Ok(())
    }

    /// Opens `path` and enqueues it under its file name.
    pub async fn enqueue_path(&mut self, path: &Path) -> Result<(), UploadError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                UploadError::Validation(format!("invalid file name: {}", path.display()))
            })?
            .to_string();
        validate_video_file(&file_name).map_err(|e| UploadError::Validation(e.to_string()))?;

        let source = FileSource::open(path).await?;
        self.enqueue(file_name, Arc::new(source))
    }

    /// Enqueues every supported path that can be opened.
    ///
    /// A path that fails to open is reported and skipped; the rest of the
    /// batch is still enqueued.
    pub async fn enqueue_paths(&mut self, paths: Vec<PathBuf>) -> EnqueueReport {
        let (supported, rejected) = partition_supported(paths, |p| file_name_of(p));
        let mut report = EnqueueReport::default();
        for path in supported {
            match self.enqueue_path(&path).await {
                Ok(()) => report.added += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    report.unreadable.push((path, e));
                }
            }
        }

        let names: Vec<String> = rejected
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.display().to_string())
            })
            .collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        report.rejection = rejection_message(&names);
        if let Some(msg) = &report.rejection {
            warn!(rejected = names.len(), "{msg}");
        }
        report
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Number of files still `pending`.
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == FileStatus::Pending)
            .count()
    }

    /// Uploads every pending file in order.
    ///
    /// The next file does not start until the previous one is `done` or
    /// `failed`. Completed uploads are handed to the job registrar.
    pub async fn run(&mut self) -> &[QueueEntry] {
        for idx in 0..self.entries.len() {
            if self.entries[idx].status != FileStatus::Pending {
                continue;
            }
            let file_name = self.entries[idx].file_name.clone();
            let source = Arc::clone(&self.entries[idx].source);

            self.set_status(idx, FileStatus::Uploading).await;
            let report = self.coordinator.upload(&file_name, &*source).await;

            let outcome = match report.outcome {
                Ok(ready) => self.register(ready).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(ready) => {
                    self.entries[idx].ready = Some(ready);
                    self.set_status(idx, FileStatus::Done).await;
                }
                Err(e) => {
                    self.entries[idx].error = Some(e.to_string());
                    self.set_status(idx, FileStatus::Failed).await;
                }
            }
        }

        let failed = self
            .entries
            .iter()
            .filter(|e| e.status == FileStatus::Failed)
            .count();
        info!(files = self.entries.len(), failed, "queue drained");
        &self.entries
    }

    async fn register(&self, ready: FileReady) -> Result<FileReady, UploadError> {
        if let Some(registrar) = &self.registrar {
            registrar.register(&ready).await?;
        }
        Ok(ready)
    }

    async fn set_status(&mut self, idx: usize, status: FileStatus) {
        let entry = &mut self.entries[idx];
        entry.status = status;
        info!(file = %entry.file_name, status = ?status, "queue status changed");
        let event = UploadEvent::Queue {
            file_name: entry.file_name.clone(),
            status,
        };
        self.coordinator.emit(event).await;
    }
}

fn file_name_of(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

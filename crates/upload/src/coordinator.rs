//! Upload coordinator: drives one file through
//! chunk → authorize → transfer → finalize.
//!
//! Parts are transferred concurrently and may complete in any order;
//! receipts are collected per part number and sorted before finalize.
//! Progress and state changes are published on an event channel.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use videoup_transfer::{ByteSource, PART_SIZE};

use crate::control_plane::ControlPlane;
use crate::error::UploadError;
use crate::part_uploader::PartUploader;
use crate::types::{FileReady, UploadEvent, UploadReport, UploadSession, UploadState};

/// Tunables for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Bytes per part.
    pub part_size: u64,
    /// Maximum transfers in flight per file; `None` sends every part at once.
    pub max_concurrent_parts: Option<usize>,
    /// Ask the control plane to discard the session when an upload fails
    /// after authorization.
    pub abort_on_failure: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            part_size: PART_SIZE,
            max_concurrent_parts: None,
            abort_on_failure: false,
        }
    }
}

/// Runs the upload state machine for one file at a time.
pub struct UploadCoordinator {
    control_plane: Arc<dyn ControlPlane>,
    uploader: Arc<dyn PartUploader>,
    config: CoordinatorConfig,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
    active: Mutex<()>,
}

impl UploadCoordinator {
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        uploader: Arc<dyn PartUploader>,
        config: CoordinatorConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            control_plane,
            uploader,
            config,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            active: Mutex::new(()),
        }
    }

    /// Takes the event receiver. Can only be called once.
    ///
    /// Events are only published after the receiver has been taken. The
    /// channel is bounded; once taken it must be drained or uploads stall
    /// on a full buffer. Dropping the receiver discards later events.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns the token that cancels the running and all later uploads.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) async fn emit(&self, event: UploadEvent) {
        if self.events_rx.is_some() {
            return;
        }
        let _ = self.events_tx.send(event).await;
    }

    /// Uploads `source` as `file_name`.
    ///
    /// Concurrent calls are serialized: a second file does not start
    /// chunking until the first reaches `Completed` or `Failed`.
    pub async fn upload(&self, file_name: &str, source: &dyn ByteSource) -> UploadReport {
        let _active = self.active.lock().await;

        let mut session = UploadSession::new(file_name, source.len(), self.config.part_size);
        let outcome = self.run(&mut session, source).await;

        match &outcome {
            Ok(ready) => {
                info!(
                    file = %file_name,
                    task_id = %ready.task_id,
                    parts = ready.part_count,
                    bytes = ready.total_bytes,
                    "upload completed"
                );
                self.emit(UploadEvent::FileReady(ready.clone())).await;
            }
            Err(e) => {
                self.transition(&mut session, UploadState::Failed).await;
                error!(file = %file_name, kind = e.kind(), error = %e, "upload failed");
                self.emit(UploadEvent::Failed {
                    file_name: file_name.to_string(),
                    error: e.to_string(),
                })
                .await;
            }
        }

        UploadReport {
            file_name: file_name.to_string(),
            state: session.state(),
            progress: session.progress(),
            outcome,
        }
    }

    async fn run(
        &self,
        session: &mut UploadSession,
        source: &dyn ByteSource,
    ) -> Result<FileReady, UploadError> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        self.transition(session, UploadState::Chunking).await;
        let part_count = session.chunk()?.len() as u32;

        self.transition(session, UploadState::Authorizing).await;
        let authorization = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
            res = self.control_plane.authorize(session.file_name(), part_count) => res?,
        };
        session.authorize(authorization)?;

        let result = self.transfer_and_finalize(session, source).await;
        if result.is_err() {
            self.abort_session(session).await;
        }
        result
    }

    async fn transfer_and_finalize(
        &self,
        session: &mut UploadSession,
        source: &dyn ByteSource,
    ) -> Result<FileReady, UploadError> {
        self.transition(session, UploadState::Transferring).await;
        self.emit(UploadEvent::Progress(session.progress())).await;
        self.transfer_parts(session, source).await?;

        self.transition(session, UploadState::Finalizing).await;
        let parts = session.ordered_receipts()?;
        let authorization = session
            .authorization()
            .cloned()
            .ok_or_else(|| UploadError::Finalize("session was never authorized".into()))?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
            res = self.control_plane.finalize(&authorization, session.file_name(), parts) => res?,
        }

        self.transition(session, UploadState::Completed).await;
        Ok(FileReady {
            file_name: session.file_name().to_string(),
            task_id: authorization.task_id,
            upload_id: authorization.upload_id,
            bucket: authorization.bucket,
            key: authorization.key,
            total_bytes: session.total_bytes(),
            part_count: session.part_count(),
        })
    }

    /// Fans out one transfer per part and collects receipts until every
    /// part has one. The first failure abandons all in-flight transfers.
    ///
    /// Part bodies are read lazily by the uploader, so unbounded fan-out
    /// does not pull the whole source into memory up front.
    async fn transfer_parts(
        &self,
        session: &mut UploadSession,
        source: &dyn ByteSource,
    ) -> Result<(), UploadError> {
        let destinations = session
            .authorization()
            .map(|a| a.part_urls.clone())
            .unwrap_or_default();
        let parts = session.parts().to_vec();
        let limit = self
            .config
            .max_concurrent_parts
            .unwrap_or(parts.len())
            .clamp(1, parts.len().max(1));

        debug!(file = %session.file_name(), parts = parts.len(), limit, "starting transfers");

        let uploader = &*self.uploader;
        let mut transfers = stream::iter(parts.into_iter().zip(destinations))
            .map(move |(range, destination)| async move {
                let body = source.stream_range(range).map_err(|err| UploadError::Read {
                    part: range.index,
                    source: err,
                })?;
                uploader.upload(&destination, body).await
            })
            .buffer_unordered(limit);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(UploadError::Cancelled),
                next = transfers.next() => next,
            };
            match next {
                Some(Ok(receipt)) => {
                    let part = receipt.part_number;
                    if !session.record_receipt(receipt) {
                        warn!(file = %session.file_name(), part, "ignoring unexpected receipt");
                        continue;
                    }
                    let progress = session.progress();
                    debug!(
                        file = %session.file_name(),
                        part,
                        completed = progress.completed_parts,
                        total = progress.part_count,
                        "part completed"
                    );
                    self.emit(UploadEvent::Progress(progress)).await;
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        if session.is_complete() {
            Ok(())
        } else {
            let progress = session.progress();
            Err(UploadError::IncompleteReceipts {
                received: progress.completed_parts as usize,
                expected: progress.part_count as usize,
            })
        }
    }

    async fn abort_session(&self, session: &UploadSession) {
        if !self.config.abort_on_failure {
            return;
        }
        let Some(authorization) = session.authorization() else {
            return;
        };
        match self
            .control_plane
            .abort(authorization, session.file_name())
            .await
        {
            Ok(()) => info!(
                file = %session.file_name(),
                task_id = %authorization.task_id,
                "upload session aborted"
            ),
            Err(e) => warn!(
                file = %session.file_name(),
                error = %e,
                "failed to abort upload session"
            ),
        }
    }

    async fn transition(&self, session: &mut UploadSession, next: UploadState) {
        if !session.advance(next) {
            warn!(
                file = %session.file_name(),
                from = ?session.state(),
                to = ?next,
                "illegal state transition"
            );
            return;
        }
        debug!(file = %session.file_name(), state = ?next, "state changed");
        self.emit(UploadEvent::State {
            file_name: session.file_name().to_string(),
            state: next,
        })
        .await;
    }
}

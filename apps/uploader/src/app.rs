//! Application orchestrator: wires the upload pipeline together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use videoup_protocol::{FileStatus, PART_SIZE};
use videoup_transfer::SpeedCalculator;
use videoup_upload::{
    ApiClient, CoordinatorConfig, HttpControlPlane, HttpJobRegistrar, HttpPartUploader,
    JobRegistrar, SessionQueue, StaticCredentials, UploadCoordinator, UploadEvent, UploadState,
};

use crate::config::Config;

/// Uploads `files` in order. Returns `true` if every file ended `done`.
pub async fn run(config: Config, files: Vec<PathBuf>) -> anyhow::Result<bool> {
    if config.api_base_url.is_empty() {
        anyhow::bail!("api_base_url is not configured");
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let credentials = Arc::new(StaticCredentials::new(config.id_token.clone()));
    let api = ApiClient::new(
        &config.api_base_url,
        config.api_key.clone(),
        credentials,
        Some(timeout),
    )?;

    let control_plane = Arc::new(HttpControlPlane::new(api.clone()));
    let uploader = Arc::new(
        HttpPartUploader::new(Some(timeout))?.with_checksum_verification(config.verify_checksum),
    );
    let registrar: Option<Arc<dyn JobRegistrar>> = if config.register_jobs {
        Some(Arc::new(HttpJobRegistrar::new(
            api,
            config.job.clone(),
            config.requested_by.clone(),
        )))
    } else {
        None
    };

    let coordinator = UploadCoordinator::new(
        control_plane,
        uploader,
        CoordinatorConfig {
            part_size: PART_SIZE,
            max_concurrent_parts: config.max_concurrent_parts,
            abort_on_failure: config.abort_on_failure,
        },
    );
    let mut queue = SessionQueue::new(coordinator, registrar);
    let events = queue.take_events().context("event receiver already taken")?;
    let reporter = tokio::spawn(report_events(events));

    let enqueued = queue.enqueue_paths(files).await;
    if let Some(message) = &enqueued.rejection {
        eprintln!("{message}");
    }
    for (path, err) in &enqueued.unreadable {
        eprintln!("{}: {err}", path.display());
    }
    if queue.pending() == 0 {
        anyhow::bail!("no supported video files to upload");
    }

    let cancel = queue.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling uploads");
            cancel.cancel();
        }
    });

    let entries = queue.run().await;
    let mut all_done = enqueued.unreadable.is_empty();
    for entry in entries {
        match (&entry.ready, entry.status) {
            (Some(ready), FileStatus::Done) => {
                println!("{}: uploaded as task {}", entry.file_name, ready.task_id);
            }
            _ => {
                all_done = false;
                println!(
                    "{}: failed: {}",
                    entry.file_name,
                    entry.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    // Closing the queue closes the event channel.
    drop(queue);
    let _ = reporter.await;
    Ok(all_done)
}

/// Logs progress with transfer speed and ETA.
async fn report_events(mut events: mpsc::Receiver<UploadEvent>) {
    let speed = SpeedCalculator::default();
    let mut last_bytes = 0u64;

    while let Some(event) = events.recv().await {
        match event {
            UploadEvent::State { file_name, state } => {
                if state == UploadState::Transferring {
                    speed.clear();
                    last_bytes = 0;
                }
                debug!(file = %file_name, state = ?state, "state");
            }
            UploadEvent::Progress(progress) => {
                speed.record(progress.transferred_bytes.saturating_sub(last_bytes));
                last_bytes = progress.transferred_bytes;

                let remaining = progress.total_bytes.saturating_sub(progress.transferred_bytes);
                let eta = speed
                    .eta(remaining)
                    .map(|d| format!("{}s", d.as_secs()))
                    .unwrap_or_else(|| "-".into());
                info!(
                    file = %progress.file_name,
                    parts = %format!("{}/{}", progress.completed_parts, progress.part_count),
                    percent = %format!("{:.0}", progress.percentage()),
                    speed_kib = (speed.rate() / 1024.0) as u64,
                    eta = %eta,
                    "progress"
                );
            }
            UploadEvent::FileReady(ready) => {
                info!(file = %ready.file_name, key = %ready.key, "file ready");
            }
            UploadEvent::Failed { file_name, error } => {
                warn!(file = %file_name, error = %error, "upload failed");
            }
            UploadEvent::Queue { file_name, status } => {
                debug!(file = %file_name, status = ?status, "queue");
            }
        }
    }
}

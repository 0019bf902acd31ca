//! Job registration: hands a finalized upload to the processing pipeline.

use serde::{Deserialize, Serialize};
use tracing::info;
use videoup_protocol::constants::START_TASK_PATH;
use videoup_protocol::{
    AnalysisSetting, EmbeddingSetting, ExtractionSetting, PreProcessSetting, S3Object,
    StartTaskRequest, VideoSource,
};

use crate::api::ApiClient;
use crate::control_plane::UploadFuture;
use crate::error::UploadError;
use crate::types::FileReady;

/// Processing options attached to every registered job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub pre_process: PreProcessSetting,
    pub extraction: ExtractionSetting,
    pub analysis: AnalysisSetting,
    pub embedding: EmbeddingSetting,
}

/// Receives the "file ready" handoff.
pub trait JobRegistrar: Send + Sync {
    fn register<'a>(&'a self, ready: &'a FileReady) -> UploadFuture<'a, ()>;
}

/// [`JobRegistrar`] posting to the start-task endpoint.
#[derive(Clone)]
pub struct HttpJobRegistrar {
    api: ApiClient,
    settings: JobSettings,
    requested_by: Option<String>,
}

impl HttpJobRegistrar {
    pub fn new(api: ApiClient, settings: JobSettings, requested_by: Option<String>) -> Self {
        Self {
            api,
            settings,
            requested_by,
        }
    }

    fn request(&self, ready: &FileReady) -> StartTaskRequest {
        StartTaskRequest {
            task_id: ready.task_id.clone(),
            file_name: ready.file_name.clone(),
            request_by: self.requested_by.clone(),
            video: VideoSource {
                s3_object: S3Object {
                    bucket: ready.bucket.clone(),
                    key: ready.key.clone(),
                },
            },
            pre_process_setting: self.settings.pre_process.clone(),
            extraction_setting: self.settings.extraction.clone(),
            analysis_setting: self.settings.analysis.clone(),
            embedding_setting: self.settings.embedding.clone(),
        }
    }
}

impl JobRegistrar for HttpJobRegistrar {
    fn register<'a>(&'a self, ready: &'a FileReady) -> UploadFuture<'a, ()> {
        Box::pin(async move {
            let req = self.request(ready);
            self.api
                .post(START_TASK_PATH, &req)
                .await
                .map_err(|e| UploadError::JobRegistration(e.to_string()))?
                .ensure_success()
                .map_err(|e| UploadError::JobRegistration(e.to_string()))?;

            info!(file = %ready.file_name, task_id = %ready.task_id, "job registered");
            Ok(())
        })
    }
}

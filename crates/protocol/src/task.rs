//! Job registration payload sent once a video is fully uploaded.

use serde::{Deserialize, Serialize};

/// Registers an analysis job for an uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartTaskRequest {
    pub task_id: String,
    pub file_name: String,
    pub request_by: Option<String>,
    pub video: VideoSource,
    pub pre_process_setting: PreProcessSetting,
    pub extraction_setting: ExtractionSetting,
    pub analysis_setting: AnalysisSetting,
    pub embedding_setting: EmbeddingSetting,
}

/// Storage location of the uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoSource {
    pub s3_object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Object {
    pub bucket: String,
    pub key: String,
}

/// Frame sampling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PreProcessSetting {
    pub sample_mode: String,
    pub sample_interval_s: f64,
    pub smart_sample: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
}

impl Default for PreProcessSetting {
    fn default() -> Self {
        Self {
            sample_mode: "even".into(),
            sample_interval_s: 1.0,
            smart_sample: true,
            similarity_threshold: None,
        }
    }
}

/// Per-frame extraction toggles and confidence thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExtractionSetting {
    pub transcription: bool,
    pub detect_label: bool,
    pub detect_text: bool,
    pub detect_celebrity: bool,
    pub detect_moderation: bool,
    pub detect_logo: bool,
    pub image_caption: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_moderation_confidence_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_label_confidence_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_text_confidence_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_celebrity_confidence_threshold: Option<f64>,
    pub aggregate_result: bool,
}

impl Default for ExtractionSetting {
    fn default() -> Self {
        Self {
            transcription: true,
            detect_label: true,
            detect_text: true,
            detect_celebrity: true,
            detect_moderation: true,
            detect_logo: true,
            image_caption: true,
            detect_moderation_confidence_threshold: None,
            detect_label_confidence_threshold: None,
            detect_text_confidence_threshold: None,
            detect_celebrity_confidence_threshold: None,
            aggregate_result: true,
        }
    }
}

/// Shot and scene detection options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AnalysisSetting {
    pub shot_detection: bool,
    pub scene_detection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_similarity_threshold: Option<f64>,
}

impl Default for AnalysisSetting {
    fn default() -> Self {
        Self {
            shot_detection: true,
            scene_detection: true,
            shot_similarity_threshold: None,
        }
    }
}

/// Vector embedding toggles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmbeddingSetting {
    pub text: bool,
    pub multi_modal: bool,
}

//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/videoup/uploader.toml`
//! - Windows: `%APPDATA%/videoup/uploader.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use videoup_upload::JobSettings;

/// Environment variable that overrides `id_token`.
pub const TOKEN_ENV: &str = "VIDEOUP_ID_TOKEN";

/// Uploader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the control-plane API.
    #[serde(default)]
    pub api_base_url: String,

    /// Value of the `x-api-key` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Identity token sent as `Authorization`.
    #[serde(default)]
    pub id_token: Option<String>,

    /// Part transfers in flight per file; unset sends all parts at once.
    #[serde(default)]
    pub max_concurrent_parts: Option<usize>,

    /// Discard the server-side session when an upload fails.
    #[serde(default)]
    pub abort_on_failure: bool,

    /// Check each part's ETag against its MD5.
    #[serde(default)]
    pub verify_checksum: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Register an analysis job for every uploaded file.
    #[serde(default = "default_true")]
    pub register_jobs: bool,

    /// Recorded as the job's requester.
    #[serde(default)]
    pub requested_by: Option<String>,

    /// Processing options for registered jobs.
    #[serde(default)]
    pub job: JobSettings,
}

fn default_request_timeout() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_key: None,
            id_token: None,
            max_concurrent_parts: None,
            abort_on_failure: false,
            verify_checksum: false,
            request_timeout_secs: default_request_timeout(),
            register_jobs: default_true(),
            requested_by: None,
            job: JobSettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Holds credentials; restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Replaces `id_token` when `token` is set and non-empty.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.id_token = Some(token);
        }
        self
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("videoup")
            .join("uploader.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("videoup").join("uploader.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/videoup/uploader.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.api_base_url.is_empty());
        assert!(config.max_concurrent_parts.is_none());
        assert!(!config.abort_on_failure);
        assert_eq!(config.request_timeout_secs, 300);
        assert!(config.register_jobs);
        assert_eq!(config.job.pre_process.sample_mode, "even");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml_str = r#"
            api_base_url = "https://api.example.com/prod"
            max_concurrent_parts = 4

            [job.analysis]
            SceneDetection = false
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/prod");
        assert_eq!(config.max_concurrent_parts, Some(4));
        assert!(config.register_jobs);
        assert!(!config.job.analysis.scene_detection);
        assert!(config.job.analysis.shot_detection);
        assert!(config.job.extraction.detect_label);
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("uploader.toml");

        let config = Config {
            api_base_url: "http://localhost:3000".into(),
            api_key: Some("key".into()),
            abort_on_failure: true,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.api_base_url, "http://localhost:3000");
        assert_eq!(loaded.api_key.as_deref(), Some("key"));
        assert!(loaded.abort_on_failure);
        assert_eq!(loaded.job, JobSettings::default());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("uploader.toml");
        Config::default().save_to(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_writes_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("uploader.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn token_override() {
        let config = Config {
            id_token: Some("file".into()),
            ..Config::default()
        };
        let config = config.with_token_override(Some(String::new()));
        assert_eq!(config.id_token.as_deref(), Some("file"));
        let config = config.with_token_override(Some("env".into()));
        assert_eq!(config.id_token.as_deref(), Some("env"));
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("videoup"));
    }
}

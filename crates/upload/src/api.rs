//! Authenticated JSON client for the control-plane API.
//!
//! Async HTTP client using `reqwest`; every call returns the function
//! envelope so callers decide how a rejection maps to their error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use videoup_protocol::Envelope;
use videoup_protocol::constants::API_KEY_HEADER;

use crate::credentials::CredentialProvider;
use crate::error::UploadError;

/// Errors from the control-plane API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Envelope(#[from] videoup_protocol::Error),

    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}

/// Control-plane API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Creates a client rooted at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        credentials: Arc<dyn CredentialProvider>,
        timeout: Option<Duration>,
    ) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            credentials,
        })
    }

    /// POSTs `body` as JSON to `path` and decodes the envelope.
    ///
    /// Non-2xx HTTP statuses are errors; the envelope's own status is left
    /// for the caller to check.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Envelope, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.post(&url).json(body);

        let token = self
            .credentials
            .id_token()
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&token)
                .map_err(|_| ApiError::InvalidHeader("Authorization"))?;
            req = req.header(AUTHORIZATION, value);
        }
        if let Some(key) = &self.api_key {
            let value =
                HeaderValue::from_str(key).map_err(|_| ApiError::InvalidHeader(API_KEY_HEADER))?;
            req = req.header(API_KEY_HEADER, value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(Envelope::from_slice(&bytes)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

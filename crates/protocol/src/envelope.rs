use serde::{Deserialize, Serialize};

/// Errors decoding a control-plane envelope.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("empty response body")]
    EmptyBody,
}

/// Function-style response wrapper: `{"statusCode": 200, "body": ...}`.
///
/// The endpoint reports its own status inside the JSON regardless of the
/// HTTP status. `body` is an object on success and usually a plain string
/// on failure, so it is kept raw until the status is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Box<serde_json::value::RawValue>>,
}

impl Envelope {
    /// Parses an envelope from raw response bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Returns `true` if the embedded status is 200.
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Returns the body as a human-readable message.
    ///
    /// String bodies are unquoted; anything else is returned as raw JSON.
    pub fn message(&self) -> String {
        match &self.body {
            Some(raw) => serde_json::from_str::<String>(raw.get())
                .unwrap_or_else(|_| raw.get().to_string()),
            None => String::new(),
        }
    }

    /// Checks the embedded status and deserializes the body.
    pub fn into_body<T: for<'de> Deserialize<'de>>(self) -> Result<T, Error> {
        if !self.is_success() {
            return Err(Error::Rejected {
                status: self.status_code,
                message: self.message(),
            });
        }
        let raw = self.body.ok_or(Error::EmptyBody)?;
        Ok(serde_json::from_str(raw.get())?)
    }

    /// Checks the embedded status, ignoring the body.
    pub fn ensure_success(&self) -> Result<(), Error> {
        if self.is_success() {
            Ok(())
        } else {
            Err(Error::Rejected {
                status: self.status_code,
                message: self.message(),
            })
        }
    }
}

//! Credential source for control-plane requests.
//!
//! The session provider is external; the orchestrator only asks it for a
//! token right before each request.

use std::future::Future;
use std::pin::Pin;

use crate::error::UploadError;

/// Future returned by [`CredentialProvider::id_token`].
pub type TokenFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<String>, UploadError>> + Send + 'a>>;

/// Supplies the identity token sent in the `Authorization` header.
pub trait CredentialProvider: Send + Sync {
    /// Returns the current token, or `None` for unauthenticated requests.
    fn id_token(&self) -> TokenFuture<'_>;
}

/// A fixed token read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn id_token(&self) -> TokenFuture<'_> {
        Box::pin(async move { Ok(self.token.clone()) })
    }
}

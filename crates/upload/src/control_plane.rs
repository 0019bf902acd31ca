//! Control-plane client: opens, completes and aborts multipart sessions.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;
use videoup_protocol::constants::PRESIGNED_URL_PATH;
use videoup_protocol::{
    AbortRequest, AuthorizeRequest, AuthorizeResponse, CompletedPart, FinalizeRequest,
};

use crate::api::ApiClient;
use crate::error::UploadError;
use crate::types::Authorization;

/// Boxed future returned by the transport traits.
pub type UploadFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Abstract control plane.
///
/// `authorize` allocates server-side state on every call, so the
/// coordinator calls it exactly once per file submission.
pub trait ControlPlane: Send + Sync {
    /// Opens a session with one destination per part.
    fn authorize<'a>(&'a self, file_name: &'a str, part_count: u32)
    -> UploadFuture<'a, Authorization>;

    /// Assembles the parts. `parts` must be complete and sorted by part number.
    fn finalize<'a>(
        &'a self,
        authorization: &'a Authorization,
        file_name: &'a str,
        parts: Vec<CompletedPart>,
    ) -> UploadFuture<'a, ()>;

    /// Discards the session and any stored parts.
    fn abort<'a>(
        &'a self,
        authorization: &'a Authorization,
        file_name: &'a str,
    ) -> UploadFuture<'a, ()>;
}

/// [`ControlPlane`] backed by the presigned-URL endpoint.
#[derive(Clone)]
pub struct HttpControlPlane {
    api: ApiClient,
}

impl HttpControlPlane {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl ControlPlane for HttpControlPlane {
    fn authorize<'a>(
        &'a self,
        file_name: &'a str,
        part_count: u32,
    ) -> UploadFuture<'a, Authorization> {
        Box::pin(async move {
            let req = AuthorizeRequest::new(file_name, part_count);
            let resp: AuthorizeResponse = self
                .api
                .post(PRESIGNED_URL_PATH, &req)
                .await
                .map_err(|e| UploadError::Authorization(e.to_string()))?
                .into_body()
                .map_err(|e| UploadError::Authorization(e.to_string()))?;

            debug!(
                file = %file_name,
                task_id = %resp.task_id,
                urls = resp.upload_part_urls.len(),
                "upload session authorized"
            );

            Ok(Authorization {
                task_id: resp.task_id,
                upload_id: resp.upload_id,
                bucket: resp.s3_bucket,
                key: resp.s3_key,
                part_urls: resp.upload_part_urls,
            })
        })
    }

    fn finalize<'a>(
        &'a self,
        authorization: &'a Authorization,
        file_name: &'a str,
        parts: Vec<CompletedPart>,
    ) -> UploadFuture<'a, ()> {
        Box::pin(async move {
            let req = FinalizeRequest::new(
                &authorization.task_id,
                file_name,
                &authorization.upload_id,
                parts,
            );
            self.api
                .post(PRESIGNED_URL_PATH, &req)
                .await
                .map_err(|e| UploadError::Finalize(e.to_string()))?
                .ensure_success()
                .map_err(|e| UploadError::Finalize(e.to_string()))
        })
    }

    fn abort<'a>(
        &'a self,
        authorization: &'a Authorization,
        file_name: &'a str,
    ) -> UploadFuture<'a, ()> {
        Box::pin(async move {
            let req =
                AbortRequest::new(&authorization.task_id, file_name, &authorization.upload_id);
            self.api
                .post(PRESIGNED_URL_PATH, &req)
                .await
                .map_err(|e| UploadError::Abort(e.to_string()))?
                .ensure_success()
                .map_err(|e| UploadError::Abort(e.to_string()))
        })
    }
}

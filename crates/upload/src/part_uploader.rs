//! Part transfers to presigned object-store destinations.

use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderValue};
use tracing::debug;
use videoup_transfer::PartBody;

use crate::control_plane::UploadFuture;
use crate::error::UploadError;
use crate::types::Receipt;

/// Transfers a single part.
///
/// One transfer per call and no retries. The receipt pairs the store's
/// integrity token with the part number carried by `body`.
pub trait PartUploader: Send + Sync {
    fn upload<'a>(&'a self, destination: &'a str, body: PartBody) -> UploadFuture<'a, Receipt>;
}

/// [`PartUploader`] issuing one HTTP `PUT` per part.
#[derive(Clone)]
pub struct HttpPartUploader {
    http: reqwest::Client,
    verify_checksum: bool,
}

impl HttpPartUploader {
    pub fn new(timeout: Option<Duration>) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;
        Ok(Self {
            http,
            verify_checksum: false,
        })
    }

    /// Compares each returned ETag against the part's MD5.
    ///
    /// Only valid for stores that report plain MD5 ETags (no SSE-KMS).
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }
}

impl PartUploader for HttpPartUploader {
    fn upload<'a>(&'a self, destination: &'a str, body: PartBody) -> UploadFuture<'a, Receipt> {
        Box::pin(async move {
            let part_number = body.part_number();
            let len = body.len();
            let fail = |message: String| UploadError::Transfer {
                part: part_number,
                message,
            };

            let (body, digest) = if self.verify_checksum {
                let (body, digest) = body.with_md5();
                (body, Some(digest))
            } else {
                (body, None)
            };

            // The presigned signature does not cover Content-Type; send it empty.
            // Streamed bodies need an explicit length or the store rejects the PUT.
            let resp = self
                .http
                .put(destination)
                .header(CONTENT_TYPE, HeaderValue::from_static(""))
                .header(CONTENT_LENGTH, len)
                .body(reqwest::Body::wrap_stream(body.into_stream()))
                .send()
                .await
                .map_err(|e| fail(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(fail(format!("HTTP {}: {}", status.as_u16(), body.trim())));
            }

            let etag = resp
                .headers()
                .get(ETAG)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| fail("response carried no ETag".into()))?;

            if let Some(expected) = digest.map(|d| d.hex()) {
                let actual = etag.trim_matches('"');
                if !actual.eq_ignore_ascii_case(&expected) {
                    return Err(fail(format!(
                        "checksum mismatch: expected {expected}, got {actual}"
                    )));
                }
            }

            debug!(part = part_number, bytes = len, etag = %etag, "part stored");
            Ok(Receipt { part_number, etag })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockResponse, MockServer};
    use videoup_transfer::{ByteSource, FileSource, PartRange, part_md5_hex};

    #[tokio::test]
    async fn put_returns_verbatim_etag() {
        let server = MockServer::start(vec![
            MockResponse::empty(200).with_header("ETag", "\"abc123\""),
        ])
        .await;
        let uploader = HttpPartUploader::new(None).unwrap();

        let dest = format!("{}/bucket/key?partNumber=2&X-Amz-Signature=s", server.url());
        let receipt = uploader
            .upload(&dest, PartBody::in_memory(2, &b"part bytes"[..]))
            .await
            .unwrap();
        assert_eq!(
            receipt,
            Receipt {
                part_number: 2,
                etag: "\"abc123\"".into()
            }
        );

        let reqs = server.requests();
        assert_eq!(reqs[0].method, "PUT");
        assert_eq!(reqs[0].path, "/bucket/key?partNumber=2&X-Amz-Signature=s");
        assert_eq!(reqs[0].body, b"part bytes");
        assert_eq!(reqs[0].header("content-type"), Some(""));
        assert_eq!(reqs[0].header("content-length"), Some("10"));
    }

    #[tokio::test]
    async fn file_part_streams_its_exact_range() {
        let dir = tempfile::TempDir::new().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, &data).unwrap();
        let source = FileSource::open(&path).await.unwrap();

        let range = PartRange { index: 2, start: 70_000, end: 170_000 };
        let etag = format!("\"{}\"", part_md5_hex(&data[70_000..170_000]));
        let server =
            MockServer::start(vec![MockResponse::empty(200).with_header("ETag", &etag)]).await;
        let uploader = HttpPartUploader::new(None)
            .unwrap()
            .with_checksum_verification(true);

        let receipt = uploader
            .upload(&format!("{}/p", server.url()), source.stream_range(range).unwrap())
            .await
            .unwrap();
        assert_eq!(receipt.part_number, 2);

        let reqs = server.requests();
        assert_eq!(reqs[0].header("content-length"), Some("100000"));
        assert_eq!(reqs[0].body, &data[70_000..170_000]);
    }

    #[tokio::test]
    async fn non_success_status_is_transfer_error() {
        let server =
            MockServer::start(vec![MockResponse::json(403, "SignatureDoesNotMatch")]).await;
        let uploader = HttpPartUploader::new(None).unwrap();

        let err = uploader
            .upload(&format!("{}/p", server.url()), PartBody::in_memory(3, vec![1, 2, 3]))
            .await
            .unwrap_err();
        match err {
            UploadError::Transfer { part, message } => {
                assert_eq!(part, 3);
                assert!(message.contains("403"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_etag_never_yields_receipt() {
        let server = MockServer::start(vec![MockResponse::empty(200)]).await;
        let uploader = HttpPartUploader::new(None).unwrap();

        let err = uploader
            .upload(&format!("{}/p", server.url()), PartBody::in_memory(1, vec![0; 16]))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Transfer { part: 1, .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_transfer_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let uploader = HttpPartUploader::new(Some(Duration::from_secs(5))).unwrap();
        let err = uploader
            .upload(&format!("http://127.0.0.1:{port}/p"), PartBody::in_memory(1, vec![0; 4]))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Transfer { part: 1, .. }));
    }

    #[tokio::test]
    async fn checksum_verification_accepts_matching_etag() {
        let data = b"hello".to_vec();
        let etag = format!("\"{}\"", part_md5_hex(&data));
        let server =
            MockServer::start(vec![MockResponse::empty(200).with_header("ETag", &etag)]).await;
        let uploader = HttpPartUploader::new(None)
            .unwrap()
            .with_checksum_verification(true);

        let receipt = uploader
            .upload(&format!("{}/p", server.url()), PartBody::in_memory(1, data))
            .await
            .unwrap();
        assert_eq!(receipt.etag, etag);
    }

    #[tokio::test]
    async fn checksum_verification_rejects_mismatch() {
        let server = MockServer::start(vec![
            MockResponse::empty(200).with_header("ETag", "\"00000000000000000000000000000000\""),
        ])
        .await;
        let uploader = HttpPartUploader::new(None)
            .unwrap()
            .with_checksum_verification(true);

        let err = uploader
            .upload(&format!("{}/p", server.url()), PartBody::in_memory(1, &b"hello"[..]))
            .await
            .unwrap_err();
        match err {
            UploadError::Transfer { message, .. } => assert!(message.contains("mismatch")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}

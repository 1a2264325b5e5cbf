//! Upload collaborator: turns an `upload-images` batch into a URL map.
//!
//! Images either go to the image hosting API (JSON batches with a bearer
//! token) or are written to a local directory and referenced by `file://`
//! URLs.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::UploadConfig;
use crate::error::{CuiError, Result};
use crate::protocol::ImagePayload;
use crate::types::UrlMap;

/// Outcome of one upload round. Failed chunks do not fail the round.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub urls: UrlMap,
    pub failures: Vec<String>,
}

#[derive(Debug)]
pub enum UploadTarget {
    Http(HttpUploader),
    Directory(DirectoryWriter),
}

impl UploadTarget {
    /// HTTP when an endpoint is configured, otherwise `fallback_dir`.
    pub fn from_config(config: &UploadConfig, fallback_dir: PathBuf) -> Result<Self> {
        match &config.endpoint {
            Some(endpoint) => Ok(UploadTarget::Http(HttpUploader::new(
                endpoint,
                config.timeout,
                config.chunk_size,
            )?)),
            None => Ok(UploadTarget::Directory(DirectoryWriter::new(fallback_dir))),
        }
    }

    /// Only the HTTP endpoint authenticates uploads.
    pub fn needs_token(&self) -> bool {
        matches!(self, UploadTarget::Http(_))
    }

    pub async fn upload(&self, images: &[ImagePayload], token: &str) -> Result<UploadReport> {
        match self {
            UploadTarget::Http(http) => http.upload(images, token).await,
            UploadTarget::Directory(dir) => dir.write(images).await,
        }
    }
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    images: &'a [ImagePayload],
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    urls: Vec<UploadedUrl>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedUrl {
    node_id: Option<String>,
    url: Option<String>,
}

#[derive(Debug)]
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: Url,
    chunk_size: usize,
}

impl HttpUploader {
    pub fn new(endpoint: &str, timeout: Duration, chunk_size: usize) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            chunk_size: chunk_size.max(1),
        })
    }

    pub async fn upload(&self, images: &[ImagePayload], token: &str) -> Result<UploadReport> {
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| CuiError::Config("API token contains invalid characters".to_string()))?;

        let mut report = UploadReport::default();
        let total = images.len().div_ceil(self.chunk_size);
        for (i, chunk) in images.chunks(self.chunk_size).enumerate() {
            debug!(chunk = i + 1, total, images = chunk.len(), "uploading chunk");
            match self.send_chunk(chunk, auth.clone()).await {
                Ok(urls) => report.urls.extend(urls),
                Err(err) => {
                    warn!(chunk = i + 1, error = %err, "upload chunk failed");
                    report
                        .failures
                        .push(format!("chunk {}/{}: {}", i + 1, total, err));
                }
            }
        }
        Ok(report)
    }

    async fn send_chunk(&self, chunk: &[ImagePayload], auth: HeaderValue) -> Result<UrlMap> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, auth)
            .json(&UploadRequest { images: chunk })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CuiError::Unknown(format!(
                "upload API returned {status}: {}",
                body.trim()
            )));
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed
            .urls
            .into_iter()
            .filter_map(|u| Some((u.node_id?, u.url?)))
            .collect())
    }
}

/// Writes images under a directory and answers with `file://` URLs.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    dir: PathBuf,
}

impl DirectoryWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub async fn write(&self, images: &[ImagePayload]) -> Result<UploadReport> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let dir = tokio::fs::canonicalize(&self.dir).await?;

        let mut report = UploadReport::default();
        for image in images {
            let path = dir.join(&image.filename);
            let written = match image.decode_bytes() {
                Ok(bytes) => tokio::fs::write(&path, bytes).await.map_err(CuiError::from),
                Err(err) => Err(err),
            };
            match written {
                Ok(()) => {
                    let url = Url::from_file_path(&path).map_err(|_| {
                        CuiError::Config(format!("cannot express {} as a URL", path.display()))
                    })?;
                    report.urls.insert(image.node_id.clone(), url.to_string());
                }
                Err(err) => {
                    warn!(file = %image.filename, error = %err, "could not write image");
                    report.failures.push(format!("{}: {}", image.filename, err));
                }
            }
        }
        Ok(report)
    }
}

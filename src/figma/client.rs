//! Figma API client for fetching node data and exporting images.

use std::time::Duration;

use reqwest::{header::RETRY_AFTER, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::FIGMA_API_BASE;
use crate::error::{CuiError, Result};

use super::api_types::{FigmaImageExport, FigmaNodeData, FigmaNodesResponse, ImageFormat};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub enum FigmaAuth {
    PersonalAccessToken(String),
    OAuthToken(String),
}

impl FigmaAuth {
    pub fn from_env() -> Option<Self> {
        if let Ok(token) = std::env::var("FIGMA_TOKEN") {
            if !token.is_empty() {
                return Some(Self::PersonalAccessToken(token));
            }
        }

        if let Ok(token) = std::env::var("FIGMA_OAUTH_TOKEN") {
            if !token.is_empty() {
                return Some(Self::OAuthToken(token));
            }
        }

        None
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            FigmaAuth::PersonalAccessToken(token) => builder.header("X-FIGMA-TOKEN", token),
            FigmaAuth::OAuthToken(token) => builder.bearer_auth(token),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: Client,
    auth: FigmaAuth,
    base_url: String,
}

impl FigmaClient {
    pub fn new(auth: FigmaAuth) -> Result<Self> {
        Self::with_base_url(auth, FIGMA_API_BASE)
    }

    pub fn with_base_url(auth: FigmaAuth, base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(CuiError::Network)?;

        Ok(Self {
            http,
            auth,
            base_url,
        })
    }

    pub async fn fetch_nodes(
        &self,
        file_key: &str,
        node_ids: &[String],
    ) -> Result<FigmaNodesResponse> {
        if node_ids.is_empty() {
            return Err(CuiError::Config(
                "node_ids cannot be empty when fetching nodes from Figma".into(),
            ));
        }

        let url = self.endpoint(
            &format!("files/{file_key}/nodes"),
            &[("ids", node_ids.join(","))],
        )?;
        self.send_json(self.auth.apply(self.http.get(url))).await
    }

    /// Fetch one node's full subtree.
    pub async fn fetch_node(&self, file_key: &str, node_id: &str) -> Result<FigmaNodeData> {
        let mut response = self.fetch_nodes(file_key, &[node_id.to_string()]).await?;
        response
            .nodes
            .remove(node_id)
            .flatten()
            .map(|wrapper| wrapper.document)
            .ok_or_else(|| {
                CuiError::figma_api(
                    Some(StatusCode::NOT_FOUND),
                    format!("Node {node_id} not found in file {file_key}"),
                )
            })
    }

    /// Ask Figma to render `node_id` and return the temporary image URL.
    pub async fn export_image(
        &self,
        file_key: &str,
        node_id: &str,
        format: ImageFormat,
        scale: f64,
    ) -> Result<String> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CuiError::Config(
                "scale must be greater than zero for Figma exports".into(),
            ));
        }

        let url = self.endpoint(
            &format!("images/{file_key}"),
            &[
                ("ids", node_id.to_string()),
                ("scale", scale.to_string()),
                ("format", format.as_str().to_string()),
            ],
        )?;
        let export: FigmaImageExport = self.send_json(self.auth.apply(self.http.get(url))).await?;
        if let Some(err) = export.err {
            return Err(CuiError::figma_api(None, err));
        }

        export
            .images
            .get(node_id)
            .cloned()
            .flatten()
            .ok_or_else(|| CuiError::figma_api(None, format!("image URL missing for node {node_id}")))
    }

    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await.map_err(CuiError::Network)?;

        let status = response.status();

        if status.is_success() {
            return response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(CuiError::Network);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CuiError::figma_api(
            Some(status),
            format!(
                "failed to download image (status {}): {}",
                status.as_u16(),
                body
            ),
        ))
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/{path}", self.base_url),
            query.iter().map(|(k, v)| (*k, v.as_str())),
        )?;
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(CuiError::Network)?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str(&body).map_err(CuiError::Serialization);
        }

        Err(CuiError::figma_api(
            Some(status),
            error_message(status, &body, retry_after.as_deref()),
        ))
    }
}

fn error_message(status: StatusCode, body: &str, retry_after: Option<&str>) -> String {
    let fallback = format!("Figma API returned status {}", status.as_u16());
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_body = parsed
        .as_ref()
        .and_then(|value| value.get("err").or_else(|| value.get("error")))
        .and_then(Value::as_str)
        .map(str::to_owned);

    match (status, retry_after, from_body) {
        (StatusCode::TOO_MANY_REQUESTS, Some(retry), Some(msg)) => {
            format!("{msg} (rate limited, retry after {retry}s)")
        }
        (StatusCode::TOO_MANY_REQUESTS, Some(retry), None) => {
            format!("rate limited by Figma API, retry after {retry}s")
        }
        (_, _, Some(msg)) => msg,
        _ => fallback,
    }
}

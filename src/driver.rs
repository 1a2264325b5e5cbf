//! UI side of the plugin protocol, for running a session to completion.
//!
//! The CLI has no interactive UI. These drivers send a single command, answer
//! `upload-images` through an [`UploadTarget`], and collect the events the
//! session emits until the command finishes.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{CuiError, Result};
use crate::host::{FlatRasterizer, Rasterizer, SceneHost};
use crate::protocol::{ImagePayload, Inbound, Outbound};
use crate::session::{PluginSession, SessionSettings};
use crate::upload::UploadTarget;

/// The `code-generated` event plus what happened along the way.
#[derive(Debug, Clone)]
pub struct Generation {
    pub summary: String,
    pub plugin: String,
    pub plugin_file: String,
    pub frame_name: String,
    pub files: Vec<String>,
    pub element_count: usize,
    pub uploaded: usize,
    /// Every image rasterized during the pass.
    pub images: Vec<ImagePayload>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub root_id: String,
    pub name: String,
    pub node_count: usize,
    pub skipped: usize,
    pub log: Vec<String>,
}

/// Run one generation pass over the host's current selection.
///
/// A target that needs no token, such as a local directory, is used even
/// when `token` is `None`.
pub async fn run_generation<H: SceneHost, R: Rasterizer>(
    host: H,
    rasterizer: R,
    mut settings: SessionSettings,
    token: Option<String>,
    uploader: &UploadTarget,
) -> Result<Generation> {
    settings.upload_without_token |= !uploader.needs_token();
    let (event_tx, events) = mpsc::unbounded_channel();
    let (command_tx, commands) = mpsc::unbounded_channel();
    let mut session = PluginSession::new(host, rasterizer, settings, event_tx).with_token(token);

    let driver = drive_generation(command_tx, events, uploader);
    let ((), result) = tokio::join!(session.run(commands), driver);
    result
}

async fn drive_generation(
    command_tx: mpsc::UnboundedSender<Inbound>,
    mut events: mpsc::UnboundedReceiver<Outbound>,
    uploader: &UploadTarget,
) -> Result<Generation> {
    command_tx
        .send(Inbound::GenerateCode {
            api_token: None,
            asset_mode: None,
        })
        .map_err(|_| CuiError::Unknown("session stopped before generating".to_string()))?;

    let mut log = Vec::new();
    let mut uploaded = 0;
    let mut cached = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            Outbound::CacheImages { images } => cached = images,
            Outbound::Log { message } => {
                info!(target: "figcui::session", "{message}");
                log.push(message);
            }
            Outbound::UploadImages {
                pass_id,
                images,
                token,
            } => {
                debug!(pass_id, images = images.len(), "answering upload-images");
                let report = uploader.upload(&images, &token).await?;
                for failure in report.failures {
                    warn!(%failure, "image upload failed");
                    log.push(format!("Upload failed: {failure}"));
                }
                uploaded += report.urls.len();
                let sent = command_tx.send(Inbound::UploadComplete {
                    pass_id: Some(pass_id),
                    results: report.urls,
                });
                if sent.is_err() {
                    break;
                }
            }
            Outbound::CodeGenerated {
                summary,
                plugin,
                plugin_file,
                frame_name,
                files,
                element_count,
            } => {
                return Ok(Generation {
                    summary,
                    plugin,
                    plugin_file,
                    frame_name,
                    files,
                    element_count,
                    uploaded,
                    images: cached,
                    log,
                });
            }
            Outbound::Error {
                message,
                remediation,
            } => {
                return Err(CuiError::Session {
                    message,
                    remediation,
                })
            }
            other => debug!(?other, "ignoring event"),
        }
    }
    Err(CuiError::Unknown(
        "session ended without generating code".to_string(),
    ))
}

/// Rebuild `data` in `host` and return the host with the new tree on its page.
pub async fn run_import<H: SceneHost>(
    host: H,
    data: Value,
    settings: SessionSettings,
) -> Result<(Import, H)> {
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let (command_tx, commands) = mpsc::unbounded_channel();
    let mut session = PluginSession::new(host, FlatRasterizer, settings, event_tx);

    command_tx
        .send(Inbound::LoadJsonData { data })
        .map_err(|_| CuiError::Unknown("session stopped before importing".to_string()))?;
    drop(command_tx);
    session.run(commands).await;

    let mut log = Vec::new();
    let mut outcome = None;
    while let Ok(event) = events.try_recv() {
        match event {
            Outbound::Log { message } => log.push(message),
            Outbound::TreeLoaded {
                root_id,
                name,
                node_count,
                skipped,
            } => {
                outcome = Some((root_id, name, node_count, skipped));
            }
            Outbound::Error {
                message,
                remediation,
            } => {
                return Err(CuiError::Session {
                    message,
                    remediation,
                })
            }
            other => debug!(?other, "ignoring event"),
        }
    }

    let (root_id, name, node_count, skipped) = outcome
        .ok_or_else(|| CuiError::Unknown("session ended without loading a tree".to_string()))?;
    Ok((
        Import {
            root_id,
            name,
            node_count,
            skipped,
            log,
        },
        session.into_host(),
    ))
}

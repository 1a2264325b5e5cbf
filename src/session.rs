//! One plugin activation: token state, font cache and command dispatch.
//!
//! [`PluginSession::run`] handles inbound commands one at a time, in arrival
//! order. A generation pass that is waiting for its uploads keeps reading the
//! inbound channel: the matching `upload-complete` resolves it, a second
//! `generate-code` is rejected as busy, and everything else is queued until
//! the pass is over.

use std::collections::{BTreeMap, VecDeque};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::deserializer::{build_tree, FontCache};
use crate::error::{CuiError, Result};
use crate::host::{Rasterizer, SceneHost};
use crate::protocol::{AssetMode, ImagePayload, Inbound, Outbound};
use crate::serializer::{collect_image_refs, render_plugin, render_summary, serialize_tree};
use crate::types::{DesignNode, FontName, UrlMap};

/// The parts of [`Config`] a session needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub export_scale: f64,
    pub author: String,
    pub default_font: FontName,
    /// Initial asset mode; `generate-code` may replace it.
    pub asset_mode: AssetMode,
    /// Request uploads even when no API token is set.
    pub upload_without_token: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            export_scale: config.export_scale,
            author: config.author.clone(),
            default_font: config.default_font.clone(),
            asset_mode: config.asset_mode,
            upload_without_token: false,
        }
    }
}

enum UploadWait {
    Resolved(UrlMap),
    Cancelled,
    Closed,
}

/// The upload continuation of a generation pass.
struct PendingUpload {
    pass_id: u64,
    reply: oneshot::Sender<UrlMap>,
}

pub struct PluginSession<H, R> {
    host: H,
    rasterizer: R,
    settings: SessionSettings,
    token: Option<String>,
    asset_mode: AssetMode,
    fonts: FontCache,
    events: mpsc::UnboundedSender<Outbound>,
    next_pass: u64,
}

impl<H: SceneHost, R: Rasterizer> PluginSession<H, R> {
    pub fn new(
        host: H,
        rasterizer: R,
        settings: SessionSettings,
        events: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            host,
            rasterizer,
            asset_mode: settings.asset_mode,
            settings,
            token: None,
            fonts: FontCache::new(),
            events,
            next_pass: 1,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn asset_mode(&self) -> AssetMode {
        self.asset_mode
    }

    /// Serve commands until the inbound channel closes.
    pub async fn run(&mut self, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
        let mut deferred = VecDeque::new();
        loop {
            let msg = match deferred.pop_front() {
                Some(msg) => msg,
                None => match inbound.recv().await {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let closed = match msg {
                Inbound::GenerateCode {
                    api_token,
                    asset_mode,
                } => {
                    match self
                        .generate(api_token, asset_mode, &mut inbound, &mut deferred)
                        .await
                    {
                        Ok(closed) => closed,
                        Err(err) => {
                            self.fail(&err);
                            false
                        }
                    }
                }
                other => {
                    if let Err(err) = self.dispatch(other).await {
                        self.fail(&err);
                    }
                    false
                }
            };
            if closed {
                break;
            }
        }
        debug!("session inbound closed");
    }

    /// Handle every command except `generate-code`.
    async fn dispatch(&mut self, msg: Inbound) -> Result<()> {
        match msg {
            Inbound::RequestInit => {
                self.emit(Outbound::Init {
                    token: self.token.clone().unwrap_or_default(),
                });
            }
            Inbound::SaveToken { api_token } => {
                let token = api_token.trim().to_string();
                let length = token.chars().count();
                self.token = (!token.is_empty()).then_some(token);
                info!(length, "token saved");
                self.emit(Outbound::TokenSaved { length });
            }
            Inbound::LoadJsonData { data } => {
                let report = build_tree(
                    &mut self.host,
                    &mut self.fonts,
                    &data,
                    &self.settings.default_font,
                )
                .await?;
                if let Err(err) = self.host.append_to_page(report.root) {
                    self.host.remove(report.root);
                    return Err(err.into());
                }
                for skipped in &report.skipped {
                    self.emit(Outbound::log(format!(
                        "Skipped node at {}: {}",
                        skipped.path, skipped.reason
                    )));
                }
                let root_id = self.host.snapshot(report.root)?.id;
                self.emit(Outbound::TreeLoaded {
                    root_id,
                    name: report.name,
                    node_count: report.node_count,
                    skipped: report.skipped.len(),
                });
            }
            Inbound::RequestDebug => {
                let selection = self.host.selection();
                match &selection {
                    Some(node) => self.emit(Outbound::log(format!(
                        "Selection: {} ({}, {} nodes)",
                        node.name,
                        node.node_type,
                        node.count()
                    ))),
                    None => self.emit(Outbound::log("Nothing selected")),
                }
                self.emit(Outbound::debug(selection.as_ref()));
            }
            Inbound::UploadComplete { .. } => {
                warn!("upload-complete without a pending request");
                self.emit(Outbound::log(
                    "Received upload-complete with no pending request",
                ));
            }
            Inbound::Cancel => {
                self.emit(Outbound::log("Nothing to cancel"));
            }
            Inbound::GenerateCode { .. } => {
                return Err(CuiError::Busy(
                    "a generation pass is already running".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Run one generation pass. Returns `true` when the inbound channel
    /// closed while waiting for uploads.
    async fn generate(
        &mut self,
        api_token: Option<String>,
        asset_mode: Option<AssetMode>,
        inbound: &mut mpsc::UnboundedReceiver<Inbound>,
        deferred: &mut VecDeque<Inbound>,
    ) -> Result<bool> {
        if let Some(token) = api_token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token.trim().to_string());
        }
        if let Some(mode) = asset_mode {
            self.asset_mode = mode;
            self.emit(Outbound::log(format!("Asset mode: {mode}")));
        }

        let root = self.selected_root()?;
        self.emit(Outbound::log(format!("Generating from frame {}", root.name)));
        self.log_type_counts(&root);

        let batch = collect_image_refs(&root, &self.rasterizer, self.settings.export_scale).await;
        for failure in &batch.failures {
            self.emit(Outbound::log(format!(
                "Could not rasterize {} ({}): {}",
                failure.node_name, failure.node_id, failure.reason
            )));
        }
        let files: Vec<String> = batch.images.iter().map(|i| i.file_name.clone()).collect();

        let payloads: Vec<ImagePayload> = batch.images.iter().map(ImagePayload::from).collect();
        if !payloads.is_empty() {
            self.emit(Outbound::CacheImages {
                images: payloads.clone(),
            });
        }

        let urls = if payloads.is_empty() {
            UrlMap::new()
        } else if self.asset_mode == AssetMode::Data {
            self.emit(Outbound::log(format!(
                "Data asset mode: {} images are loaded from the plugin data directory",
                payloads.len()
            )));
            batch.asset_keys()
        } else if self.token.is_none() && !self.settings.upload_without_token {
            info!(images = payloads.len(), "no api token, skipping upload");
            self.emit(Outbound::log(
                "No API token set; images are not uploaded",
            ));
            UrlMap::new()
        } else {
            let pass_id = self.next_pass;
            self.next_pass += 1;
            self.emit(Outbound::log(format!(
                "Sending {} images for upload",
                payloads.len()
            )));
            self.emit(Outbound::UploadImages {
                pass_id,
                images: payloads,
                token: self.token.clone().unwrap_or_default(),
            });

            match self.await_upload(pass_id, inbound, deferred).await {
                UploadWait::Resolved(urls) => urls,
                UploadWait::Cancelled => {
                    self.emit(Outbound::log("Generation cancelled"));
                    return Ok(false);
                }
                UploadWait::Closed => return Ok(true),
            }
        };

        let elements = serialize_tree(&root, &urls);
        let summary = render_summary(&elements);
        let plugin = render_plugin(&root, &elements, &self.settings.author, self.asset_mode);
        info!(
            elements = elements.len(),
            declared = plugin.declared,
            images = urls.len(),
            assets = %self.asset_mode,
            "code generated"
        );
        self.emit(Outbound::CodeGenerated {
            summary,
            plugin: plugin.code,
            plugin_file: plugin.file_name,
            frame_name: root.name.clone(),
            files,
            element_count: elements.len(),
        });
        Ok(false)
    }

    async fn await_upload(
        &mut self,
        pass_id: u64,
        inbound: &mut mpsc::UnboundedReceiver<Inbound>,
        deferred: &mut VecDeque<Inbound>,
    ) -> UploadWait {
        let (reply, mut resolved) = oneshot::channel();
        let mut pending = Some(PendingUpload { pass_id, reply });

        loop {
            tokio::select! {
                biased;
                urls = &mut resolved => {
                    return match urls {
                        Ok(urls) => UploadWait::Resolved(urls),
                        Err(_) => UploadWait::Cancelled,
                    };
                }
                msg = inbound.recv() => match msg {
                    None => return UploadWait::Closed,
                    Some(Inbound::UploadComplete { pass_id: id, results }) => {
                        match pending.take() {
                            Some(p) if id.map_or(true, |id| id == p.pass_id) => {
                                debug!(pass_id = p.pass_id, urls = results.len(), "upload resolved");
                                let _ = p.reply.send(results);
                            }
                            other => {
                                warn!(?id, pass_id, "ignoring stale upload-complete");
                                self.emit(Outbound::log("Ignoring upload results from an earlier pass"));
                                pending = other;
                            }
                        }
                    }
                    Some(Inbound::GenerateCode { .. }) => {
                        self.fail(&CuiError::Busy(
                            "a generation pass is already waiting for image uploads".to_string(),
                        ));
                    }
                    Some(Inbound::Cancel) => {
                        pending = None;
                    }
                    Some(other) => deferred.push_back(other),
                },
            }
        }
    }

    fn selected_root(&self) -> Result<DesignNode> {
        let root = self
            .host
            .selection()
            .ok_or_else(|| CuiError::precondition("Select a root frame to generate from"))?;
        if !root.node_type.is_container() {
            return Err(CuiError::precondition(format!(
                "Selection {} is a {}, not a frame",
                root.name, root.node_type
            )));
        }
        if !root.has_area() {
            return Err(CuiError::precondition(format!(
                "Frame {} has zero size",
                root.name
            )));
        }
        if !root.is_rendered() {
            return Err(CuiError::precondition(format!(
                "Frame {} is hidden",
                root.name
            )));
        }
        Ok(root)
    }

    fn log_type_counts(&self, root: &DesignNode) {
        fn count(node: &DesignNode, counts: &mut BTreeMap<String, usize>) {
            if !node.is_rendered() {
                return;
            }
            *counts.entry(node.node_type.to_string()).or_default() += 1;
            node.children.iter().for_each(|c| count(c, counts));
        }
        let mut counts = BTreeMap::new();
        count(root, &mut counts);
        let total: usize = counts.values().sum();
        self.emit(Outbound::log(format!("Found {total} visible nodes")));
        for (kind, n) in counts {
            self.emit(Outbound::log(format!("  {kind}: {n}")));
        }
    }

    fn fail(&self, err: &CuiError) {
        warn!(error = %err, "command failed");
        self.emit(Outbound::error(err));
    }

    fn emit(&self, event: Outbound) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FlatRasterizer, MemoryScene};
    use crate::types::NodeType;
    use serde_json::json;

    fn session(
        scene: MemoryScene,
    ) -> (
        PluginSession<MemoryScene, FlatRasterizer>,
        mpsc::UnboundedReceiver<Outbound>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PluginSession::new(scene, FlatRasterizer, SessionSettings::default(), tx),
            rx,
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn init_reports_saved_token() {
        let (mut s, mut rx) = session(MemoryScene::new());
        s.dispatch(Inbound::SaveToken {
            api_token: "  secret ".to_string(),
        })
        .await
        .expect("save");
        s.dispatch(Inbound::RequestInit).await.expect("init");

        let events = drain(&mut rx);
        assert_eq!(events[0], Outbound::TokenSaved { length: 6 });
        assert_eq!(
            events[1],
            Outbound::Init {
                token: "secret".to_string()
            }
        );
    }

    #[tokio::test]
    async fn generate_without_selection_reports_error() {
        let (mut s, mut rx) = session(MemoryScene::new());
        let (tx, inbound) = mpsc::unbounded_channel();
        tx.send(Inbound::GenerateCode {
            api_token: None,
            asset_mode: None,
        })
        .expect("send");
        drop(tx);
        s.run(inbound).await;

        let events = drain(&mut rx);
        assert!(matches!(
            events.as_slice(),
            [Outbound::Error { message, .. }] if message.contains("Select a root frame")
        ));
    }

    #[tokio::test]
    async fn generate_without_images_skips_upload() {
        let root = DesignNode::new("1", "Menu", NodeType::Frame).with_bounds(0.0, 0.0, 200.0, 100.0);
        let (scene, _) = MemoryScene::from_snapshot(&root);
        let (mut s, mut rx) = session(scene);
        let (tx, inbound) = mpsc::unbounded_channel();
        tx.send(Inbound::GenerateCode {
            api_token: None,
            asset_mode: None,
        })
        .expect("send");
        drop(tx);
        s.run(inbound).await;

        let events = drain(&mut rx);
        assert!(!events.iter().any(|e| matches!(e, Outbound::UploadImages { .. })));
        let generated = events
            .iter()
            .find_map(|e| match e {
                Outbound::CodeGenerated {
                    frame_name,
                    element_count,
                    plugin_file,
                    ..
                } => Some((frame_name.clone(), *element_count, plugin_file.clone())),
                _ => None,
            })
            .expect("code-generated event");
        assert_eq!(generated, ("Menu".to_string(), 1, "MenuUI.cs".to_string()));
    }

    #[tokio::test]
    async fn load_json_data_appends_tree_to_page() {
        let (mut s, mut rx) = session(MemoryScene::new());
        s.dispatch(Inbound::LoadJsonData {
            data: json!({"type": "FRAME", "name": "Doc", "children": [{"type": "CIRCLE", "name": "X"}]}),
        })
        .await
        .expect("load");

        assert_eq!(s.host().page_nodes().len(), 1);
        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(Outbound::TreeLoaded { name, node_count: 2, skipped: 0, .. }) if name == "Doc"
        ));
    }

    #[tokio::test]
    async fn upload_complete_without_pass_is_logged() {
        let (mut s, mut rx) = session(MemoryScene::new());
        s.dispatch(Inbound::UploadComplete {
            pass_id: Some(9),
            results: UrlMap::new(),
        })
        .await
        .expect("dispatch");
        assert!(matches!(drain(&mut rx).as_slice(), [Outbound::Log { .. }]));
    }

    fn logo_frame() -> MemoryScene {
        let root = DesignNode::new("1", "Shop", NodeType::Frame)
            .with_bounds(0.0, 0.0, 200.0, 100.0)
            .with_child(
                DesignNode::new("2", "Logo", NodeType::Rectangle)
                    .with_bounds(10.0, 10.0, 40.0, 40.0)
                    .with_fill(crate::types::Paint::image("hash")),
            );
        MemoryScene::from_snapshot(&root).0
    }

    async fn generate_once(
        mut s: PluginSession<MemoryScene, FlatRasterizer>,
        rx: &mut mpsc::UnboundedReceiver<Outbound>,
        asset_mode: Option<AssetMode>,
    ) -> (Vec<Outbound>, PluginSession<MemoryScene, FlatRasterizer>) {
        let (tx, inbound) = mpsc::unbounded_channel();
        tx.send(Inbound::GenerateCode {
            api_token: None,
            asset_mode,
        })
        .expect("send");
        drop(tx);
        s.run(inbound).await;
        (drain(rx), s)
    }

    #[tokio::test]
    async fn missing_token_skips_upload_but_still_generates() {
        let (s, mut rx) = session(logo_frame());
        let (events, _) = generate_once(s, &mut rx, None).await;

        assert!(!events.iter().any(|e| matches!(e, Outbound::UploadImages { .. })));
        assert!(events.iter().any(|e| matches!(e, Outbound::CacheImages { images } if images.len() == 1)));
        assert!(events.iter().any(|e| matches!(
            e,
            Outbound::Log { message } if message.contains("No API token")
        )));
        assert!(matches!(
            events.last(),
            Some(Outbound::CodeGenerated { files, plugin, .. })
                if files == &vec!["Logo.png".to_string()] && plugin.contains("Url = \"\"")
        ));
    }

    #[tokio::test]
    async fn data_mode_skips_upload_and_keys_images_by_file_name() {
        let (s, mut rx) = session(logo_frame());
        let s = s.with_token(Some("secret".to_string()));
        let (events, s) = generate_once(s, &mut rx, Some(AssetMode::Data)).await;

        assert_eq!(s.asset_mode(), AssetMode::Data);
        assert!(!events.iter().any(|e| matches!(e, Outbound::UploadImages { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            Outbound::Log { message } if message == "Asset mode: data"
        )));
        match events.last() {
            Some(Outbound::CodeGenerated { plugin, files, .. }) => {
                assert_eq!(files, &vec!["Logo.png".to_string()]);
                assert!(plugin.contains("Png = assets?.Get(\"Logo\")"));
                assert!(plugin.contains("new string[] { \"Logo\" }"));
            }
            other => panic!("expected code-generated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn asset_mode_persists_across_passes() {
        let (s, mut rx) = session(logo_frame());
        let (_, s) = generate_once(s, &mut rx, Some(AssetMode::Data)).await;
        let (events, s) = generate_once(s, &mut rx, None).await;

        assert_eq!(s.asset_mode(), AssetMode::Data);
        assert!(matches!(
            events.last(),
            Some(Outbound::CodeGenerated { plugin, .. }) if plugin.contains("UIAssetsLoader")
        ));
    }
}

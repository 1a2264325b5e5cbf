use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::host::{HostError, HostResult, SceneHost};
use crate::types::FontName;

/// Style loaded when a requested face is unavailable.
pub const FALLBACK_STYLE: &str = "Regular";

/// The regular weight of `default`'s family.
pub fn fallback_face(default: &FontName) -> FontName {
    FontName::new(default.family.clone(), FALLBACK_STYLE)
}

/// Remembers which font faces the host has already loaded (or refused).
///
/// One cache lives for a whole session, so each face is loaded at most once.
#[derive(Debug, Default)]
pub struct FontCache {
    loaded: HashSet<FontName>,
    failed: HashMap<FontName, HostError>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, font: &FontName) -> bool {
        self.loaded.contains(font)
    }

    pub async fn ensure<H: SceneHost>(&mut self, host: &mut H, font: &FontName) -> HostResult<()> {
        if self.loaded.contains(font) {
            return Ok(());
        }
        if let Some(err) = self.failed.get(font) {
            return Err(err.clone());
        }

        match host.load_font(font).await {
            Ok(()) => {
                debug!(%font, "font loaded");
                self.loaded.insert(font.clone());
                Ok(())
            }
            Err(err) => {
                warn!(%font, error = %err, "font load failed");
                self.failed.insert(font.clone(), err.clone());
                Err(err)
            }
        }
    }

    /// Load `requested`, falling back to the regular face of `default`'s
    /// family. Returns the face in use.
    pub async fn resolve<H: SceneHost>(
        &mut self,
        host: &mut H,
        requested: &FontName,
        default: &FontName,
    ) -> HostResult<FontName> {
        let fallback = fallback_face(default);
        match self.ensure(host, requested).await {
            Ok(()) => Ok(requested.clone()),
            Err(_) if *requested != fallback => {
                self.ensure(host, &fallback).await?;
                Ok(fallback)
            }
            Err(err) => Err(err),
        }
    }
}

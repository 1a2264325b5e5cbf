//! Configuration file.
//!
//! Loaded from `--config`, else `$XDG_CONFIG_HOME/figcui/config.toml` or
//! `~/.config/figcui/config.toml`, else built-in defaults. Every field is
//! optional in the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::AssetMode;
use crate::types::FontName;

pub const FIGMA_API_BASE: &str = "https://api.figma.com/v1";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raster scale for image exports.
    pub export_scale: f64,
    /// Author written into the generated plugin's `[Info]` attribute.
    pub author: String,
    /// Face used when a text node names none, or its own fails to load.
    pub default_font: FontName,
    /// `urls` uploads raster images; `data` expects them in the plugin's data directory.
    pub asset_mode: AssetMode,
    pub upload: UploadConfig,
    pub figma: FigmaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_scale: 2.0,
            author: "figcui".to_string(),
            default_font: FontName::default(),
            asset_mode: AssetMode::default(),
            upload: UploadConfig::default(),
            figma: FigmaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Upload API endpoint; images are written locally when unset.
    pub endpoint: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Images per upload request.
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_secs(30),
            chunk_size: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigmaConfig {
    pub base_url: String,
}

impl Default for FigmaConfig {
    fn default() -> Self {
        Self {
            base_url: FIGMA_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Read `path`, or the central config when `path` is `None`.
    ///
    /// A missing central file means defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::central_config_path().filter(|p| p.is_file()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigLoadError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigLoadError::Parse { path, source })
    }

    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("figcui").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.export_scale.is_finite() && self.export_scale > 0.0) {
            return Err(format!(
                "export_scale must be a positive number, got {}",
                self.export_scale
            ));
        }
        if self.export_scale > 4.0 {
            return Err(format!(
                "export_scale must be at most 4, got {}",
                self.export_scale
            ));
        }
        if self.default_font.family.trim().is_empty() || self.default_font.style.trim().is_empty() {
            return Err("default_font needs both family and style".to_string());
        }
        if self.upload.chunk_size == 0 {
            return Err("upload.chunk_size must be at least 1".to_string());
        }
        if let Some(endpoint) = &self.upload.endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| format!("upload.endpoint is not a valid URL: {e}"))?;
        }
        Ok(())
    }
}

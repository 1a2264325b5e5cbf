use std::path::Path;

use figcui_lib::{AssetMode, Config, CuiError, SessionSettings};

pub const API_TOKEN_ENV: &str = "FIGCUI_API_TOKEN";

/// CLI flags that override config values when present.
#[derive(Debug, Default, Clone)]
pub struct GenerateOverrides {
    pub endpoint: Option<String>,
    pub scale: Option<f64>,
    pub author: Option<String>,
    pub asset_mode: Option<AssetMode>,
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/figcui/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, CuiError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        CuiError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    validated(cfg, path)
}

/// Apply CLI overrides on top of `config` and validate the result.
pub fn apply_overrides(
    mut config: Config,
    overrides: GenerateOverrides,
    path: Option<&Path>,
) -> Result<Config, CuiError> {
    if let Some(endpoint) = overrides.endpoint {
        config.upload.endpoint = Some(endpoint);
    }
    if let Some(scale) = overrides.scale {
        config.export_scale = scale;
    }
    if let Some(author) = overrides.author {
        config.author = author;
    }
    if let Some(mode) = overrides.asset_mode {
        config.asset_mode = mode;
    }
    validated(config, path)
}

fn validated(cfg: Config, path: Option<&Path>) -> Result<Config, CuiError> {
    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        CuiError::Config(prefix)
    })?;
    Ok(cfg)
}

/// The flag wins over the environment; blank values count as unset.
pub fn resolve_api_token(flag: Option<String>) -> Option<String> {
    let clean = |t: String| Some(t.trim().to_string()).filter(|t| !t.is_empty());
    flag.and_then(clean)
        .or_else(|| std::env::var(API_TOKEN_ENV).ok().and_then(clean))
}

/// Log effective config to stderr (verbose mode).
pub fn log_effective_config(config_path: Option<&Path>, config: &Config) {
    let config_source = config_path
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "defaults/built-in".to_string());
    let settings = SessionSettings::from(config);
    eprintln!(
        "Config: source={} | scale={} | author={} | font={} | assets={} | upload={} (timeout {}s, chunks of {})",
        config_source,
        settings.export_scale,
        settings.author,
        settings.default_font,
        settings.asset_mode,
        config.upload.endpoint.as_deref().unwrap_or("local directory"),
        config.upload.timeout.as_secs(),
        config.upload.chunk_size,
    );
}

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Where a design tree comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A JSON node snapshot on disk.
    Snapshot(PathBuf),
    Figma(FigmaInfo),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigmaInfo {
    pub file_key: String,
    pub node_id: String,
}

#[derive(Debug, Error)]
pub enum ResourceParseError {
    #[error("Invalid URL '{value}': {message}. Hint: include http(s):// and ensure the URL is well-formed.")]
    InvalidUrl { value: String, message: String },
    #[error("Not a Figma URL: '{url}'. Hint: use https://www.figma.com/design/<FILE_KEY>/...?node-id=1-2")]
    NotFigma { url: String },
    #[error("Figma URL missing file key in '{url}'. Hint: use https://www.figma.com/file/<FILE_KEY>/... and node-id if needed.")]
    FigmaMissingFileKey { url: String },
    #[error("Figma URL missing node-id in '{url}'. Hint: select the root frame and copy its link.")]
    FigmaMissingNodeId { url: String },
    #[error("Local file not found: {path}. Hint: check the path relative to the current working directory or use an absolute path.")]
    FileNotFound { path: String },
    #[error("Unsupported file extension '{extension}'. Expected a .json node snapshot.")]
    UnsupportedExtension { extension: String },
}

pub fn parse_input(value: &str) -> Result<InputSource, ResourceParseError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        parse_figma_url(value).map(InputSource::Figma)
    } else {
        parse_local_json(value).map(InputSource::Snapshot)
    }
}

pub fn parse_figma_url(value: &str) -> Result<FigmaInfo, ResourceParseError> {
    let url = Url::parse(value).map_err(|e| ResourceParseError::InvalidUrl {
        value: value.to_string(),
        message: e.to_string(),
    })?;

    if !url.host_str().unwrap_or("").contains("figma.com") {
        return Err(ResourceParseError::NotFigma {
            url: value.to_string(),
        });
    }

    let path_segments: Vec<&str> = url.path_segments().map(|c| c.collect()).unwrap_or_default();

    let file_key = path_segments
        .iter()
        .position(|&s| s == "file" || s == "design")
        .and_then(|i| path_segments.get(i + 1))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| ResourceParseError::FigmaMissingFileKey {
            url: value.to_string(),
        })?;

    let node_id = url
        .query_pairs()
        .find(|(k, _)| k == "node-id")
        .map(|(_, v)| v.replace('-', ":"))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ResourceParseError::FigmaMissingNodeId {
            url: value.to_string(),
        })?;

    Ok(FigmaInfo { file_key, node_id })
}

/// A path to an existing `.json` file.
pub fn parse_local_json(value: &str) -> Result<PathBuf, ResourceParseError> {
    let path = Path::new(value);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension != "json" {
        return Err(ResourceParseError::UnsupportedExtension {
            extension: if extension.is_empty() {
                "no extension".to_string()
            } else {
                extension
            },
        });
    }

    let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Err(ResourceParseError::FileNotFound {
            path: path.to_string_lossy().into_owned(),
        });
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_parse_figma_url() {
        let url = "https://www.figma.com/file/ABC123/My-Design?node-id=12-34";
        let res = parse_input(url).unwrap();
        assert_eq!(
            res,
            InputSource::Figma(FigmaInfo {
                file_key: "ABC123".to_string(),
                node_id: "12:34".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_figma_design_url() {
        let url = "https://www.figma.com/design/XYZ789/Another-Design?node-id=5-10";
        let info = parse_figma_url(url).unwrap();
        assert_eq!(info.file_key, "XYZ789");
        assert_eq!(info.node_id, "5:10");
    }

    #[test]
    fn test_figma_url_requires_node_id() {
        let url = "https://www.figma.com/file/ABC123/My-Design";
        assert!(matches!(
            parse_input(url),
            Err(ResourceParseError::FigmaMissingNodeId { .. })
        ));
    }

    #[test]
    fn test_non_figma_url_is_rejected() {
        assert!(matches!(
            parse_input("https://example.com/page"),
            Err(ResourceParseError::NotFigma { .. })
        ));
    }

    #[test]
    fn test_parse_local_json() {
        let file = Builder::new().suffix(".json").tempfile().expect("temp file");
        let res = parse_input(file.path().to_str().unwrap()).unwrap();
        assert_eq!(res, InputSource::Snapshot(file.path().to_path_buf()));
    }

    #[test]
    fn test_parse_unsupported_extension() {
        let file = Builder::new().suffix(".png").tempfile().expect("temp file");
        let res = parse_input(file.path().to_str().unwrap());
        assert!(matches!(
            res,
            Err(ResourceParseError::UnsupportedExtension { extension }) if extension == "png"
        ));
    }

    #[test]
    fn test_missing_local_json_errors() {
        let res = parse_input("/tmp/does-not-exist-figcui.json");
        assert!(matches!(res, Err(ResourceParseError::FileNotFound { .. })));
    }
}

//! Reading and writing calibration/correlation documents.
//!
//! JSON unless the path ends in `.toml`.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use riskfuse_core::errors::LoadError;

/// On-disk encoding of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Read and deserialize a document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::FileNotFound {
            path: display.clone(),
        },
        _ => LoadError::Io {
            path: display.clone(),
            message: e.to_string(),
        },
    })?;
    parse_document(&content, DocumentFormat::from_path(path), &display)
}

/// Deserialize a document already in memory. `origin` is used in errors.
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<T, LoadError> {
    let parsed = match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| LoadError::ParseError {
        path: origin.to_string(),
        message,
    })
}

/// Serialize and write a document, replacing any existing file.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), LoadError> {
    let display = path.display().to_string();
    let encoded = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
    }
    .map_err(|message| LoadError::WriteFailed {
        path: display.clone(),
        message,
    })?;

    std::fs::write(path, encoded + "\n").map_err(|e| LoadError::WriteFailed {
        path: display,
        message: e.to_string(),
    })
}

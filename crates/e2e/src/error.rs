//! Error types for the smoke test

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Browser bridge error: {0}")]
    Bridge(String),

    #[error("Browser bridge exited before replying")]
    BridgeClosed,

    #[error("Timeout after {timeout_ms} ms waiting for '{op}'")]
    CommandTimeout { op: &'static str, timeout_ms: u64 },

    #[error("Browser command '{op}' failed: {message}")]
    Browser { op: &'static str, message: String },

    #[error("Failed to load {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("Page path cannot be turned into a file URL: {}", .0.display())]
    InvalidPage(PathBuf),

    #[error("Checklist parse error: {0}")]
    ChecklistParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SmokeResult<T> = Result<T, SmokeError>;

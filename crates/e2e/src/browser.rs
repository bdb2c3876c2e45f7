//! The browser page seen by the driver

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::checklist::Viewport;
use crate::error::SmokeResult;

/// Where a captured error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// `console.error` output
    Console,
    /// An uncaught exception in the page
    Page,
}

/// A runtime error observed while the page was open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    pub kind: ErrorKind,
    pub text: String,
}

impl CapturedError {
    pub fn console(text: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Console,
            text: text.into(),
        }
    }

    pub fn page(text: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Page,
            text: text.into(),
        }
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Console => write!(f, "Console Error: {}", self.text),
            ErrorKind::Page => write!(f, "Page Error: {}", self.text),
        }
    }
}

/// One open page in a headless browser
///
/// Selector queries never fail for a missing element; they report zero or
/// `None` instead. Errors are reserved for the browser itself misbehaving.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate and wait until network activity settles
    async fn goto(&mut self, url: &str) -> SmokeResult<()>;

    async fn title(&mut self) -> SmokeResult<String>;

    /// Number of elements matching `selector`
    async fn count(&mut self, selector: &str) -> SmokeResult<usize>;

    async fn set_viewport(&mut self, viewport: Viewport) -> SmokeResult<()>;

    /// Click the first element matching `selector`
    async fn click(&mut self, selector: &str) -> SmokeResult<()>;

    /// Viewport-relative top of the first match, or `None` if nothing matches
    async fn bounding_top(&mut self, selector: &str) -> SmokeResult<Option<f64>>;

    /// Round-trip to the browser so errors raised so far are collected
    async fn ping(&mut self) -> SmokeResult<()>;

    /// Errors collected since the last call
    fn take_errors(&mut self) -> Vec<CapturedError>;

    /// Release the browser; later calls do nothing
    async fn close(&mut self) -> SmokeResult<()>;
}

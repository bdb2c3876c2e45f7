//! Declarative smoke-test checklist
//!
//! The default checklist is embedded from `checklist.yaml`; a different file
//! can be supplied on the command line.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SmokeError, SmokeResult};

const BUILTIN: &str = include_str!("checklist.yaml");

/// Ordered list of sections to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub sections: Vec<Section>,
}

impl Checklist {
    /// The built-in fourteen-section checklist
    pub fn builtin() -> SmokeResult<Self> {
        Self::from_yaml(BUILTIN)
    }

    /// Parse a checklist from YAML
    pub fn from_yaml(yaml: &str) -> SmokeResult<Self> {
        let checklist: Checklist = serde_yaml::from_str(yaml)?;
        checklist.validate()?;
        Ok(checklist)
    }

    /// Load a checklist from a file
    pub fn from_file(path: &Path) -> SmokeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> SmokeResult<()> {
        if self.sections.is_empty() {
            return Err(SmokeError::ChecklistParse("checklist has no sections".to_string()));
        }
        for section in &self.sections {
            if section.name.trim().is_empty() {
                return Err(SmokeError::ChecklistParse("section without a name".to_string()));
            }
            if let Check::Structure { expectations } = &section.check {
                if expectations.is_empty() {
                    return Err(SmokeError::ChecklistParse(format!(
                        "structure section '{}' has no expectations",
                        section.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A named checklist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,

    #[serde(flatten)]
    pub check: Check,
}

/// What a section does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Navigate to the page; failure ends the run
    Load,

    /// The document title is not empty
    Title,

    /// Elements exist or reach a count
    Structure { expectations: Vec<Expectation> },

    /// At a mobile viewport, the toggle opens and then closes the menu
    MobileMenu {
        toggle: String,
        active: String,
        #[serde(default = "Viewport::mobile")]
        viewport: Viewport,
        #[serde(default = "Viewport::desktop")]
        restore: Viewport,
    },

    /// Clicking a filter button makes it active
    Filter { button: String, active: String },

    /// Clicking an anchor brings the target near the top of the viewport
    SmoothScroll {
        link: String,
        target: String,
        #[serde(default = "default_max_top")]
        max_top: f64,
    },

    /// No console or page errors were captured
    ConsoleErrors,

    /// Every earlier section passed
    Summary,
}

impl Check {
    pub fn kind(&self) -> &'static str {
        match self {
            Check::Load => "load",
            Check::Title => "title",
            Check::Structure { .. } => "structure",
            Check::MobileMenu { .. } => "mobile_menu",
            Check::Filter { .. } => "filter",
            Check::SmoothScroll { .. } => "smooth_scroll",
            Check::ConsoleErrors => "console_errors",
            Check::Summary => "summary",
        }
    }
}

fn default_max_top() -> f64 {
    100.0
}

/// A structural assertion inside a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expect", rename_all = "snake_case")]
pub enum Expectation {
    /// At least one element matches
    Exists { label: String, selector: String },

    /// At least `min` elements match; the count is reported
    Count {
        label: String,
        selector: String,
        #[serde(default = "default_min")]
        min: usize,
    },
}

impl Expectation {
    pub fn label(&self) -> &str {
        match self {
            Expectation::Exists { label, .. } | Expectation::Count { label, .. } => label,
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            Expectation::Exists { selector, .. } | Expectation::Count { selector, .. } => selector,
        }
    }

    /// Whether `count` matches satisfy the expectation
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Expectation::Exists { .. } => count > 0,
            Expectation::Count { min, .. } => count >= *min,
        }
    }
}

fn default_min() -> usize {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn mobile() -> Self {
        Self { width: 375, height: 667 }
    }

    pub fn desktop() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

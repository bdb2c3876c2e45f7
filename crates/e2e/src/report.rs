//! Smoke-test results and their rendering

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};

use crate::browser::CapturedError;
use crate::error::SmokeResult;

/// Result of one structural expectation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationOutcome {
    pub label: String,
    pub selector: String,
    pub count: usize,
    pub passed: bool,

    /// Show the match count rather than a tick
    pub counted: bool,
}

/// Result of one checklist section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutcome {
    pub name: String,
    pub kind: String,
    pub passed: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expectations: Vec<ExpectationOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SectionOutcome {
    pub fn new(name: impl Into<String>, kind: &str, passed: bool) -> Self {
        Self {
            name: name.into(),
            kind: kind.to_string(),
            passed,
            expectations: Vec::new(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn details(&self) -> String {
        let mut parts: Vec<String> = self
            .expectations
            .iter()
            .map(|p| {
                if p.counted {
                    format!("{}: {}", p.label, p.count)
                } else {
                    format!("{}: {}", p.label, if p.passed { "yes" } else { "missing" })
                }
            })
            .collect();
        if let Some(note) = &self.note {
            parts.push(note.clone());
        }
        parts.join(", ")
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeReport {
    pub page_url: String,
    pub title: Option<String>,
    pub sections: Vec<SectionOutcome>,
    pub errors: Vec<CapturedError>,

    /// Set when the run was cut short by a load failure or a browser error
    pub fatal: Option<String>,

    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl SmokeReport {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            title: None,
            sections: Vec::new(),
            errors: Vec::new(),
            fatal: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn passed_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.passed).count()
    }

    /// Section failures are warnings; only a fatal error or a captured
    /// runtime error fails the run
    pub fn success(&self) -> bool {
        self.fatal.is_none() && self.errors.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        if self.success() {
            0
        } else {
            1
        }
    }

    /// Human-readable report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", "Smoke test:".bold(), self.page_url);
        let _ = writeln!(out);

        for section in &self.sections {
            let mark = if section.passed { "✓".green() } else { "✗".red() };
            let _ = writeln!(out, "{} {}", mark, section.name.bold());
            for expectation in &section.expectations {
                let value = if expectation.counted {
                    let count = expectation.count.to_string();
                    if expectation.passed { count.normal() } else { count.yellow() }
                } else if expectation.passed {
                    "✓".green()
                } else {
                    "✗".red()
                };
                let _ = writeln!(out, "    - {}: {}", expectation.label, value);
            }
            if let Some(note) = &section.note {
                let _ = writeln!(out, "    {}", note.dimmed());
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{} {} runtime error(s):", "!".yellow(), self.errors.len());
            for (i, err) in self.errors.iter().enumerate() {
                let _ = writeln!(out, "    {}. {}", i + 1, err);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.summary_table());

        let verdict = match (&self.fatal, self.errors.len()) {
            (Some(fatal), _) => format!("{} {}", "✗ Aborted:".red().bold(), fatal),
            (None, 0) => format!(
                "{} {}/{} sections passed, no runtime errors ({} ms)",
                "✓ Ready".green().bold(),
                self.passed_sections(),
                self.sections.len(),
                self.duration_ms
            ),
            (None, n) => format!(
                "{} {} runtime error(s) need fixing ({} ms)",
                "✗ Failed".red().bold(),
                n,
                self.duration_ms
            ),
        };
        let _ = writeln!(out, "{verdict}");
        out
    }

    fn summary_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Section", "Result", "Details"]);

        for (i, section) in self.sections.iter().enumerate() {
            let result = if section.passed {
                Cell::new("pass").fg(Color::Green)
            } else {
                Cell::new("fail").fg(Color::Red)
            };
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&section.name),
                result,
                Cell::new(section.details()),
            ]);
        }
        table
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> SmokeResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SmokeReport {
        let mut report = SmokeReport::new("file:///site/index.html");
        report.sections.push(SectionOutcome::new("Page load", "load", true));
        report.sections.push(SectionOutcome {
            name: "Navigation".to_string(),
            kind: "structure".to_string(),
            passed: false,
            expectations: vec![
                ExpectationOutcome {
                    label: "Navbar".to_string(),
                    selector: ".navbar".to_string(),
                    count: 1,
                    passed: true,
                    counted: false,
                },
                ExpectationOutcome {
                    label: "Nav links".to_string(),
                    selector: ".nav-link".to_string(),
                    count: 0,
                    passed: false,
                    counted: true,
                },
            ],
            note: None,
        });
        report
    }

    #[test]
    fn test_missing_elements_do_not_fail_the_run() {
        let report = sample();
        assert_eq!(report.passed_sections(), 1);
        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_runtime_errors_and_fatal_fail_the_run() {
        let mut report = sample();
        report.errors.push(CapturedError::page("boom"));
        assert_eq!(report.exit_code(), 1);

        let mut report = sample();
        report.fatal = Some("Failed to load".to_string());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_render_lists_sections_and_errors() {
        colored::control::set_override(false);
        let mut report = sample();
        report.errors.push(CapturedError::console("404"));
        let text = report.render();
        assert!(text.contains("✓ Page load"));
        assert!(text.contains("✗ Navigation"));
        assert!(text.contains("- Nav links: 0"));
        assert!(text.contains("1. Console Error: 404"));
        assert!(text.contains("Failed 1 runtime error(s)"));
    }

    #[test]
    fn test_section_details() {
        let report = sample();
        assert_eq!(report.sections[1].details(), "Navbar: yes, Nav links: 0");
        let note = SectionOutcome::new("Title", "title", true).with_note("Title: Portfolio");
        assert_eq!(note.details(), "Title: Portfolio");
    }

    #[test]
    fn test_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample().write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["sections"].as_array().unwrap().len(), 2);
        assert_eq!(value["sections"][1]["expectations"][1]["count"], 0);
        assert!(value["fatal"].is_null());
    }
}

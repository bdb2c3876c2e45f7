//! Runs a checklist against one browser page
//!
//! Sections run strictly in order. A missing element fails only its own
//! section; a load failure or a browser command error stops the run. The
//! page is closed in every case.

use std::path::Path;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::BrowserPage;
use crate::checklist::{Check, Checklist, Expectation, Section};
use crate::error::{SmokeError, SmokeResult};
use crate::report::{ExpectationOutcome, SectionOutcome, SmokeReport};

/// How long to poll for a condition after an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            interval: Duration::from_millis(50),
        }
    }
}

/// A page state the driver can wait for
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<'a> {
    CountAtLeast(&'a str, usize),
    CountIs(&'a str, usize),
    BoundingTopAtMost(&'a str, f64),
}

impl Condition<'_> {
    async fn holds<P: BrowserPage + ?Sized>(&self, page: &mut P) -> SmokeResult<bool> {
        Ok(match *self {
            Condition::CountAtLeast(selector, n) => page.count(selector).await? >= n,
            Condition::CountIs(selector, n) => page.count(selector).await? == n,
            Condition::BoundingTopAtMost(selector, max) => {
                matches!(page.bounding_top(selector).await?, Some(top) if top <= max)
            }
        })
    }
}

/// Poll until `condition` holds or the policy's timeout passes
///
/// The condition is always checked at least once. A timeout is `Ok(false)`.
pub async fn wait_for<P: BrowserPage + ?Sized>(
    page: &mut P,
    condition: &Condition<'_>,
    policy: WaitPolicy,
) -> SmokeResult<bool> {
    let deadline = Instant::now() + policy.timeout;
    loop {
        if condition.holds(page).await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            debug!("Gave up waiting for {:?}", condition);
            return Ok(false);
        }
        sleep(policy.interval).await;
    }
}

/// `file://` URL for a page path relative to the working directory
pub fn page_url(path: &Path) -> SmokeResult<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| SmokeError::InvalidPage(absolute))
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub page_url: String,
    pub wait: WaitPolicy,
}

impl DriverConfig {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            wait: WaitPolicy::default(),
        }
    }
}

/// A checklist bound to a page URL
pub struct SmokeTest {
    checklist: Checklist,
    config: DriverConfig,
}

impl SmokeTest {
    pub fn new(checklist: Checklist, config: DriverConfig) -> Self {
        Self { checklist, config }
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    /// Run every section against `page`, then close it
    pub async fn run<P: BrowserPage + ?Sized>(&self, page: &mut P) -> SmokeReport {
        let started = std::time::Instant::now();
        let mut report = SmokeReport::new(&self.config.page_url);
        info!("Running {} section(s) against {}", self.checklist.sections.len(), self.config.page_url);

        for section in &self.checklist.sections {
            debug!("Section '{}' ({})", section.name, section.check.kind());
            let result = self.run_section(page, section, &mut report).await;
            report.errors.extend(page.take_errors());

            match result {
                Ok(outcome) => {
                    if outcome.passed {
                        info!("✓ {}", outcome.name);
                    } else {
                        warn!("✗ {}", outcome.name);
                    }
                    report.sections.push(outcome);
                }
                Err(e) => {
                    error!("{} aborted the run: {}", section.name, e);
                    report
                        .sections
                        .push(SectionOutcome::new(&section.name, section.check.kind(), false).with_note(e.to_string()));
                    report.fatal = Some(e.to_string());
                    break;
                }
            }
        }

        if let Err(e) = page.close().await {
            warn!("Failed to close the browser: {}", e);
        }
        report.errors.extend(page.take_errors());
        report.duration_ms = started.elapsed().as_millis() as u64;
        report
    }

    async fn run_section<P: BrowserPage + ?Sized>(
        &self,
        page: &mut P,
        section: &Section,
        report: &mut SmokeReport,
    ) -> SmokeResult<SectionOutcome> {
        let name = section.name.as_str();
        let kind = section.check.kind();

        match &section.check {
            Check::Load => {
                page.goto(&self.config.page_url).await?;
                Ok(SectionOutcome::new(name, kind, true))
            }

            Check::Title => {
                let title = page.title().await?;
                let outcome = SectionOutcome::new(name, kind, !title.trim().is_empty())
                    .with_note(format!("Title: {title}"));
                report.title = Some(title);
                Ok(outcome)
            }

            Check::Structure { expectations } => {
                let mut outcome = SectionOutcome::new(name, kind, true);
                for expectation in expectations {
                    let count = page.count(expectation.selector()).await?;
                    let passed = expectation.accepts(count);
                    outcome.passed &= passed;
                    outcome.expectations.push(ExpectationOutcome {
                        label: expectation.label().to_string(),
                        selector: expectation.selector().to_string(),
                        count,
                        passed,
                        counted: matches!(expectation, Expectation::Count { .. }),
                    });
                }
                Ok(outcome)
            }

            Check::MobileMenu {
                toggle,
                active,
                viewport,
                restore,
            } => {
                page.set_viewport(*viewport).await?;
                let toggled = self.toggle_menu(page, toggle, active).await;
                let restored = page.set_viewport(*restore).await;

                // A toggle failure outranks a failed restore
                let (passed, note) = toggled?;
                restored?;
                Ok(SectionOutcome::new(name, kind, passed).with_note(note))
            }

            Check::Filter { button, active } => {
                if page.count(button).await? == 0 {
                    return Ok(SectionOutcome::new(name, kind, false).with_note(format!("{button} not found")));
                }
                page.click(button).await?;
                let passed = wait_for(page, &Condition::CountAtLeast(active, 1), self.config.wait).await?;
                let note = if passed {
                    "filter button became active".to_string()
                } else {
                    format!("{active} never matched")
                };
                Ok(SectionOutcome::new(name, kind, passed).with_note(note))
            }

            Check::SmoothScroll { link, target, max_top } => {
                if page.count(link).await? == 0 {
                    return Ok(SectionOutcome::new(name, kind, false).with_note(format!("{link} not found")));
                }
                page.click(link).await?;
                let passed =
                    wait_for(page, &Condition::BoundingTopAtMost(target, *max_top), self.config.wait).await?;
                let note = match page.bounding_top(target).await? {
                    Some(top) => format!("{target} top at {top:.0}px (limit {max_top:.0}px)"),
                    None => format!("{target} not found"),
                };
                Ok(SectionOutcome::new(name, kind, passed).with_note(note))
            }

            Check::ConsoleErrors => {
                page.ping().await?;
                report.errors.extend(page.take_errors());
                let note = if report.errors.is_empty() {
                    "no console errors".to_string()
                } else {
                    format!("{} error(s) captured", report.errors.len())
                };
                Ok(SectionOutcome::new(name, kind, report.errors.is_empty()).with_note(note))
            }

            Check::Summary => {
                let passed = report.sections.iter().all(|s| s.passed) && report.errors.is_empty();
                let note = format!(
                    "{}/{} sections passed, {} runtime error(s)",
                    report.passed_sections(),
                    report.sections.len(),
                    report.errors.len()
                );
                Ok(SectionOutcome::new(name, kind, passed).with_note(note))
            }
        }
    }

    /// Click the toggle twice: the menu must open, then close again
    async fn toggle_menu<P: BrowserPage + ?Sized>(
        &self,
        page: &mut P,
        toggle: &str,
        active: &str,
    ) -> SmokeResult<(bool, String)> {
        if page.count(toggle).await? == 0 {
            return Ok((false, format!("{toggle} not found")));
        }

        page.click(toggle).await?;
        if !wait_for(page, &Condition::CountAtLeast(active, 1), self.config.wait).await? {
            return Ok((false, "menu did not open".to_string()));
        }

        page.click(toggle).await?;
        if !wait_for(page, &Condition::CountIs(active, 0), self.config.wait).await? {
            return Ok((false, "menu opened but did not close".to_string()));
        }

        Ok((true, "menu opened and closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wait_policy() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(2));
        assert_eq!(policy.interval, Duration::from_millis(50));
    }

    #[test]
    fn test_page_url_is_absolute_file_url() {
        let url = page_url(Path::new("index.html")).unwrap();
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("/index.html"));
    }

    #[cfg(unix)]
    #[test]
    fn test_page_url_escapes_spaces() {
        let url = page_url(Path::new("/srv/my site/index.html")).unwrap();
        assert_eq!(url, "file:///srv/my%20site/index.html");
    }
}

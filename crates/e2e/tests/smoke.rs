//! Driver tests against a scripted page
//!
//! Time is paused, so polling waits finish instantly.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use portfolio_e2e::{
    wait_for, BrowserPage, CapturedError, Checklist, Condition, DriverConfig, SmokeError, SmokeResult, SmokeTest,
    Viewport, WaitPolicy,
};

const TOGGLE: &str = ".nav-toggle";
const MENU_ACTIVE: &str = ".nav-menu.active";
const WEB_FILTER: &str = ".filter-btn[data-filter=\"web\"]";
const WEB_FILTER_ACTIVE: &str = ".filter-btn.active[data-filter=\"web\"]";
const CONTACT_LINK: &str = "a[href=\"#contact\"]";
const CONTACT: &str = "#contact";

/// A page that reacts to clicks the way the portfolio scripts do
struct FakePage {
    elements: HashMap<&'static str, usize>,
    fail_load: bool,
    menu_opens: bool,
    menu_closes: bool,
    menu_open: bool,
    filter_active: bool,
    scrolls: bool,
    contact_top: f64,

    /// Clicking this selector fails as if the browser had crashed
    fail_on: Option<&'static str>,

    /// Going back to the desktop viewport fails
    fail_restore: bool,

    /// Raised by the page on the next round-trip
    pending: Vec<CapturedError>,
    errors: Vec<CapturedError>,
    viewports: Vec<Viewport>,
    closes: usize,
}

impl FakePage {
    fn complete() -> Self {
        let elements = [
            (".navbar", 1),
            (".nav-link", 6),
            (".resume-btn", 1),
            (".hero", 1),
            (".hero-name", 1),
            (".hero-title", 1),
            (".hero-buttons .btn", 2),
            ("#about", 1),
            (".about-card", 3),
            (".stat-card", 4),
            ("#skills", 1),
            (".skill-category", 4),
            (".skill-pill", 24),
            ("#experience", 1),
            (".timeline-item", 3),
            ("#portfolio", 1),
            (".portfolio-item", 6),
            (".filter-btn", 4),
            (CONTACT, 1),
            ("#contact-form", 1),
            (".contact-card", 3),
            (".social-btn", 4),
            (".footer", 1),
            (".footer-links a", 5),
            (TOGGLE, 1),
            (WEB_FILTER, 1),
            (CONTACT_LINK, 2),
        ];
        Self {
            elements: elements.into_iter().collect(),
            fail_load: false,
            menu_opens: true,
            menu_closes: true,
            menu_open: false,
            filter_active: false,
            scrolls: true,
            contact_top: 2100.0,
            fail_on: None,
            fail_restore: false,
            pending: Vec::new(),
            errors: Vec::new(),
            viewports: Vec::new(),
            closes: 0,
        }
    }

    fn without(mut self, selector: &str) -> Self {
        self.elements.remove(selector);
        self
    }

    fn raising(mut self, error: CapturedError) -> Self {
        self.pending.push(error);
        self
    }

    fn round_trip(&mut self) {
        self.errors.append(&mut self.pending);
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&mut self, url: &str) -> SmokeResult<()> {
        if self.fail_load {
            return Err(SmokeError::PageLoad {
                url: url.to_string(),
                reason: "net::ERR_FILE_NOT_FOUND".to_string(),
            });
        }
        Ok(())
    }

    async fn title(&mut self) -> SmokeResult<String> {
        self.round_trip();
        Ok("Portfolio".to_string())
    }

    async fn count(&mut self, selector: &str) -> SmokeResult<usize> {
        Ok(match selector {
            MENU_ACTIVE => usize::from(self.menu_open),
            WEB_FILTER_ACTIVE => usize::from(self.filter_active),
            other => self.elements.get(other).copied().unwrap_or(0),
        })
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> SmokeResult<()> {
        self.viewports.push(viewport);
        if self.fail_restore && viewport == Viewport::desktop() {
            return Err(SmokeError::Browser {
                op: "set_viewport",
                message: "Target closed".to_string(),
            });
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> SmokeResult<()> {
        if self.fail_on == Some(selector) {
            return Err(SmokeError::Browser {
                op: "click",
                message: "Target page, context or browser has been closed".to_string(),
            });
        }
        if !self.elements.contains_key(selector) {
            return Err(SmokeError::Browser {
                op: "click",
                message: format!("waiting for {selector}"),
            });
        }
        match selector {
            TOGGLE if !self.menu_open && self.menu_opens => self.menu_open = true,
            TOGGLE if self.menu_open && self.menu_closes => self.menu_open = false,
            WEB_FILTER => self.filter_active = true,
            CONTACT_LINK if self.scrolls => self.contact_top = 0.0,
            _ => {}
        }
        Ok(())
    }

    async fn bounding_top(&mut self, selector: &str) -> SmokeResult<Option<f64>> {
        Ok(if selector == CONTACT && self.elements.contains_key(CONTACT) {
            Some(self.contact_top)
        } else {
            None
        })
    }

    async fn ping(&mut self) -> SmokeResult<()> {
        self.round_trip();
        Ok(())
    }

    fn take_errors(&mut self) -> Vec<CapturedError> {
        std::mem::take(&mut self.errors)
    }

    async fn close(&mut self) -> SmokeResult<()> {
        self.closes += 1;
        Ok(())
    }
}

fn smoke_test() -> SmokeTest {
    SmokeTest::new(
        Checklist::builtin().unwrap(),
        DriverConfig::new("file:///site/index.html"),
    )
}

#[tokio::test(start_paused = true)]
async fn test_complete_page_passes_every_section() {
    let mut page = FakePage::complete();
    let report = smoke_test().run(&mut page).await;

    assert_eq!(report.sections.len(), 14);
    let failed: Vec<&str> = report.sections.iter().filter(|s| !s.passed).map(|s| s.name.as_str()).collect();
    assert!(failed.is_empty(), "failed sections: {failed:?}");
    assert_eq!(report.title.as_deref(), Some("Portfolio"));
    assert_eq!(report.exit_code(), 0);
    assert_eq!(page.closes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_elements_are_warnings() {
    let mut page = FakePage::complete().without(".resume-btn").without(".skill-pill");
    let report = smoke_test().run(&mut page).await;

    let failed: Vec<&str> = report.sections.iter().filter(|s| !s.passed).map(|s| s.name.as_str()).collect();
    assert_eq!(failed, vec!["Navigation", "Skills"]);
    assert!(report.fatal.is_none());
    assert_eq!(report.exit_code(), 0);

    let skills = &report.sections[5];
    assert_eq!(skills.expectations[2].label, "Skill pills");
    assert_eq!(skills.expectations[2].count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_one_page_error_fails_the_run() {
    let mut page = FakePage::complete().raising(CapturedError::page("portfolioGrid is null"));
    let report = smoke_test().run(&mut page).await;

    assert!(report.sections[..13].iter().all(|s| s.passed));
    assert!(!report.sections[13].passed);
    assert_eq!(report.errors, vec![CapturedError::page("portfolioGrid is null")]);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_menu_toggle_opens_and_closes() {
    let mut page = FakePage::complete();
    let report = smoke_test().run(&mut page).await;

    let menu = &report.sections[10];
    assert!(menu.passed);
    assert_eq!(menu.note.as_deref(), Some("menu opened and closed"));
    assert!(!page.menu_open);
    assert_eq!(page.viewports, vec![Viewport::mobile(), Viewport::desktop()]);
}

#[tokio::test(start_paused = true)]
async fn test_menu_that_never_opens() {
    let mut page = FakePage::complete();
    page.menu_opens = false;
    let report = smoke_test().run(&mut page).await;

    let menu = &report.sections[10];
    assert!(!menu.passed);
    assert_eq!(menu.note.as_deref(), Some("menu did not open"));
    assert_eq!(page.viewports.last(), Some(&Viewport::desktop()));
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_menu_that_never_closes() {
    let mut page = FakePage::complete();
    page.menu_closes = false;
    let report = smoke_test().run(&mut page).await;

    assert_eq!(
        report.sections[10].note.as_deref(),
        Some("menu opened but did not close")
    );
    assert!(!report.sections[10].passed);
}

#[tokio::test(start_paused = true)]
async fn test_missing_toggle_skips_the_clicks() {
    let mut page = FakePage::complete().without(TOGGLE);
    let report = smoke_test().run(&mut page).await;

    assert!(!report.sections[10].passed);
    assert!(report.fatal.is_none());
    assert_eq!(page.viewports, vec![Viewport::mobile(), Viewport::desktop()]);
}

#[tokio::test(start_paused = true)]
async fn test_filter_becomes_active() {
    let mut page = FakePage::complete();
    let report = smoke_test().run(&mut page).await;

    assert!(report.sections[11].passed);
    assert!(page.filter_active);
}

#[tokio::test(start_paused = true)]
async fn test_smooth_scroll_brings_contact_into_view() {
    let mut page = FakePage::complete();
    let report = smoke_test().run(&mut page).await;

    let scroll = &report.sections[12];
    assert!(scroll.passed);
    assert_eq!(scroll.note.as_deref(), Some("#contact top at 0px (limit 100px)"));
}

#[tokio::test(start_paused = true)]
async fn test_scroll_that_does_not_move_fails_the_section() {
    let mut page = FakePage::complete();
    page.scrolls = false;
    let report = smoke_test().run(&mut page).await;

    assert!(!report.sections[12].passed);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_scroll_link_is_not_fatal() {
    let mut page = FakePage::complete().without(CONTACT_LINK);
    let report = smoke_test().run(&mut page).await;

    assert_eq!(report.sections.len(), 14);
    assert!(!report.sections[12].passed);
    assert!(report.fatal.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_is_fatal() {
    let mut page = FakePage::complete();
    page.fail_load = true;
    let report = smoke_test().run(&mut page).await;

    assert_eq!(report.sections.len(), 1);
    assert!(!report.sections[0].passed);
    assert!(report.fatal.as_deref().unwrap_or_default().contains("ERR_FILE_NOT_FOUND"));
    assert_eq!(report.exit_code(), 1);
    assert_eq!(page.closes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_browser_error_mid_run_is_fatal() {
    let mut page = FakePage::complete();
    page.fail_on = Some(TOGGLE);
    let report = smoke_test().run(&mut page).await;

    assert_eq!(report.sections.len(), 11);
    let menu = &report.sections[10];
    assert_eq!(menu.name, "Mobile menu");
    assert!(!menu.passed);
    assert!(report.fatal.as_deref().unwrap_or_default().contains("has been closed"));
    assert!(report.sections[..10].iter().all(|s| s.passed));
    assert!(!page.filter_active);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(page.closes, 1);
    assert_eq!(page.viewports, vec![Viewport::mobile(), Viewport::desktop()]);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_error_outranks_failed_restore() {
    let mut page = FakePage::complete();
    page.fail_on = Some(TOGGLE);
    page.fail_restore = true;
    let report = smoke_test().run(&mut page).await;

    let fatal = report.fatal.as_deref().unwrap_or_default();
    assert!(fatal.contains("'click'"), "unexpected fatal error: {fatal}");
    assert_eq!(page.closes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_restore_alone_is_fatal() {
    let mut page = FakePage::complete();
    page.fail_restore = true;
    let report = smoke_test().run(&mut page).await;

    assert!(report.fatal.as_deref().unwrap_or_default().contains("'set_viewport'"));
    assert_eq!(report.sections.len(), 11);
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_summary_section_reflects_earlier_sections() {
    let yaml = r#"
sections:
  - name: Page load
    kind: load
  - name: Footer
    kind: structure
    expectations:
      - { expect: exists, label: Footer, selector: ".footer" }
      - { expect: count, label: Footer links, selector: ".footer-links a", min: 10 }
  - name: Summary
    kind: summary
"#;
    let test = SmokeTest::new(
        Checklist::from_yaml(yaml).unwrap(),
        DriverConfig::new("file:///site/index.html"),
    );
    let mut page = FakePage::complete();
    let report = test.run(&mut page).await;

    assert!(!report.sections[1].passed);
    assert!(!report.sections[2].passed);
    assert_eq!(
        report.sections[2].note.as_deref(),
        Some("1/2 sections passed, 0 runtime error(s)")
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_gives_up_after_timeout() {
    let mut page = FakePage::complete();
    let policy = WaitPolicy {
        timeout: Duration::from_millis(300),
        interval: Duration::from_millis(50),
    };

    let start = tokio::time::Instant::now();
    let held = wait_for(&mut page, &Condition::CountAtLeast(MENU_ACTIVE, 1), policy)
        .await
        .unwrap();
    assert!(!held);
    assert!(start.elapsed() >= Duration::from_millis(300));

    let held = wait_for(&mut page, &Condition::CountIs(MENU_ACTIVE, 0), policy)
        .await
        .unwrap();
    assert!(held);
}

//! Portfolio smoke test
//!
//! Drives a headless browser against the built portfolio page and checks a
//! declarative list of structural and interactive properties:
//! - Parses the YAML checklist (built in, or supplied on the command line)
//! - Controls Playwright through a line-delimited JSON bridge process
//! - Polls for interaction results instead of sleeping
//! - Collects console and page errors, which decide the exit code
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  portfolio-smoke (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SmokeTest                                                  │
//! │    ├── run(page: &mut impl BrowserPage) -> SmokeReport      │
//! │    ├── wait_for(condition, WaitPolicy) -> bool              │
//! │    └── SmokeReport::exit_code() -> 0 | 1                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Checklist (YAML)                                           │
//! │    └── sections: [Section]                                  │
//! │          ├── load | title | console_errors | summary        │
//! │          ├── structure { expectations: [exists | count] }   │
//! │          ├── mobile_menu { toggle, active }                 │
//! │          ├── filter { button, active }                      │
//! │          └── smooth_scroll { link, target, max_top }        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightSession: BrowserPage                             │
//! │    └── node bridge.cjs  <── {"id","op",..} / {"reply",..}   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod checklist;
pub mod driver;
pub mod error;
pub mod playwright;
pub mod report;

pub use browser::{BrowserPage, CapturedError, ErrorKind};
pub use checklist::{Check, Checklist, Expectation, Section, Viewport};
pub use driver::{page_url, wait_for, Condition, DriverConfig, SmokeTest, WaitPolicy};
pub use error::{SmokeError, SmokeResult};
pub use playwright::{Browser, PlaywrightConfig, PlaywrightSession};
pub use report::{ExpectationOutcome, SectionOutcome, SmokeReport};

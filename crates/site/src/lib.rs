//! Portfolio page behaviour layer
//!
//! Everything the portfolio page does after its markup loads: the mobile
//! menu, offset smooth scrolling, the portfolio filter, the contact form's
//! mailto handoff, toast notifications, scroll effects, reveal and counter
//! animations, lazy images, the skip link and local performance logging.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  browser events ──► web::WebDom (wasm32)  │  MemoryDom (tests) │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Page                                                        │
//! │    ├── install(dom)  -> InstallReport   (BEHAVIORS table)    │
//! │    └── handle(dom, PageEvent) -> Outcome                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  menu · scroll · filter · contact · notification · animate   │
//! │  lazy · a11y · perf            (all generic over `Dom`)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A behaviour whose required elements are missing from the page is skipped
//! without any error.

pub mod a11y;
pub mod animate;
pub mod behavior;
pub mod config;
pub mod contact;
pub mod dom;
pub mod error;
pub mod event;
pub mod filter;
pub mod lazy;
pub mod menu;
pub mod notification;
pub mod page;
pub mod perf;
pub mod scroll;
pub mod timing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use behavior::{Behavior, InstallReport, BEHAVIORS};
pub use config::{SiteConfig, SiteCopy};
pub use contact::{ContactPayload, Field};
pub use dom::{Dom, MemoryDom, NodeId};
pub use error::{SiteError, SiteResult, ValidationError};
pub use event::{Outcome, PageEvent, Timer};
pub use notification::{NotificationCenter, Severity, Ticket};
pub use page::Page;

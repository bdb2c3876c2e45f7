//! Which behaviours a page gets
//!
//! Each behaviour lists the selectors it cannot work without. A page that
//! lacks one of them simply does not get the behaviour; nothing is reported
//! to the visitor.

use std::fmt;

use crate::dom::Dom;
use crate::perf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Behavior {
    NavLinks,
    MobileMenu,
    SmoothScroll,
    PortfolioFilter,
    ContactForm,
    RevealOnScroll,
    ScrollEffects,
    StatCounters,
    Parallax,
    LazyImages,
    SkipLink,
    PerfMonitor,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::NavLinks => "nav_links",
            Behavior::MobileMenu => "mobile_menu",
            Behavior::SmoothScroll => "smooth_scroll",
            Behavior::PortfolioFilter => "portfolio_filter",
            Behavior::ContactForm => "contact_form",
            Behavior::RevealOnScroll => "reveal_on_scroll",
            Behavior::ScrollEffects => "scroll_effects",
            Behavior::StatCounters => "stat_counters",
            Behavior::Parallax => "parallax",
            Behavior::LazyImages => "lazy_images",
            Behavior::SkipLink => "skip_link",
            Behavior::PerfMonitor => "perf_monitor",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A behaviour and the conditions under which it is installed
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub behavior: Behavior,
    /// Every selector must match at least one element
    pub requires: &'static [&'static str],
    /// Only installed when the page is served from a local host
    pub local_only: bool,
}

impl Binding {
    const fn new(behavior: Behavior, requires: &'static [&'static str]) -> Self {
        Self {
            behavior,
            requires,
            local_only: false,
        }
    }

    /// First required selector with no match
    pub fn missing<D: Dom>(&self, dom: &D) -> Option<&'static str> {
        self.requires.iter().copied().find(|s| dom.query(s).is_none())
    }
}

/// All behaviours, in installation order
pub static BEHAVIORS: &[Binding] = &[
    Binding::new(Behavior::NavLinks, &[".nav-link"]),
    Binding::new(Behavior::MobileMenu, &["#nav-toggle", "#nav-menu"]),
    Binding::new(Behavior::SmoothScroll, &["a[href^=\"#\"]"]),
    Binding::new(Behavior::PortfolioFilter, &[".filter-btn", ".portfolio-item"]),
    Binding::new(Behavior::ContactForm, &["#contact-form"]),
    Binding::new(Behavior::RevealOnScroll, &[]),
    Binding::new(Behavior::ScrollEffects, &["#navbar"]),
    Binding::new(Behavior::StatCounters, &[".about-stats"]),
    Binding::new(Behavior::Parallax, &[".hero", ".avatar-container"]),
    Binding::new(Behavior::LazyImages, &[]),
    Binding::new(Behavior::SkipLink, &[]),
    Binding {
        behavior: Behavior::PerfMonitor,
        requires: &[],
        local_only: true,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingElement(&'static str),
    NotLocalHost,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingElement(selector) => write!(f, "no element matches {selector}"),
            SkipReason::NotLocalHost => f.write_str("not served from a local host"),
        }
    }
}

/// Outcome of resolving the behaviour table against a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub active: Vec<Behavior>,
    pub skipped: Vec<(Behavior, SkipReason)>,
}

impl InstallReport {
    pub fn is_active(&self, behavior: Behavior) -> bool {
        self.active.contains(&behavior)
    }

    pub fn skip_reason(&self, behavior: Behavior) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(b, _)| *b == behavior)
            .map(|(_, reason)| *reason)
    }
}

/// Decide which of `bindings` apply to the current document
pub fn resolve<D: Dom>(dom: &D, bindings: &[Binding]) -> InstallReport {
    let local = perf::should_monitor(&dom.hostname());
    let mut report = InstallReport::default();
    for binding in bindings {
        if let Some(selector) = binding.missing(dom) {
            report
                .skipped
                .push((binding.behavior, SkipReason::MissingElement(selector)));
        } else if binding.local_only && !local {
            report.skipped.push((binding.behavior, SkipReason::NotLocalHost));
        } else {
            report.active.push(binding.behavior);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    #[test]
    fn test_table_covers_every_behavior_once() {
        let mut seen: Vec<Behavior> = BEHAVIORS.iter().map(|b| b.behavior).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), BEHAVIORS.len());
        assert_eq!(BEHAVIORS.len(), 12);
    }

    #[test]
    fn test_empty_page_keeps_only_unconditional_behaviors() {
        let dom = MemoryDom::new();
        let report = resolve(&dom, BEHAVIORS);

        assert_eq!(
            report.active,
            vec![Behavior::RevealOnScroll, Behavior::LazyImages, Behavior::SkipLink]
        );
        assert_eq!(
            report.skip_reason(Behavior::MobileMenu),
            Some(SkipReason::MissingElement("#nav-toggle"))
        );
        assert_eq!(report.skip_reason(Behavior::PerfMonitor), Some(SkipReason::NotLocalHost));
    }

    #[test]
    fn test_menu_needs_both_elements() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        dom.append(body, "button", &[("id", "nav-toggle")]);

        let report = resolve(&dom, BEHAVIORS);
        assert_eq!(
            report.skip_reason(Behavior::MobileMenu),
            Some(SkipReason::MissingElement("#nav-menu"))
        );

        dom.append(body, "ul", &[("id", "nav-menu")]);
        assert!(resolve(&dom, BEHAVIORS).is_active(Behavior::MobileMenu));
    }

    #[test]
    fn test_perf_monitor_on_localhost() {
        let mut dom = MemoryDom::new();
        dom.set_hostname("localhost");
        assert!(resolve(&dom, BEHAVIORS).is_active(Behavior::PerfMonitor));
    }
}

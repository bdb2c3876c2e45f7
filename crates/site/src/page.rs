//! The page controller
//!
//! [`Page`] owns every piece of state the behaviours share: the install
//! report, the notification on screen, the counter animation and the
//! parallax throttle. The host feeds it [`PageEvent`]s and applies the
//! returned [`Outcome`] to the originating browser event.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::a11y;
use crate::animate::{self, CounterRun, REVEAL_TARGETS, STATS_BLOCK, STATS_THRESHOLD};
use crate::behavior::{self, Behavior, InstallReport, BEHAVIORS};
use crate::config::SiteConfig;
use crate::contact;
use crate::dom::Dom;
use crate::event::{Outcome, PageEvent, Timer};
use crate::filter;
use crate::lazy::{self, LAZY_IMAGES};
use crate::menu;
use crate::notification::{NotificationCenter, Severity, Ticket};
use crate::scroll::{self, ANCHOR_LINKS};
use crate::timing::Throttle;

pub const CONTACT_FORM: &str = "#contact-form";
pub const PARALLAX_THROTTLE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
enum Counters<N> {
    Waiting,
    Running(CounterRun<N>),
    Finished,
}

#[derive(Debug, Clone)]
pub struct Page<N> {
    config: SiteConfig,
    report: Option<InstallReport>,
    notifications: NotificationCenter<N>,
    counters: Counters<N>,
    parallax: Throttle,
}

impl<N: Clone + PartialEq + fmt::Debug> Page<N> {
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            report: None,
            notifications: NotificationCenter::new(),
            counters: Counters::Waiting,
            parallax: Throttle::new(PARALLAX_THROTTLE),
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The install report, once [`Page::install`] ran
    pub fn report(&self) -> Option<&InstallReport> {
        self.report.as_ref()
    }

    pub fn is_active(&self, behavior: Behavior) -> bool {
        self.report.as_ref().is_some_and(|r| r.is_active(behavior))
    }

    pub fn notifications(&self) -> &NotificationCenter<N> {
        &self.notifications
    }

    /// Resolve the behaviour table and run one-time setup; later calls do nothing
    pub fn install<D: Dom<Node = N>>(&mut self, dom: &mut D) -> InstallReport {
        if let Some(report) = &self.report {
            return report.clone();
        }

        let report = behavior::resolve(dom, BEHAVIORS);
        for (behavior, reason) in &report.skipped {
            debug!("Skipping {}: {}", behavior, reason);
        }
        for behavior in &report.active {
            self.setup(dom, *behavior);
        }
        info!(
            "Installed {} behaviours ({} skipped)",
            report.active.len(),
            report.skipped.len()
        );

        self.report = Some(report.clone());
        report
    }

    fn setup<D: Dom<Node = N>>(&mut self, dom: &mut D, behavior: Behavior) {
        match behavior {
            Behavior::RevealOnScroll => {
                let count = animate::prepare_reveal(dom);
                debug!("Observing {} reveal targets", count);
            }
            Behavior::StatCounters => {
                if let Some(stats) = dom.query(STATS_BLOCK) {
                    dom.observe(&stats, STATS_THRESHOLD);
                }
            }
            Behavior::LazyImages => {
                let count = lazy::prepare(dom);
                debug!("Found {} lazy images", count);
            }
            Behavior::SkipLink => {
                a11y::install(dom, &self.config.copy.skip_link);
            }
            Behavior::NavLinks
            | Behavior::MobileMenu
            | Behavior::SmoothScroll
            | Behavior::PortfolioFilter
            | Behavior::ContactForm
            | Behavior::ScrollEffects
            | Behavior::Parallax
            | Behavior::PerfMonitor => {}
        }
    }

    /// Show a notification, replacing any already on the page
    pub fn show_notification<D: Dom<Node = N>>(&mut self, dom: &mut D, message: &str, severity: Severity) -> Ticket {
        self.notifications.show(dom, message, severity)
    }

    /// React to one event; events for behaviours that are not installed are ignored
    pub fn handle<D: Dom<Node = N>>(&mut self, dom: &mut D, event: PageEvent<N>) -> Outcome {
        match event {
            PageEvent::Click(target) => self.on_click(dom, &target),
            PageEvent::Submit(form) => self.on_submit(dom, &form),
            PageEvent::Scroll => {
                self.on_scroll(dom);
                Outcome::NONE
            }
            PageEvent::Intersect(node) => {
                self.on_intersect(dom, &node);
                Outcome::NONE
            }
            PageEvent::Focus(node) => {
                if self.is_active(Behavior::SkipLink) {
                    a11y::set_focused(dom, &node, true);
                }
                Outcome::NONE
            }
            PageEvent::Blur(node) => {
                if self.is_active(Behavior::SkipLink) {
                    a11y::set_focused(dom, &node, false);
                }
                Outcome::NONE
            }
            PageEvent::Timer(timer) => {
                self.on_timer(dom, timer);
                Outcome::NONE
            }
            PageEvent::Perf(metric) => {
                if self.is_active(Behavior::PerfMonitor) {
                    dom.log(&metric.to_string());
                }
                Outcome::NONE
            }
        }
    }

    fn on_click<D: Dom<Node = N>>(&mut self, dom: &mut D, target: &N) -> Outcome {
        if self.notifications.handle_click(dom, target) {
            return Outcome::NONE;
        }

        let mut outcome = Outcome::NONE;

        if self.is_active(Behavior::NavLinks) && dom.closest(target, ".nav-link").is_some() {
            menu::close(dom);
        }

        if self.is_active(Behavior::MobileMenu) && dom.closest(target, menu::TOGGLE).is_some() {
            let open = menu::toggle(dom);
            debug!("Mobile menu {}", if open { "opened" } else { "closed" });
        }

        if self.is_active(Behavior::SmoothScroll) {
            if let Some(link) = dom.closest(target, ANCHOR_LINKS) {
                if scroll::follow_anchor(dom, &link) {
                    outcome = outcome.merge(Outcome::PREVENT_DEFAULT);
                }
            }
        }

        if self.is_active(Behavior::PortfolioFilter) {
            if let Some(button) = dom.closest(target, ".filter-btn") {
                let buttons = dom.query_all(".filter-btn");
                let items = dom.query_all(".portfolio-item");
                let visible = filter::apply(dom, &buttons, &items, &button);
                debug!("Portfolio filter shows {} of {} items", visible, items.len());
            }
        }

        outcome
    }

    fn on_submit<D: Dom<Node = N>>(&mut self, dom: &mut D, form: &N) -> Outcome {
        if !self.is_active(Behavior::ContactForm) || !dom.matches(form, CONTACT_FORM) {
            return Outcome::NONE;
        }
        match contact::submit(dom, form, &self.config, &mut self.notifications) {
            Ok(url) => debug!("Handing off to {}", url),
            Err(e) => debug!("Contact form not sent: {}", e),
        }
        Outcome::PREVENT_DEFAULT
    }

    fn on_scroll<D: Dom<Node = N>>(&mut self, dom: &mut D) {
        if self.is_active(Behavior::ScrollEffects) {
            scroll::update_navbar(dom);
        }
        if self.is_active(Behavior::Parallax) && self.parallax.ready(dom.now_ms()) {
            scroll::update_parallax(dom);
        }
    }

    fn on_intersect<D: Dom<Node = N>>(&mut self, dom: &mut D, node: &N) {
        if self.is_active(Behavior::StatCounters) && dom.matches(node, STATS_BLOCK) {
            dom.unobserve(node);
            if matches!(self.counters, Counters::Waiting) {
                self.counters = match CounterRun::start(dom) {
                    Some(run) => Counters::Running(run),
                    None => Counters::Finished,
                };
            }
        }
        if self.is_active(Behavior::LazyImages) && dom.matches(node, LAZY_IMAGES) {
            lazy::load(dom, node);
        }
        if self.is_active(Behavior::RevealOnScroll) && dom.matches(node, REVEAL_TARGETS) {
            animate::reveal(dom, node);
        }
    }

    fn on_timer<D: Dom<Node = N>>(&mut self, dom: &mut D, timer: Timer) {
        match timer {
            Timer::NotificationExpire(ticket) => {
                self.notifications.dismiss(dom, ticket);
            }
            Timer::NotificationRemove(ticket) => self.notifications.finish(dom, ticket),
            Timer::CounterTick => {
                let done = match &mut self.counters {
                    Counters::Running(run) => run.tick(dom),
                    Counters::Waiting | Counters::Finished => false,
                };
                if done {
                    self.counters = Counters::Finished;
                }
            }
        }
    }
}

//! Transient toast notifications
//!
//! At most one notification is on the page. Showing a new one removes the
//! previous element first. A notification leaves after [`DISPLAY_DURATION`] or
//! when its close button is clicked, sliding out for [`EXIT_DURATION`] before
//! it is removed.

use std::fmt;
use std::time::Duration;

use crate::dom::Dom;
use crate::event::Timer;

pub const DISPLAY_DURATION: Duration = Duration::from_secs(5);
pub const EXIT_DURATION: Duration = Duration::from_millis(300);

const STYLE_ID: &str = "notification-styles";

const KEYFRAMES: &str = "\
@keyframes slideInRight {
    from { transform: translateX(100%); opacity: 0; }
    to { transform: translateX(0); opacity: 1; }
}
@keyframes slideOutRight {
    from { transform: translateX(0); opacity: 1; }
    to { transform: translateX(100%); opacity: 0; }
}";

const BOX_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("top", "100px"),
    ("right", "20px"),
    ("padding", "16px 20px"),
    ("color", "white"),
    ("border-radius", "8px"),
    ("box-shadow", "0 10px 25px rgba(0, 0, 0, 0.15)"),
    ("display", "flex"),
    ("align-items", "center"),
    ("gap", "12px"),
    ("z-index", "9999"),
    ("animation", "slideInRight 0.3s ease"),
    ("max-width", "350px"),
];

const CLOSE_STYLE: &[(&str, &str)] = &[
    ("background", "none"),
    ("border", "none"),
    ("color", "white"),
    ("font-size", "20px"),
    ("cursor", "pointer"),
    ("padding", "0"),
    ("line-height", "1"),
];

/// Identifies one shown notification; timers carry it so a late timer for a
/// replaced notification does nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            Severity::Info => "#2563EB",
            Severity::Success => "#10B981",
            Severity::Error => "#EF4444",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Shown<N> {
    ticket: Ticket,
    node: N,
    leaving: bool,
}

/// Owns the notification element and the keyframe style guard
#[derive(Debug, Clone)]
pub struct NotificationCenter<N> {
    styles_injected: bool,
    current: Option<Shown<N>>,
    issued: u64,
}

impl<N> Default for NotificationCenter<N> {
    fn default() -> Self {
        Self {
            styles_injected: false,
            current: None,
            issued: 0,
        }
    }
}

impl<N: Clone + PartialEq + fmt::Debug> NotificationCenter<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket of the notification on the page, if any
    pub fn current(&self) -> Option<Ticket> {
        self.current.as_ref().map(|s| s.ticket)
    }

    /// Show `message`, replacing any notification already on the page
    pub fn show<D: Dom<Node = N>>(&mut self, dom: &mut D, message: &str, severity: Severity) -> Ticket {
        if let Some(previous) = self.current.take() {
            dom.remove(&previous.node);
        }
        self.inject_styles(dom);

        self.issued += 1;
        let ticket = Ticket(self.issued);

        let node = dom.create_element("div");
        dom.set_attribute(&node, "class", &format!("notification notification-{severity}"));
        dom.set_attribute(&node, "role", "status");
        for (property, value) in BOX_STYLE {
            dom.set_style(&node, property, value);
        }
        dom.set_style(&node, "background", severity.background());

        let text = dom.create_element("span");
        dom.set_attribute(&text, "class", "notification-message");
        dom.set_text(&text, message);
        dom.append_child(&node, &text);

        let close = dom.create_element("button");
        dom.set_attribute(&close, "class", "notification-close");
        dom.set_attribute(&close, "type", "button");
        dom.set_attribute(&close, "aria-label", "Close");
        dom.set_text(&close, "\u{00d7}");
        for (property, value) in CLOSE_STYLE {
            dom.set_style(&close, property, value);
        }
        dom.append_child(&node, &close);

        let body = dom.body();
        dom.append_child(&body, &node);
        dom.schedule(DISPLAY_DURATION, Timer::NotificationExpire(ticket));

        self.current = Some(Shown {
            ticket,
            node,
            leaving: false,
        });
        ticket
    }

    /// Start the slide-out of `ticket`; returns false for a stale or leaving ticket
    pub fn dismiss<D: Dom<Node = N>>(&mut self, dom: &mut D, ticket: Ticket) -> bool {
        match self.current.as_mut() {
            Some(shown) if shown.ticket == ticket && !shown.leaving => {
                shown.leaving = true;
                dom.set_style(&shown.node, "animation", "slideOutRight 0.3s ease forwards");
                dom.schedule(EXIT_DURATION, Timer::NotificationRemove(ticket));
                true
            }
            _ => false,
        }
    }

    /// Remove the element of `ticket` once its slide-out finished
    pub fn finish<D: Dom<Node = N>>(&mut self, dom: &mut D, ticket: Ticket) {
        if self.current.as_ref().is_some_and(|s| s.ticket == ticket) {
            if let Some(shown) = self.current.take() {
                dom.remove(&shown.node);
            }
        }
    }

    /// Handle a click anywhere; true if it hit the close button of the current notification
    pub fn handle_click<D: Dom<Node = N>>(&mut self, dom: &mut D, target: &N) -> bool {
        if dom.closest(target, ".notification-close").is_none() {
            return false;
        }
        let Some(shown) = &self.current else {
            return false;
        };
        if dom.closest(target, ".notification").as_ref() != Some(&shown.node) {
            return false;
        }
        let ticket = shown.ticket;
        self.dismiss(dom, ticket)
    }

    fn inject_styles<D: Dom<Node = N>>(&mut self, dom: &mut D) {
        if self.styles_injected {
            return;
        }
        let style = dom.create_element("style");
        dom.set_attribute(&style, "id", STYLE_ID);
        dom.set_text(&style, KEYFRAMES);
        let head = dom.head();
        dom.append_child(&head, &style);
        self.styles_injected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    #[test]
    fn test_second_show_replaces_first() {
        let mut dom = MemoryDom::new();
        let mut center = NotificationCenter::new();

        let first = center.show(&mut dom, "one", Severity::Info);
        let second = center.show(&mut dom, "two", Severity::Error);

        assert_ne!(first, second);
        assert_eq!(dom.count(".notification"), 1);
        assert_eq!(dom.count(".notification-error"), 1);
        assert_eq!(dom.count("#notification-styles"), 1);
        assert_eq!(center.current(), Some(second));
    }

    #[test]
    fn test_expiry_then_removal() {
        let mut dom = MemoryDom::new();
        let mut center = NotificationCenter::new();
        let ticket = center.show(&mut dom, "hello", Severity::Success);

        assert_eq!(dom.advance(DISPLAY_DURATION), vec![Timer::NotificationExpire(ticket)]);
        assert!(center.dismiss(&mut dom, ticket));
        assert!(!center.dismiss(&mut dom, ticket));
        assert_eq!(dom.count(".notification"), 1);

        assert_eq!(dom.advance(EXIT_DURATION), vec![Timer::NotificationRemove(ticket)]);
        center.finish(&mut dom, ticket);
        assert_eq!(dom.count(".notification"), 0);
        assert_eq!(center.current(), None);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut dom = MemoryDom::new();
        let mut center = NotificationCenter::new();
        let old = center.show(&mut dom, "old", Severity::Info);
        let new = center.show(&mut dom, "new", Severity::Info);

        assert!(!center.dismiss(&mut dom, old));
        center.finish(&mut dom, old);
        assert_eq!(center.current(), Some(new));
        assert_eq!(dom.count(".notification"), 1);
    }

    #[test]
    fn test_close_button_click() {
        let mut dom = MemoryDom::new();
        let mut center = NotificationCenter::new();
        center.show(&mut dom, "bye", Severity::Info);
        let close = dom.query(".notification-close").unwrap();
        let message = dom.query(".notification-message").unwrap();

        assert!(!center.handle_click(&mut dom, &message));
        assert!(center.handle_click(&mut dom, &close));
        let note = dom.query(".notification").unwrap();
        assert_eq!(dom.style(note, "animation"), Some("slideOutRight 0.3s ease forwards"));
    }
}

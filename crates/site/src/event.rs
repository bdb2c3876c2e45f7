//! Events delivered to the page controller

use crate::notification::Ticket;
use crate::perf::PerfMetric;

/// A browser event, already resolved to the element it concerns
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent<N> {
    /// Click on an element (the event target)
    Click(N),
    /// Submit of a form element
    Submit(N),
    /// Window scroll
    Scroll,
    /// An observed element entered the viewport
    Intersect(N),
    Focus(N),
    Blur(N),
    /// A timer requested through [`Dom::schedule`](crate::dom::Dom::schedule) fired
    Timer(Timer),
    /// A performance entry was reported by the browser
    Perf(PerfMetric),
}

/// Deferred work the controller asked the host to run later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Display time of a notification elapsed
    NotificationExpire(Ticket),
    /// Slide-out animation of a notification finished
    NotificationRemove(Ticket),
    /// Next frame of the stat counters
    CounterTick,
}

/// What the host should do with the originating browser event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub prevent_default: bool,
}

impl Outcome {
    pub const NONE: Outcome = Outcome {
        prevent_default: false,
    };

    pub const PREVENT_DEFAULT: Outcome = Outcome {
        prevent_default: true,
    };

    /// Combine outcomes of several behaviours reacting to the same event
    pub fn merge(self, other: Outcome) -> Outcome {
        Outcome {
            prevent_default: self.prevent_default || other.prevent_default,
        }
    }
}

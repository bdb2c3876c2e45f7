//! Scroll-triggered reveal and the stat counters

use std::fmt;
use std::time::Duration;

use crate::dom::Dom;
use crate::event::Timer;

pub const REVEAL_TARGETS: &str =
    ".about-card, .skill-category, .stat-card, .timeline-item, .portfolio-item, .contact-card";
pub const REVEAL_THRESHOLD: f64 = 0.1;
pub const ANIMATE_IN_CLASS: &str = "animate-in";

const ANIMATE_IN_STYLE: &str =
    ".animate-in { opacity: 1 !important; transform: translateY(0) !important; }";

pub const STATS_BLOCK: &str = ".about-stats";
pub const STAT_NUMBER: &str = ".stat-number";
pub const STATS_THRESHOLD: f64 = 0.5;

pub const COUNTER_STEPS: u32 = 50;
pub const COUNTER_DURATION: Duration = Duration::from_secs(2);

/// Hide every reveal target and start observing it; returns how many were found
pub fn prepare_reveal<D: Dom>(dom: &mut D) -> usize {
    let style = dom.create_element("style");
    dom.set_text(&style, ANIMATE_IN_STYLE);
    let head = dom.head();
    dom.append_child(&head, &style);

    let targets = dom.query_all(REVEAL_TARGETS);
    for target in &targets {
        dom.set_style(target, "opacity", "0");
        dom.set_style(target, "transform", "translateY(20px)");
        dom.set_style(target, "transition", "opacity 0.6s ease, transform 0.6s ease");
        dom.observe(target, REVEAL_THRESHOLD);
    }
    targets.len()
}

/// Mark an intersecting reveal target as shown; it is revealed only once
pub fn reveal<D: Dom>(dom: &mut D, node: &D::Node) {
    dom.add_class(node, ANIMATE_IN_CLASS);
    dom.unobserve(node);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    None,
    Percent,
    Plus,
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suffix::None => Ok(()),
            Suffix::Percent => f.write_str("%"),
            Suffix::Plus => f.write_str("+"),
        }
    }
}

/// A stat number counting up from zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub target: u64,
    pub suffix: Suffix,
}

impl Counter {
    /// Parse display text like `95%`, `10+` or `3`; text without digits has no counter
    pub fn parse(text: &str) -> Option<Self> {
        let digits: String = text.chars().filter(char::is_ascii_digit).collect();
        let target = digits.parse().ok()?;
        let suffix = if text.contains('%') {
            Suffix::Percent
        } else if text.contains('+') {
            Suffix::Plus
        } else {
            Suffix::None
        };
        Some(Self { target, suffix })
    }

    /// Display text after `step` of [`COUNTER_STEPS`] frames
    pub fn frame(&self, step: u32) -> String {
        let step = step.min(COUNTER_STEPS);
        let value = (self.target as f64 * f64::from(step) / f64::from(COUNTER_STEPS)).round() as u64;
        format!("{value}{}", self.suffix)
    }
}

/// Time between counter frames
pub fn counter_interval() -> Duration {
    COUNTER_DURATION / COUNTER_STEPS
}

/// All stat counters animating together
#[derive(Debug, Clone)]
pub struct CounterRun<N> {
    counters: Vec<(N, Counter)>,
    step: u32,
}

impl<N: Clone + PartialEq + fmt::Debug> CounterRun<N> {
    /// Collect the stat numbers and schedule the first frame
    pub fn start<D: Dom<Node = N>>(dom: &mut D) -> Option<Self> {
        let counters: Vec<(N, Counter)> = dom
            .query_all(STAT_NUMBER)
            .into_iter()
            .filter_map(|node| {
                let counter = Counter::parse(&dom.text(&node))?;
                Some((node, counter))
            })
            .collect();
        if counters.is_empty() {
            return None;
        }
        dom.schedule(counter_interval(), Timer::CounterTick);
        Some(Self { counters, step: 0 })
    }

    /// Render the next frame; returns true once the final value is shown
    pub fn tick<D: Dom<Node = N>>(&mut self, dom: &mut D) -> bool {
        self.step = (self.step + 1).min(COUNTER_STEPS);
        for (node, counter) in &self.counters {
            dom.set_text(node, &counter.frame(self.step));
        }
        let done = self.step >= COUNTER_STEPS;
        if !done {
            dom.schedule(counter_interval(), Timer::CounterTick);
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("95%", Some((95, Suffix::Percent)) ; "percent")]
    #[test_case("10+", Some((10, Suffix::Plus)) ; "plus")]
    #[test_case("1,200", Some((1200, Suffix::None)) ; "grouped")]
    #[test_case("many", None ; "no digits")]
    fn test_counter_parse(text: &str, expected: Option<(u64, Suffix)>) {
        let parsed = Counter::parse(text).map(|c| (c.target, c.suffix));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_counter_frames() {
        let counter = Counter::parse("50+").unwrap();
        assert_eq!(counter.frame(0), "0+");
        assert_eq!(counter.frame(25), "25+");
        assert_eq!(counter.frame(COUNTER_STEPS), "50+");
        assert_eq!(counter.frame(COUNTER_STEPS + 7), "50+");
    }

    #[test]
    fn test_counter_interval() {
        assert_eq!(counter_interval(), Duration::from_millis(40));
    }
}

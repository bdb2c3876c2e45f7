//! Smooth anchor scrolling, navbar scroll state, active-section highlighting
//! and the hero parallax

use crate::dom::Dom;
use crate::filter::ACTIVE_CLASS;

pub const NAVBAR: &str = "#navbar";
pub const ANCHOR_LINKS: &str = "a[href^=\"#\"]";
pub const SCROLLED_CLASS: &str = "scrolled";

/// Scroll offset past which the navbar gets its solid background
pub const SCROLLED_THRESHOLD: f64 = 50.0;

/// How far above a section (below the navbar) it already counts as current
pub const SECTION_LEAD: f64 = 100.0;

pub const PARALLAX_FACTOR: f64 = 0.1;

/// Document offset to scroll to so the target sits just under the navbar
pub fn scroll_target(bounding_top: f64, scroll_y: f64, navbar_height: f64) -> f64 {
    bounding_top + scroll_y - navbar_height
}

/// The in-page target of an anchor `href`; a bare `#` has none
pub fn anchor_target(href: &str) -> Option<&str> {
    match href.strip_prefix('#') {
        Some(id) if !id.is_empty() => Some(href),
        _ => None,
    }
}

fn navbar_height<D: Dom>(dom: &D) -> f64 {
    dom.query(NAVBAR)
        .map(|navbar| dom.offset_height(&navbar))
        .unwrap_or(0.0)
}

/// Scroll to the target of `link`; returns true if the click should not navigate
pub fn follow_anchor<D: Dom>(dom: &mut D, link: &D::Node) -> bool {
    let Some(href) = dom.attribute(link, "href") else {
        return false;
    };
    let Some(selector) = anchor_target(&href) else {
        return false;
    };
    if let Some(target) = dom.query(selector) {
        let top = scroll_target(dom.bounding_top(&target), dom.scroll_y(), navbar_height(dom));
        dom.scroll_to(top);
    }
    true
}

/// A section's id and vertical extent in document coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBand {
    pub id: String,
    pub offset_top: f64,
    pub height: f64,
}

/// Index of the section the reader is in; the last matching band wins
pub fn current_section(scroll_y: f64, navbar_height: f64, sections: &[SectionBand]) -> Option<usize> {
    sections
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            let top = s.offset_top - navbar_height - SECTION_LEAD;
            scroll_y >= top && scroll_y < top + s.height
        })
        .map(|(i, _)| i)
        .last()
}

/// Update the navbar background and the highlighted nav link for the current scroll offset
pub fn update_navbar<D: Dom>(dom: &mut D) {
    let Some(navbar) = dom.query(NAVBAR) else {
        return;
    };
    let scroll_y = dom.scroll_y();

    if scroll_y > SCROLLED_THRESHOLD {
        dom.add_class(&navbar, SCROLLED_CLASS);
    } else {
        dom.remove_class(&navbar, SCROLLED_CLASS);
    }

    let bands: Vec<SectionBand> = dom
        .query_all("section[id]")
        .iter()
        .map(|section| SectionBand {
            id: dom.attribute(section, "id").unwrap_or_default(),
            offset_top: dom.offset_top(section),
            height: dom.offset_height(section),
        })
        .collect();

    let Some(current) = current_section(scroll_y, dom.offset_height(&navbar), &bands) else {
        return;
    };
    let href = format!("#{}", bands[current].id);
    for link in dom.query_all(".nav-link") {
        dom.remove_class(&link, ACTIVE_CLASS);
        if dom.attribute(&link, "href").as_deref() == Some(href.as_str()) {
            dom.add_class(&link, ACTIVE_CLASS);
        }
    }
}

/// Avatar offset for the hero parallax, or `None` once scrolled past the hero
pub fn parallax_offset(scroll_y: f64, hero_height: f64) -> Option<f64> {
    (scroll_y < hero_height).then(|| scroll_y * PARALLAX_FACTOR)
}

pub fn update_parallax<D: Dom>(dom: &mut D) {
    let (Some(hero), Some(avatar)) = (dom.query(".hero"), dom.query(".avatar-container")) else {
        return;
    };
    if let Some(offset) = parallax_offset(dom.scroll_y(), dom.offset_height(&hero)) {
        dom.set_style(&avatar, "transform", &format!("translateY({offset}px)"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn bands() -> Vec<SectionBand> {
        [("home", 0.0, 800.0), ("about", 800.0, 600.0), ("contact", 1400.0, 500.0)]
            .into_iter()
            .map(|(id, offset_top, height)| SectionBand {
                id: id.to_string(),
                offset_top,
                height,
            })
            .collect()
    }

    #[test_case("#contact", Some("#contact") ; "section")]
    #[test_case("#", None ; "bare hash")]
    #[test_case("/resume.pdf", None ; "not an anchor")]
    fn test_anchor_target(href: &str, expected: Option<&str>) {
        assert_eq!(anchor_target(href), expected);
    }

    #[test]
    fn test_scroll_target_accounts_for_navbar() {
        assert_eq!(scroll_target(1200.0, 300.0, 70.0), 1430.0);
    }

    #[test_case(0.0, Some(0) ; "top of page")]
    #[test_case(629.0, Some(0) ; "just before about lead")]
    #[test_case(630.0, Some(1) ; "about lead reached")]
    #[test_case(1300.0, Some(2) ; "contact")]
    #[test_case(5000.0, None ; "past the last section")]
    fn test_current_section(scroll_y: f64, expected: Option<usize>) {
        assert_eq!(current_section(scroll_y, 70.0, &bands()), expected);
    }

    #[test]
    fn test_parallax_stops_after_hero() {
        assert_eq!(parallax_offset(200.0, 900.0), Some(20.0));
        assert_eq!(parallax_offset(900.0, 900.0), None);
    }
}

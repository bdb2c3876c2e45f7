//! Skip link and main landmark

use crate::dom::Dom;

pub const SKIP_LINK: &str = "a.skip-link";
pub const MAIN_ID: &str = "main";

const HIDDEN_TOP: &str = "-40px";
const SHOWN_TOP: &str = "0";

const SKIP_LINK_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", HIDDEN_TOP),
    ("left", "0"),
    ("background", "#2563EB"),
    ("color", "white"),
    ("padding", "8px 16px"),
    ("z-index", "10000"),
    ("transition", "top 0.3s"),
];

/// Insert the skip link as the first child of `body` and make sure a `main`
/// landmark exists for it to point at
pub fn install<D: Dom>(dom: &mut D, label: &str) -> D::Node {
    let link = dom.create_element("a");
    dom.set_attribute(&link, "href", &format!("#{MAIN_ID}"));
    dom.set_attribute(&link, "class", "skip-link");
    dom.set_text(&link, label);
    for (property, value) in SKIP_LINK_STYLE {
        dom.set_style(&link, property, value);
    }

    let body = dom.body();
    let first = dom.first_child(&body);
    dom.insert_before(&body, &link, first.as_ref());

    ensure_main(dom);
    link
}

/// Wrap every `section` into `main#main`, placed before the footer, unless
/// the page already has a `main`; returns the landmark it created
pub fn ensure_main<D: Dom>(dom: &mut D) -> Option<D::Node> {
    if dom.query("main").is_some() {
        return None;
    }
    let main = dom.create_element("main");
    dom.set_attribute(&main, "id", MAIN_ID);
    for section in dom.query_all("section") {
        dom.append_child(&main, &section);
    }
    let body = dom.body();
    let footer = dom.query(".footer");
    dom.insert_before(&body, &main, footer.as_ref());
    Some(main)
}

/// Reveal the skip link while it has keyboard focus
pub fn set_focused<D: Dom>(dom: &mut D, node: &D::Node, focused: bool) -> bool {
    if !dom.matches(node, SKIP_LINK) {
        return false;
    }
    dom.set_style(node, "top", if focused { SHOWN_TOP } else { HIDDEN_TOP });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    #[test]
    fn test_sections_are_wrapped_before_footer() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let nav = dom.append(body, "nav", &[("id", "navbar")]);
        let about = dom.append(body, "section", &[("id", "about")]);
        let contact = dom.append(body, "section", &[("id", "contact")]);
        let footer = dom.append(body, "footer", &[("class", "footer")]);

        let link = install(&mut dom, "Skip to main content");
        let main = dom.query("main#main").unwrap();

        assert_eq!(dom.children(body), &[link, nav, main, footer]);
        assert_eq!(dom.children(main), &[about, contact]);
        assert_eq!(dom.style(link, "top"), Some("-40px"));
    }

    #[test]
    fn test_existing_main_is_kept() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let main = dom.append(body, "main", &[("id", "content")]);
        dom.append(main, "section", &[("id", "about")]);

        assert_eq!(ensure_main(&mut dom), None);
        assert_eq!(dom.count("main"), 1);
    }

    #[test]
    fn test_focus_moves_link_into_view() {
        let mut dom = MemoryDom::new();
        let link = install(&mut dom, "Skip");
        let body = dom.body();

        assert!(set_focused(&mut dom, &link, true));
        assert_eq!(dom.style(link, "top"), Some("0"));
        assert!(set_focused(&mut dom, &link, false));
        assert_eq!(dom.style(link, "top"), Some("-40px"));
        assert!(!set_focused(&mut dom, &body, true));
    }
}

//! Deferred image loading

use crate::dom::Dom;

pub const LAZY_IMAGES: &str = "img[data-src]";
pub const LOADED_CLASS: &str = "loaded";

const LAZY_STYLE: &str = "\
img[data-src] { opacity: 0; transition: opacity 0.3s ease; }
img.loaded { opacity: 1; }";

/// Observe every lazy image, or load them all now when the host cannot
/// report intersections; returns how many images were found
pub fn prepare<D: Dom>(dom: &mut D) -> usize {
    let style = dom.create_element("style");
    dom.set_text(&style, LAZY_STYLE);
    let head = dom.head();
    dom.append_child(&head, &style);

    let images = dom.query_all(LAZY_IMAGES);
    let observe = dom.supports_observer();
    for image in &images {
        if observe {
            dom.observe(image, 0.0);
        } else {
            load(dom, image);
        }
    }
    images.len()
}

/// Swap in the real source; images without `data-src` are left alone
pub fn load<D: Dom>(dom: &mut D, image: &D::Node) -> bool {
    let Some(src) = dom.attribute(image, "data-src") else {
        return false;
    };
    dom.set_attribute(image, "src", &src);
    dom.add_class(image, LOADED_CLASS);
    dom.unobserve(image);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    #[test]
    fn test_images_wait_for_intersection() {
        let mut dom = MemoryDom::new();
        let body = dom.body();
        let img = dom.append(body, "img", &[("data-src", "/img/project.webp")]);

        assert_eq!(prepare(&mut dom), 1);
        assert!(dom.is_observed(img));
        assert_eq!(dom.attribute(&img, "src"), None);

        assert!(load(&mut dom, &img));
        assert_eq!(dom.attribute(&img, "src").as_deref(), Some("/img/project.webp"));
        assert!(dom.has_class(&img, LOADED_CLASS));
        assert!(!dom.is_observed(img));
    }

    #[test]
    fn test_without_observer_images_load_at_once() {
        let mut dom = MemoryDom::new();
        dom.disable_observer();
        let body = dom.body();
        let img = dom.append(body, "img", &[("data-src", "/a.png")]);

        prepare(&mut dom);
        assert!(dom.has_class(&img, LOADED_CLASS));
        assert!(dom.observed().is_empty());
    }
}

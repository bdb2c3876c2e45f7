//! Portfolio category filter

use crate::dom::Dom;

pub const HIDDEN_CLASS: &str = "hidden";
pub const ACTIVE_CLASS: &str = "active";
const REVEAL_ANIMATION: &str = "fadeInUp 0.5s ease forwards";

/// Value of a filter button's `data-filter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Category(String),
}

impl Filter {
    /// `all`, or a missing attribute, selects everything
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            None | Some("all") => Filter::All,
            Some(category) => Filter::Category(category.to_string()),
        }
    }

    /// Whether an item with `category` stays visible
    pub fn admits(&self, category: Option<&str>) -> bool {
        match self {
            Filter::All => true,
            Filter::Category(wanted) => category == Some(wanted.as_str()),
        }
    }
}

/// Activate `clicked` among `buttons` and show only the admitted `items`
///
/// Returns the number of items left visible.
pub fn apply<D: Dom>(dom: &mut D, buttons: &[D::Node], items: &[D::Node], clicked: &D::Node) -> usize {
    for button in buttons {
        dom.remove_class(button, ACTIVE_CLASS);
    }
    dom.add_class(clicked, ACTIVE_CLASS);

    let filter = Filter::from_attribute(dom.attribute(clicked, "data-filter").as_deref());
    let mut visible = 0;
    for item in items {
        let category = dom.attribute(item, "data-category");
        if filter.admits(category.as_deref()) {
            dom.remove_class(item, HIDDEN_CLASS);
            dom.set_style(item, "animation", REVEAL_ANIMATION);
            visible += 1;
        } else {
            dom.add_class(item, HIDDEN_CLASS);
        }
    }
    visible
}

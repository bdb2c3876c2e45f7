//! Mobile navigation menu

use crate::dom::Dom;
use crate::filter::ACTIVE_CLASS;

pub const TOGGLE: &str = "#nav-toggle";
pub const MENU: &str = "#nav-menu";

/// Flip the open state of the menu; returns whether it is now open
pub fn toggle<D: Dom>(dom: &mut D) -> bool {
    let (Some(toggle), Some(menu)) = (dom.query(TOGGLE), dom.query(MENU)) else {
        return false;
    };
    dom.toggle_class(&toggle, ACTIVE_CLASS);
    dom.toggle_class(&menu, ACTIVE_CLASS)
}

/// Close the menu if it is open
pub fn close<D: Dom>(dom: &mut D) {
    let Some(menu) = dom.query(MENU) else {
        return;
    };
    if !dom.has_class(&menu, ACTIVE_CLASS) {
        return;
    }
    dom.remove_class(&menu, ACTIVE_CLASS);
    if let Some(toggle) = dom.query(TOGGLE) {
        dom.remove_class(&toggle, ACTIVE_CLASS);
    }
}

pub fn is_open<D: Dom>(dom: &D) -> bool {
    dom.query(MENU)
        .is_some_and(|menu| dom.has_class(&menu, ACTIVE_CLASS))
}

//! DOM access used by the page behaviours
//!
//! Behaviours never touch a browser API directly. They go through [`Dom`],
//! which is implemented by [`MemoryDom`] for tests and by the `web-sys`
//! binding when compiled for `wasm32`.

use std::fmt;
use std::time::Duration;

use crate::event::Timer;

pub mod memory;
pub mod selector;

pub use memory::{MemoryDom, NodeId};
pub use selector::{SelectorList, SelectorTree};

/// Element operations needed by the page behaviours
///
/// Selector arguments are always static strings from the behaviour table or
/// derived from element attributes. An implementation treats an unparsable
/// selector as matching nothing.
pub trait Dom {
    type Node: Clone + PartialEq + fmt::Debug;

    // Queries

    fn query(&self, selector: &str) -> Option<Self::Node>;
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;
    /// Nearest inclusive ancestor matching `selector`
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;
    fn body(&self) -> Self::Node;
    fn head(&self) -> Self::Node;
    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;

    // Attributes, classes and styles

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&mut self, node: &Self::Node, class: &str);
    fn remove_class(&mut self, node: &Self::Node, class: &str);
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);
    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Flip `class` and return whether it is now present
    fn toggle_class(&mut self, node: &Self::Node, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    // Tree edits

    fn create_element(&mut self, tag: &str) -> Self::Node;
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);
    /// Insert `child` before `reference`, or append when `reference` is `None`
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
    fn remove(&mut self, node: &Self::Node);
    /// Whether the node is currently attached to the document
    fn is_connected(&self, node: &Self::Node) -> bool;

    // Forms

    /// Named controls of a form and their current values
    fn form_fields(&self, form: &Self::Node) -> Vec<(String, String)>;
    fn reset_form(&mut self, form: &Self::Node);

    // Geometry and scrolling

    fn offset_top(&self, node: &Self::Node) -> f64;
    fn offset_height(&self, node: &Self::Node) -> f64;
    /// Distance from the viewport top to the element's border box
    fn bounding_top(&self, node: &Self::Node) -> f64;
    fn scroll_y(&self) -> f64;
    /// Smooth-scroll the window to an absolute document offset
    fn scroll_to(&mut self, top: f64);

    // Host services

    fn hostname(&self) -> String;
    /// Milliseconds on a monotonic clock
    fn now_ms(&self) -> f64;
    /// Write a line to the page's console
    fn log(&mut self, line: &str);
    fn navigate(&mut self, url: &str);
    fn schedule(&mut self, delay: Duration, timer: Timer);
    /// Start reporting [`PageEvent::Intersect`](crate::event::PageEvent::Intersect)
    /// once `threshold` of the element is visible
    fn observe(&mut self, node: &Self::Node, threshold: f64);
    fn unobserve(&mut self, node: &Self::Node);

    /// Whether [`Dom::observe`] will ever report intersections
    fn supports_observer(&self) -> bool {
        true
    }
}

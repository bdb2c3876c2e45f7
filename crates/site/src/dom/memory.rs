//! In-memory [`Dom`] used by tests and headless callers

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::warn;

use super::selector::{SelectorList, SelectorTree};
use super::Dom;
use crate::event::Timer;

/// Handle to an element in a [`MemoryDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    offset_top: f64,
    height: f64,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    due_ms: u64,
    seq: u64,
    timer: Timer,
}

/// A small element tree with manual geometry and a manual clock
///
/// Geometry is whatever the test sets with [`MemoryDom::set_geometry`];
/// `bounding_top` is derived from it and the current scroll offset. Timers
/// only fire when [`MemoryDom::advance`] moves the clock past them.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    elements: Vec<Element>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    scroll_y: f64,
    hostname: String,
    navigations: Vec<String>,
    timers: Vec<PendingTimer>,
    now_ms: u64,
    timer_seq: u64,
    observed: Vec<(NodeId, f64)>,
    observer_supported: bool,
    console: Vec<String>,
}

impl MemoryDom {
    /// An empty document with `html`, `head` and `body`
    pub fn new() -> Self {
        let mut dom = Self {
            elements: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            scroll_y: 0.0,
            hostname: "example.com".to_string(),
            navigations: Vec::new(),
            timers: Vec::new(),
            now_ms: 0,
            timer_seq: 0,
            observed: Vec::new(),
            observer_supported: true,
            console: Vec::new(),
        };
        dom.root = dom.alloc("html");
        let root = dom.root;
        dom.head = dom.append(root, "head", &[]);
        dom.body = dom.append(root, "body", &[]);
        dom
    }

    /// Append a new element under `parent`; a `class` attribute is split into classes
    pub fn append(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.alloc(tag);
        for (name, value) in attributes {
            if *name == "class" {
                self.elements[node.0].classes = value.split_whitespace().map(String::from).collect();
            } else {
                self.elements[node.0]
                    .attributes
                    .insert((*name).to_string(), (*value).to_string());
            }
        }
        self.attach(parent, node, None);
        node
    }

    /// Set the document offset and height of an element
    pub fn set_geometry(&mut self, node: NodeId, offset_top: f64, height: f64) {
        let element = &mut self.elements[node.0];
        element.offset_top = offset_top;
        element.height = height;
    }

    /// Set the value of a form control
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.elements[node.0]
            .attributes
            .insert("value".to_string(), value.to_string());
    }

    /// Simulate the user scrolling without going through [`Dom::scroll_to`]
    pub fn set_scroll_y(&mut self, y: f64) {
        self.scroll_y = y;
    }

    pub fn set_hostname(&mut self, hostname: &str) {
        self.hostname = hostname.to_string();
    }

    /// Behave like a browser without `IntersectionObserver`
    pub fn disable_observer(&mut self) {
        self.observer_supported = false;
    }

    /// Lines written through [`Dom::log`]
    pub fn console(&self) -> &[String] {
        &self.console
    }

    /// URLs passed to [`Dom::navigate`], oldest first
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn count(&self, selector: &str) -> usize {
        self.query_all(selector).len()
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.elements[node.0].tag
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.elements[node.0].classes
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.elements[node.0].styles.get(property).map(String::as_str)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.elements[node.0].children
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.elements[node.0].parent
    }

    /// Elements currently observed for intersection, with their thresholds
    pub fn observed(&self) -> &[(NodeId, f64)] {
        &self.observed
    }

    pub fn is_observed(&self, node: NodeId) -> bool {
        self.observed.iter().any(|(n, _)| *n == node)
    }

    /// Timers not yet fired, in firing order
    pub fn pending_timers(&self) -> Vec<Timer> {
        let mut pending = self.timers.clone();
        pending.sort_by_key(|t| (t.due_ms, t.seq));
        pending.into_iter().map(|t| t.timer).collect()
    }

    /// Move the clock forward and return the timers that are now due, in order
    pub fn advance(&mut self, by: Duration) -> Vec<Timer> {
        self.now_ms += by.as_millis() as u64;
        let now = self.now_ms;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.due_ms <= now);
        self.timers = pending;
        due.sort_by_key(|t| (t.due_ms, t.seq));
        due.into_iter().map(|t| t.timer).collect()
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.elements.len());
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        });
        id
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.elements[node.0].parent.take() {
            self.elements[parent.0].children.retain(|c| *c != node);
        }
    }

    fn attach(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        self.detach(node);
        let siblings = &mut self.elements[parent.0].children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| *c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        self.elements[node.0].parent = Some(parent);
    }

    /// Connected elements in document order, starting at `from`
    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.elements[node.0].children.iter().rev().copied());
        }
        out
    }

    fn parse(&self, selector: &str) -> Option<SelectorList> {
        match SelectorList::parse(selector) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Selector view over the arena, kept separate so its method names do not
/// collide with [`Dom`] on `MemoryDom` itself
struct Tree<'a>(&'a MemoryDom);

impl SelectorTree for Tree<'_> {
    type Id = NodeId;

    fn tag(&self, id: NodeId) -> &str {
        &self.0.elements[id.0].tag
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.0.elements[id.0].attributes.get(name).map(String::as_str)
    }

    fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.0.elements[id.0].classes.iter().any(|c| c == class)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.0.elements[id.0].parent
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(list) = self.parse(selector) else {
            return Vec::new();
        };
        self.descendants(self.root)
            .into_iter()
            .filter(|n| list.matches(&Tree(self), *n))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        self.parse(selector)
            .is_some_and(|list| list.matches(&Tree(self), *node))
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let list = self.parse(selector)?;
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            if list.matches(&Tree(self), current) {
                return Some(current);
            }
            cursor = self.elements[current.0].parent;
        }
        None
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn head(&self) -> NodeId {
        self.head
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.elements[node.0].children.first().copied()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        if name == "class" {
            return Some(self.elements[node.0].classes.join(" "));
        }
        self.elements[node.0].attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if name == "class" {
            self.elements[node.0].classes = value.split_whitespace().map(String::from).collect();
            return;
        }
        self.elements[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.elements[node.0].classes.iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.elements[node.0].classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        self.elements[node.0].classes.retain(|c| c != class);
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        self.elements[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn text(&self, node: &NodeId) -> String {
        self.elements[node.0].text.clone()
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.elements[node.0].text = text.to_string();
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, None);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        self.attach(*parent, *child, reference.copied());
    }

    fn remove(&mut self, node: &NodeId) {
        self.detach(*node);
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut cursor = *node;
        loop {
            if cursor == self.root {
                return true;
            }
            match self.elements[cursor.0].parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    fn form_fields(&self, form: &NodeId) -> Vec<(String, String)> {
        self.descendants(*form)
            .into_iter()
            .filter(|n| matches!(self.elements[n.0].tag.as_str(), "input" | "textarea" | "select"))
            .filter_map(|n| {
                let element = &self.elements[n.0];
                let name = element.attributes.get("name")?;
                let value = element.attributes.get("value").cloned().unwrap_or_default();
                Some((name.clone(), value))
            })
            .collect()
    }

    fn reset_form(&mut self, form: &NodeId) {
        for node in self.descendants(*form) {
            let element = &mut self.elements[node.0];
            if element.attributes.contains_key("name") {
                element.attributes.remove("value");
            }
        }
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.elements[node.0].offset_top
    }

    fn offset_height(&self, node: &NodeId) -> f64 {
        self.elements[node.0].height
    }

    fn bounding_top(&self, node: &NodeId) -> f64 {
        self.elements[node.0].offset_top - self.scroll_y
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to(&mut self, top: f64) {
        self.scroll_y = top.max(0.0);
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn now_ms(&self) -> f64 {
        self.now_ms as f64
    }

    fn log(&mut self, line: &str) {
        self.console.push(line.to_string());
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) {
        self.timer_seq += 1;
        self.timers.push(PendingTimer {
            due_ms: self.now_ms + delay.as_millis() as u64,
            seq: self.timer_seq,
            timer,
        });
    }

    fn observe(&mut self, node: &NodeId, threshold: f64) {
        if !self.is_observed(*node) {
            self.observed.push((*node, threshold));
        }
    }

    fn unobserve(&mut self, node: &NodeId) {
        self.observed.retain(|(n, _)| n != node);
    }

    fn supports_observer(&self) -> bool {
        self.observer_supported
    }
}

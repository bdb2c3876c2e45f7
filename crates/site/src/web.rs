//! Browser binding: [`Dom`] over `web-sys` and the listener wiring
//!
//! One delegated listener per event type forwards to a shared [`Page`].
//! Timers and intersection observers call back into the same page, so
//! [`WebDom`] keeps a weak handle to it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_timers::callback::Timeout;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, HtmlElement, HtmlFormElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, Node, PerformanceObserver, PerformanceObserverEntryList,
    ScrollBehavior, ScrollToOptions, Window,
};

use crate::behavior::Behavior;
use crate::config::SiteConfig;
use crate::dom::Dom;
use crate::event::{Outcome, PageEvent, Timer};
use crate::page::Page;
use crate::perf::PerfMetric;

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

struct App {
    page: RefCell<Page<Element>>,
    dom: RefCell<WebDom>,
}

/// Deliver one event; an event raised while the page is busy is dropped
fn dispatch(app: &App, event: PageEvent<Element>) -> Outcome {
    let Ok(mut page) = app.page.try_borrow_mut() else {
        return Outcome::NONE;
    };
    let Ok(mut dom) = app.dom.try_borrow_mut() else {
        return Outcome::NONE;
    };
    page.handle(&mut *dom, event)
}

fn warn(context: &str, error: &JsValue) {
    web_sys::console::warn_2(&JsValue::from_str(context), error);
}

fn report(context: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        warn(context, &e);
    }
}

pub struct WebDom {
    window: Window,
    document: Document,
    head: Element,
    body: Element,
    /// Stands in for an element the document refused to create; a
    /// `template` never renders
    inert: Element,
    app: Weak<App>,
    observers: Vec<(f64, IntersectionObserver)>,
    observer_callbacks: Vec<ObserverCallback>,
}

impl WebDom {
    fn new(window: Window) -> Result<Self, JsValue> {
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let head: Element = document
            .head()
            .ok_or_else(|| JsValue::from_str("no head element"))?
            .into();
        let body: Element = document
            .body()
            .ok_or_else(|| JsValue::from_str("no body element"))?
            .into();
        let inert = document.create_element("template")?;
        Ok(Self {
            window,
            document,
            head,
            body,
            inert,
            app: Weak::new(),
            observers: Vec::new(),
            observer_callbacks: Vec::new(),
        })
    }

    fn observer(&mut self, threshold: f64) -> Option<IntersectionObserver> {
        if let Some((_, observer)) = self
            .observers
            .iter()
            .find(|(t, _)| (t - threshold).abs() < f64::EPSILON)
        {
            return Some(observer.clone());
        }

        let app = self.app.clone();
        let callback: ObserverCallback = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            let Some(app) = app.upgrade() else {
                return;
            };
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if entry.is_intersecting() {
                    dispatch(&app, PageEvent::Intersect(entry.target()));
                }
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(threshold));
        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                self.observers.push((threshold, observer.clone()));
                self.observer_callbacks.push(callback);
                Some(observer)
            }
            Err(e) => {
                warn("IntersectionObserver unavailable:", &e);
                None
            }
        }
    }

    fn html(node: &Element) -> Option<&HtmlElement> {
        node.dyn_ref::<HtmlElement>()
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn body(&self) -> Element {
        self.body.clone()
    }

    fn head(&self) -> Element {
        self.head.clone()
    }

    fn first_child(&self, node: &Element) -> Option<Element> {
        node.first_element_child()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        report("setAttribute failed:", node.set_attribute(name, value));
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        report("classList.add failed:", node.class_list().add_1(class));
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        report("classList.remove failed:", node.class_list().remove_1(class));
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        if let Some(html) = Self::html(node) {
            report("style.setProperty failed:", html.style().set_property(property, value));
        }
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn create_element(&mut self, tag: &str) -> Element {
        match self.document.create_element(tag) {
            Ok(element) => element,
            Err(e) => {
                warn("createElement failed:", &e);
                self.inert.clone()
            }
        }
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        report("appendChild failed:", parent.append_child(child).map(drop));
    }

    fn insert_before(&mut self, parent: &Element, child: &Element, reference: Option<&Element>) {
        let reference: Option<&Node> = reference.map(|r| r.as_ref());
        report("insertBefore failed:", parent.insert_before(child, reference).map(drop));
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn form_fields(&self, form: &Element) -> Vec<(String, String)> {
        let Some(form) = form.dyn_ref::<HtmlFormElement>() else {
            return Vec::new();
        };
        let Ok(data) = web_sys::FormData::new_with_form(form) else {
            return Vec::new();
        };
        let Ok(Some(entries)) = js_sys::try_iter(&data) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter_map(|pair| pair.dyn_into::<Array>().ok())
            .filter_map(|pair| Some((pair.get(0).as_string()?, pair.get(1).as_string()?)))
            .collect()
    }

    fn reset_form(&mut self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn offset_top(&self, node: &Element) -> f64 {
        Self::html(node).map_or(0.0, |h| f64::from(h.offset_top()))
    }

    fn offset_height(&self, node: &Element) -> f64 {
        Self::html(node).map_or(0.0, |h| f64::from(h.offset_height()))
    }

    fn bounding_top(&self, node: &Element) -> f64 {
        node.get_bounding_client_rect().top()
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&mut self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }

    fn now_ms(&self) -> f64 {
        self.window
            .performance()
            .map_or_else(js_sys::Date::now, |p| p.now())
    }

    fn log(&mut self, line: &str) {
        web_sys::console::log_1(&JsValue::from_str(line));
    }

    fn navigate(&mut self, url: &str) {
        report("navigation failed:", self.window.location().set_href(url));
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let app = self.app.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Timeout::new(millis, move || {
            if let Some(app) = app.upgrade() {
                dispatch(&app, PageEvent::Timer(timer));
            }
        })
        .forget();
    }

    fn observe(&mut self, node: &Element, threshold: f64) {
        if let Some(observer) = self.observer(threshold) {
            observer.observe(node);
        }
    }

    fn unobserve(&mut self, node: &Element) {
        for (_, observer) in &self.observers {
            observer.unobserve(node);
        }
    }

    fn supports_observer(&self) -> bool {
        Reflect::has(&self.window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
    }
}

fn listen(
    app: &Rc<App>,
    target: &web_sys::EventTarget,
    kind: &str,
    passive: bool,
    to_event: fn(&Event) -> Option<PageEvent<Element>>,
) -> Result<(), JsValue> {
    let app = Rc::clone(app);
    let callback = Closure::wrap(Box::new(move |event: Event| {
        let Some(page_event) = to_event(&event) else {
            return;
        };
        if dispatch(&app, page_event).prevent_default {
            event.prevent_default();
        }
    }) as Box<dyn FnMut(Event)>);

    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        callback.as_ref().unchecked_ref(),
        &options,
    )?;
    callback.forget();
    Ok(())
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn observe_performance(app: &Rc<App>, entry_type: &'static str) -> Result<(), JsValue> {
    let weak = Rc::downgrade(app);
    let callback = Closure::wrap(Box::new(move |list: PerformanceObserverEntryList, _: PerformanceObserver| {
        let Some(app) = weak.upgrade() else {
            return;
        };
        let entries = list.get_entries();
        let metrics: Vec<PerfMetric> = match entry_type {
            "largest-contentful-paint" => entries
                .iter()
                .last()
                .and_then(|entry| entry.dyn_into::<web_sys::PerformanceEntry>().ok())
                .map(|entry| PerfMetric::LargestContentfulPaint {
                    start_ms: entry.start_time(),
                })
                .into_iter()
                .collect(),
            _ => entries
                .iter()
                .filter_map(|entry| {
                    let start = Reflect::get(&entry, &JsValue::from_str("startTime")).ok()?.as_f64()?;
                    let processing = Reflect::get(&entry, &JsValue::from_str("processingStart"))
                        .ok()?
                        .as_f64()?;
                    Some(PerfMetric::FirstInputDelay {
                        delay_ms: processing - start,
                    })
                })
                .collect(),
        };
        for metric in metrics {
            dispatch(&app, PageEvent::Perf(metric));
        }
    }) as Box<dyn FnMut(PerformanceObserverEntryList, PerformanceObserver)>);

    let observer = PerformanceObserver::new(callback.as_ref().unchecked_ref())?;
    let init = Object::new();
    Reflect::set(&init, &JsValue::from_str("type"), &JsValue::from_str(entry_type))?;
    Reflect::set(&init, &JsValue::from_str("buffered"), &JsValue::TRUE)?;
    // `observe` takes the single-type form of the init dictionary, which
    // web-sys does not model; unsupported types only mean no metric
    let observe: Function = Reflect::get(&observer, &JsValue::from_str("observe"))?.dyn_into()?;
    if let Err(e) = observe.call1(&observer, &init) {
        warn("performance observer rejected entry type:", &e);
    }
    callback.forget();
    Ok(())
}

fn boot(window: Window, config: SiteConfig) -> Result<(), JsValue> {
    let dom = WebDom::new(window.clone())?;
    let document = dom.document.clone();
    let app = Rc::new(App {
        page: RefCell::new(Page::new(config)),
        dom: RefCell::new(dom),
    });
    app.dom.borrow_mut().app = Rc::downgrade(&app);

    {
        let mut page = app.page.borrow_mut();
        let mut dom = app.dom.borrow_mut();
        page.install(&mut *dom);
    }

    listen(&app, &document, "click", false, |e| target_element(e).map(PageEvent::Click))?;
    listen(&app, &document, "submit", false, |e| target_element(e).map(PageEvent::Submit))?;
    listen(&app, &document, "focusin", true, |e| target_element(e).map(PageEvent::Focus))?;
    listen(&app, &document, "focusout", true, |e| target_element(e).map(PageEvent::Blur))?;
    listen(&app, &window, "scroll", true, |_| Some(PageEvent::Scroll))?;

    if app.page.borrow().is_active(Behavior::PerfMonitor) {
        observe_performance(&app, "largest-contentful-paint")?;
        observe_performance(&app, "first-input")?;
    }
    Ok(())
}

/// Entry point run when the module is instantiated
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() != "loading" {
        return boot(window, SiteConfig::default());
    }

    let ready = Closure::once(move || {
        if let Err(e) = boot(window, SiteConfig::default()) {
            warn("page setup failed:", &e);
        }
    });
    let options = AddEventListenerOptions::new();
    options.set_once(true);
    document.add_event_listener_with_callback_and_add_event_listener_options(
        "DOMContentLoaded",
        ready.as_ref().unchecked_ref(),
        &options,
    )?;
    ready.forget();
    Ok(())
}

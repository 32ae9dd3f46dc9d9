//! `web-sys` host and the page entry point
//!
//! Only compiled on `wasm32` targets.

use std::io;
use std::rc::Rc;
use std::time::Duration;

use js_sys::{Function, Object, Promise, Reflect};
use libblogsphere::api::http::HttpTransport;
use libblogsphere::error::StorageError;
use libblogsphere::host::{Dom, ScrollMetrics, Selector, ShareData, Window};
use libblogsphere::render::{fragment_html, Node};
use libblogsphere::{ApiTransport, App};
use tracing::{debug, info, warn, Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    AddEventListenerOptions, Document, DocumentReadyState, Element, Event, EventTarget,
    HtmlElement, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent, NodeList,
    ScrollBehavior, ScrollToOptions, Storage,
};

use crate::listeners::{translate, KeyPress, ListenOn, Listener, LISTENERS};
use crate::offsets::{char_to_utf16, utf16_to_char};
use crate::setup::{self, CONFIG_SCRIPT_ID, LOG_LEVEL_ATTR};

fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!("panic at {}:{}:{}: {info}", loc.file(), loc.line(), loc.column()),
                None => format!("panic: {info}"),
            };
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

// === Console logging ===

/// Routes formatted log lines to the browser console
#[derive(Debug, Clone, Copy)]
struct Console;

/// One buffered log line, emitted on drop at the matching console level
struct ConsoleLine {
    level: Level,
    buffer: Vec<u8>,
}

impl io::Write for ConsoleLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleLine {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buffer);
        let line = JsValue::from_str(text.trim_end());

        if self.level == Level::ERROR {
            web_sys::console::error_1(&line);
        } else if self.level == Level::WARN {
            web_sys::console::warn_1(&line);
        } else if self.level == Level::INFO {
            web_sys::console::info_1(&line);
        } else {
            web_sys::console::debug_1(&line);
        }
    }
}

impl<'a> MakeWriter<'a> for Console {
    type Writer = ConsoleLine;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleLine {
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleLine {
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}

// === Host ===

/// The live page, seen through `web-sys`
pub struct BrowserHost {
    window: web_sys::Window,
    document: Document,
}

impl BrowserHost {
    fn new(window: web_sys::Window, document: Document) -> Self {
        Self { window, document }
    }

    fn collect(list: NodeList) -> Vec<Element> {
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn selection_range(element: &Element) -> Option<(u32, u32)> {
        if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            return Some((area.selection_start().ok()??, area.selection_end().ok()??));
        }
        let input = element.dyn_ref::<HtmlInputElement>()?;
        Some((input.selection_start().ok()??, input.selection_end().ok()??))
    }

    fn navigator(&self) -> Option<JsValue> {
        Reflect::get(&self.window, &JsValue::from_str("navigator"))
            .ok()
            .filter(|navigator| !navigator.is_undefined())
    }

    fn local_storage(&self) -> Result<Storage, StorageError> {
        match self.window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(StorageError::Unavailable("localStorage is missing".to_string())),
            Err(error) => Err(StorageError::Unavailable(js_error(&error))),
        }
    }
}

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// Await a browser promise in the background, logging a rejection
fn settle(result: JsValue, action: &'static str) {
    if let Ok(promise) = result.dyn_into::<Promise>() {
        spawn_local(async move {
            if let Err(error) = JsFuture::from(promise).await {
                debug!(action, error = %js_error(&error), "Browser promise rejected");
            }
        });
    }
}

impl Dom for BrowserHost {
    type Element = Element;
    type Markup = String;

    fn query_all(&self, scope: Option<&Element>, selector: &Selector) -> Vec<Element> {
        let css = selector.to_css();
        let list = match scope {
            Some(scope) => scope.query_selector_all(&css),
            None => self.document.query_selector_all(&css),
        };
        match list {
            Ok(list) => Self::collect(list),
            Err(error) => {
                warn!(selector = %css, error = %js_error(&error), "Selector rejected");
                Vec::new()
            }
        }
    }

    fn matches(&self, element: &Element, selector: &Selector) -> bool {
        element.matches(&selector.to_css()).unwrap_or(false)
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn closest(&self, element: &Element, selector: &Selector) -> Option<Element> {
        element.closest(&selector.to_css()).ok().flatten()
    }

    fn siblings(&self, element: &Element, selector: &Selector) -> Vec<Element> {
        let Some(parent) = element.parent_element() else {
            return Vec::new();
        };
        let css = selector.to_css();

        let mut siblings = Vec::new();
        let mut child = parent.first_element_child();
        while let Some(current) = child {
            if current != *element && current.matches(&css).unwrap_or(false) {
                siblings.push(current.clone());
            }
            child = current.next_element_sibling();
        }
        siblings
    }

    fn value(&self, element: &Element) -> String {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            element.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_value(&self, element: &Element, value: &str) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else {
            let _ = element.set_attribute("value", value);
        }
    }

    fn text(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn set_text(&self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn attr(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attr(&self, element: &Element, name: &str, value: &str) {
        if let Err(error) = element.set_attribute(name, value) {
            debug!(name, error = %js_error(&error), "Attribute not set");
        }
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn add_class(&self, element: &Element, class: &str) {
        let _ = element.class_list().add_1(class);
    }

    fn remove_class(&self, element: &Element, class: &str) {
        let _ = element.class_list().remove_1(class);
    }

    fn style(&self, element: &Element, property: &str) -> Option<String> {
        element
            .dyn_ref::<HtmlElement>()
            .and_then(|element| element.style().get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn set_style(&self, element: &Element, property: &str, value: &str) {
        let Some(element) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = element.style();
        if value.is_empty() {
            let _ = style.remove_property(property);
        } else {
            let _ = style.set_property(property, value);
        }
    }

    fn is_disabled(&self, element: &Element) -> bool {
        element.has_attribute("disabled")
    }

    fn set_disabled(&self, element: &Element, disabled: bool) {
        if disabled {
            let _ = element.set_attribute("disabled", "");
        } else {
            let _ = element.remove_attribute("disabled");
        }
    }

    fn focus(&self, element: &Element) {
        if let Some(element) = element.dyn_ref::<HtmlElement>() {
            let _ = element.focus();
        }
    }

    fn scroll_height(&self, element: &Element) -> f64 {
        f64::from(element.scroll_height())
    }

    fn offset_top(&self, element: &Element) -> f64 {
        element.get_bounding_client_rect().top() + self.window.scroll_y().unwrap_or(0.0)
    }

    fn selection(&self, element: &Element) -> (usize, usize) {
        let value = self.value(element);
        match Self::selection_range(element) {
            Some((start, end)) => (utf16_to_char(&value, start), utf16_to_char(&value, end)),
            None => {
                let len = value.chars().count();
                (len, len)
            }
        }
    }

    fn set_selection(&self, element: &Element, start: usize, end: usize) {
        let value = self.value(element);
        let (start, end) = (char_to_utf16(&value, start), char_to_utf16(&value, end));
        if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            let _ = area.set_selection_range(start, end);
        } else if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let _ = input.set_selection_range(start, end);
        }
    }

    fn markup(&self, element: &Element) -> String {
        element.inner_html()
    }

    fn restore_markup(&self, element: &Element, markup: &String) {
        element.set_inner_html(markup);
    }

    fn set_content(&self, element: &Element, nodes: &[Node]) {
        element.set_inner_html(&fragment_html(nodes));
    }

    // Inserted fragments are always single elements, so the new element is
    // the adjacent element child.

    fn prepend(&self, parent: &Element, node: &Node) -> Option<Element> {
        parent.insert_adjacent_html("afterbegin", &node.to_html()).ok()?;
        parent.first_element_child()
    }

    fn append(&self, parent: &Element, node: &Node) -> Option<Element> {
        parent.insert_adjacent_html("beforeend", &node.to_html()).ok()?;
        parent.last_element_child()
    }

    fn insert_after(&self, reference: &Element, node: &Node) -> Option<Element> {
        reference.insert_adjacent_html("afterend", &node.to_html()).ok()?;
        reference.next_element_sibling()
    }

    fn remove(&self, element: &Element) {
        element.remove();
    }
}

impl Window for BrowserHost {
    fn alert(&self, message: &str) {
        let _ = self.window.alert_with_message(message);
    }

    fn confirm(&self, message: &str) -> bool {
        self.window.confirm_with_message(message).unwrap_or(false)
    }

    fn navigate(&self, url: &str) {
        if let Err(error) = self.window.location().set_href(url) {
            warn!(url, error = %js_error(&error), "Navigation failed");
        }
    }

    fn submit_form(&self, method: &str, action: &str) {
        let form = match self
            .document
            .create_element("form")
            .map(JsCast::unchecked_into::<HtmlFormElement>)
        {
            Ok(form) => form,
            Err(error) => {
                warn!(error = %js_error(&error), "Could not build form");
                return;
            }
        };
        form.set_method(method);
        form.set_action(action);
        let _ = form.style().set_property("display", "none");

        if let Some(body) = self.document.body() {
            let _ = body.append_child(&form);
        }
        if let Err(error) = form.submit() {
            warn!(action, error = %js_error(&error), "Form submission failed");
        }
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        let callback = Closure::once_into_js(move || callback());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(error) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            warn!(error = %js_error(&error), "Timer not scheduled");
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.window.scroll_y().unwrap_or(0.0),
            scroll_height: self
                .document
                .document_element()
                .map(|root| f64::from(root.scroll_height()))
                .unwrap_or(0.0),
            client_height: self
                .window
                .inner_height()
                .ok()
                .and_then(|height| height.as_f64())
                .unwrap_or(0.0),
        }
    }

    /// Smooth scroll; the browser picks the animation length
    fn scroll_to(&self, top: f64, _duration: Duration) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn location_path(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn location_origin(&self) -> String {
        self.window.location().origin().unwrap_or_default()
    }

    fn storage_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.local_storage()?
            .get_item(key)
            .map_err(|error| StorageError::Unavailable(js_error(&error)))
    }

    fn storage_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.local_storage()?
            .set_item(key, value)
            .map_err(|error| StorageError::Write {
                key: key.to_string(),
                reason: js_error(&error),
            })
    }

    fn share(&self, data: &ShareData) -> bool {
        let Some(navigator) = self.navigator() else {
            return false;
        };
        let Some(share) = method(&navigator, "share") else {
            return false;
        };

        let payload = Object::new();
        for (key, value) in [("title", &data.title), ("text", &data.text), ("url", &data.url)] {
            let _ = Reflect::set(&payload, &JsValue::from_str(key), &JsValue::from_str(value));
        }

        match share.call1(&navigator, &payload) {
            Ok(result) => {
                settle(result, "share");
                true
            }
            Err(error) => {
                debug!(error = %js_error(&error), "Share sheet refused");
                false
            }
        }
    }

    fn copy_to_clipboard(&self, text: &str) -> bool {
        let Some(navigator) = self.navigator() else {
            return false;
        };
        let Some(clipboard) = Reflect::get(&navigator, &JsValue::from_str("clipboard"))
            .ok()
            .filter(|clipboard| !clipboard.is_undefined())
        else {
            return false;
        };
        let Some(write_text) = method(&clipboard, "writeText") else {
            return false;
        };

        match write_text.call1(&clipboard, &JsValue::from_str(text)) {
            Ok(result) => {
                settle(result, "clipboard");
                true
            }
            Err(_) => false,
        }
    }
}

// === Entry point ===

/// Module entry: configure logging, build the app and attach it to the page
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    install_panic_hook();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let script = document.get_element_by_id(CONFIG_SCRIPT_ID);
    let level = script.as_ref().and_then(|s| s.get_attribute(LOG_LEVEL_ATTR));
    setup::logging_config(level.as_deref()).init_with_writer(Console);

    let origin = window.location().origin()?;
    let embedded = script.and_then(|s| s.text_content());
    let config = setup::page_config(embedded.as_deref(), &origin)
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;

    let host = Rc::new(BrowserHost::new(window, document.clone()));
    let transport: Rc<dyn ApiTransport> = Rc::new(HttpTransport::new());
    let app = Rc::new(App::new(Rc::clone(&host), config, transport));

    if document.ready_state() == DocumentReadyState::Loading {
        let on_ready = Closure::once_into_js(move || attach(&app, &host));
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
    } else {
        attach(&app, &host);
    }
    Ok(())
}

fn attach(app: &Rc<App<BrowserHost>>, host: &BrowserHost) {
    app.boot();
    for listener in LISTENERS {
        if let Err(error) = listen(app, host, listener) {
            warn!(event = listener.event_type, error = %js_error(&error), "Listener not installed");
        }
    }
    info!(listeners = LISTENERS.len(), "BlogSphere attached");
}

fn listen(app: &Rc<App<BrowserHost>>, host: &BrowserHost, listener: Listener) -> Result<(), JsValue> {
    let app = Rc::clone(app);
    let handler =
        Closure::<dyn FnMut(Event)>::new(move |event: Event| handle(&app, listener, &event));

    let options = AddEventListenerOptions::new();
    options.set_capture(listener.capture);
    options.set_passive(listener.passive);

    let target: &EventTarget = match listener.on {
        ListenOn::Document => &host.document,
        ListenOn::Window => &host.window,
    };
    target.add_event_listener_with_callback_and_add_event_listener_options(
        listener.event_type,
        handler.as_ref().unchecked_ref(),
        &options,
    )?;

    // Page-lifetime listener
    handler.forget();
    Ok(())
}

fn handle(app: &App<BrowserHost>, listener: Listener, event: &Event) {
    let target = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    let key = event.dyn_ref::<KeyboardEvent>().map(|key| KeyPress {
        key: key.key(),
        ctrl: key.ctrl_key(),
    });

    let Some(ui_event) = translate(listener.event_type, target, key) else {
        return;
    };

    let dispatch = app.dispatch(ui_event);
    if dispatch.outcome.is_prevented() && !listener.passive {
        event.prevent_default();
    }
    if let Some(task) = dispatch.task {
        spawn_local(task);
    }
}

//! In-memory host implementation
//!
//! A small element tree plus scripted window behaviour: alerts and
//! navigations are recorded, confirmation answers are queued, timers run when
//! the manual clock is advanced, and local storage is a map. It is available
//! for all builds so integration tests and headless drivers can exercise the
//! controllers without a browser.
//!
//! # Example
//!
//! ```
//! use libblogsphere::host::memory::MemoryHost;
//! use libblogsphere::host::Dom;
//! use libblogsphere::render::Element;
//!
//! let host = MemoryHost::new();
//! let body = host.body();
//! host.append(&body, &Element::new("span").id("like-count").text("3").into());
//!
//! let count = host.by_id("like-count").unwrap();
//! assert_eq!(host.text(&count), "3");
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Duration;

use crate::error::StorageError;
use crate::host::{Dom, ScrollMetrics, Selector, ShareData, Window};
use crate::render::{Element, Node};

/// Handle to a node in a [`MemoryHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Height, in pixels, of one line of text in a field
pub const LINE_HEIGHT_PX: f64 = 24.0;

const ROOT: NodeId = NodeId(0);
const BODY: NodeId = NodeId(1);

#[derive(Debug, Clone)]
enum Kind {
    Element(ElementData),
    Text(String),
    LineBreak,
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    value: String,
    disabled: bool,
    offset_top: f64,
    selection: (usize, usize),
}

#[derive(Debug, Clone)]
struct Slot {
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Timer {
    due: Duration,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

/// A recorded call to [`Window::scroll_to`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
    pub duration: Duration,
}

/// In-memory document and window
pub struct MemoryHost {
    nodes: RefCell<Vec<Slot>>,
    focused: Cell<Option<NodeId>>,

    alerts: RefCell<Vec<String>>,
    confirms: RefCell<Vec<String>>,
    confirm_answers: RefCell<VecDeque<bool>>,
    default_confirm: Cell<bool>,
    navigations: RefCell<Vec<String>>,
    form_submissions: RefCell<Vec<(String, String)>>,

    now: Cell<Duration>,
    next_timer: Cell<u64>,
    timers: RefCell<Vec<Timer>>,

    scroll: Cell<ScrollMetrics>,
    scroll_requests: RefCell<Vec<ScrollRequest>>,

    origin: RefCell<String>,
    path: RefCell<String>,

    storage: RefCell<HashMap<String, String>>,
    storage_available: Cell<bool>,

    share_supported: Cell<bool>,
    shares: RefCell<Vec<ShareData>>,
    clipboard: RefCell<Option<String>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Empty `<html><body></body></html>` page at `http://localhost/`
    pub fn new() -> Self {
        let root = Slot {
            kind: Kind::Element(ElementData {
                tag: "html".to_string(),
                ..Default::default()
            }),
            parent: None,
            children: vec![BODY],
        };
        let body = Slot {
            kind: Kind::Element(ElementData {
                tag: "body".to_string(),
                ..Default::default()
            }),
            parent: Some(ROOT),
            children: Vec::new(),
        };

        Self {
            nodes: RefCell::new(vec![root, body]),
            focused: Cell::new(None),
            alerts: RefCell::new(Vec::new()),
            confirms: RefCell::new(Vec::new()),
            confirm_answers: RefCell::new(VecDeque::new()),
            default_confirm: Cell::new(true),
            navigations: RefCell::new(Vec::new()),
            form_submissions: RefCell::new(Vec::new()),
            now: Cell::new(Duration::ZERO),
            next_timer: Cell::new(0),
            timers: RefCell::new(Vec::new()),
            scroll: Cell::new(ScrollMetrics::default()),
            scroll_requests: RefCell::new(Vec::new()),
            origin: RefCell::new("http://localhost".to_string()),
            path: RefCell::new("/".to_string()),
            storage: RefCell::new(HashMap::new()),
            storage_available: Cell::new(true),
            share_supported: Cell::new(false),
            shares: RefCell::new(Vec::new()),
            clipboard: RefCell::new(None),
        }
    }

    pub fn body(&self) -> NodeId {
        BODY
    }

    // === Fixture helpers ===

    /// Append a fragment to the body and return its root
    pub fn mount(&self, node: impl Into<Node>) -> NodeId {
        self.build(BODY, &node.into(), None)
    }

    pub fn set_location(&self, origin: &str, path: &str) {
        *self.origin.borrow_mut() = origin.to_string();
        *self.path.borrow_mut() = path.to_string();
    }

    pub fn set_scroll(&self, metrics: ScrollMetrics) {
        self.scroll.set(metrics);
    }

    pub fn set_offset_top(&self, element: &NodeId, top: f64) {
        self.with_element_mut(element, |data| data.offset_top = top);
    }

    /// Queue the answer for the next confirmation prompt
    pub fn answer_confirm(&self, answer: bool) {
        self.confirm_answers.borrow_mut().push_back(answer);
    }

    /// Answer used when no queued answer is left
    pub fn set_default_confirm(&self, answer: bool) {
        self.default_confirm.set(answer);
    }

    pub fn set_storage_available(&self, available: bool) {
        self.storage_available.set(available);
    }

    pub fn set_share_supported(&self, supported: bool) {
        self.share_supported.set(supported);
    }

    // === Inspection ===

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn last_alert(&self) -> Option<String> {
        self.alerts.borrow().last().cloned()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.confirms.borrow().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    /// `(method, action)` of every full-page form submission
    pub fn form_submissions(&self) -> Vec<(String, String)> {
        self.form_submissions.borrow().clone()
    }

    pub fn scroll_requests(&self) -> Vec<ScrollRequest> {
        self.scroll_requests.borrow().clone()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.get()
    }

    pub fn shares(&self) -> Vec<ShareData> {
        self.shares.borrow().clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.borrow().clone()
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.storage.borrow().get(key).cloned()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Whether the element is still attached to the document
    pub fn is_attached(&self, element: &NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = *element;
        loop {
            if current == ROOT {
                return true;
            }
            match nodes.get(current.0).and_then(|slot| slot.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Not hidden through `display: none`
    pub fn is_visible(&self, element: &NodeId) -> bool {
        self.style(element, "display").as_deref() != Some("none")
    }

    pub fn classes(&self, element: &NodeId) -> Vec<String> {
        self.with_element(element, |data| data.classes.clone())
            .unwrap_or_default()
    }

    /// Serialized markup of the element and its subtree
    pub fn html(&self, element: &NodeId) -> String {
        self.to_node(*element).to_html()
    }

    // === Clock ===

    /// Move the clock forward, running due timers in order
    ///
    /// Timers scheduled by a running callback fire in the same call when they
    /// fall due before the target time.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let position = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.seq))
                    .map(|(i, _)| i);
                position.map(|i| timers.remove(i))
            };

            match next {
                Some(timer) => {
                    self.now.set(timer.due);
                    (timer.callback)();
                }
                None => break,
            }
        }
        self.now.set(target);
    }

    // === Internals ===

    fn with_element<R>(&self, id: &NodeId, f: impl FnOnce(&ElementData) -> R) -> Option<R> {
        let nodes = self.nodes.borrow();
        match nodes.get(id.0).map(|slot| &slot.kind) {
            Some(Kind::Element(data)) => Some(f(data)),
            _ => None,
        }
    }

    fn with_element_mut<R>(
        &self,
        id: &NodeId,
        f: impl FnOnce(&mut ElementData) -> R,
    ) -> Option<R> {
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(id.0).map(|slot| &mut slot.kind) {
            Some(Kind::Element(data)) => Some(f(data)),
            _ => None,
        }
    }

    /// Create the subtree for `node` and attach it under `parent` at `index`
    /// (or at the end)
    fn build(&self, parent: NodeId, node: &Node, index: Option<usize>) -> NodeId {
        let id = self.alloc(node, Some(parent));
        let mut nodes = self.nodes.borrow_mut();
        let siblings = &mut nodes[parent.0].children;
        match index {
            Some(i) => siblings.insert(i.min(siblings.len()), id),
            None => siblings.push(id),
        }
        id
    }

    fn alloc(&self, node: &Node, parent: Option<NodeId>) -> NodeId {
        let kind = match node {
            Node::Text(text) => Kind::Text(text.clone()),
            Node::LineBreak => Kind::LineBreak,
            Node::Element(element) => Kind::Element(element_data(element)),
        };

        let id = {
            let mut nodes = self.nodes.borrow_mut();
            nodes.push(Slot {
                kind,
                parent,
                children: Vec::new(),
            });
            NodeId(nodes.len() - 1)
        };

        if let Node::Element(element) = node {
            let children: Vec<NodeId> = element
                .children
                .iter()
                .map(|child| self.alloc(child, Some(id)))
                .collect();
            self.nodes.borrow_mut()[id.0].children = children;
        }
        id
    }

    fn detach(&self, id: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[id.0].parent.take() {
            nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn to_node(&self, id: NodeId) -> Node {
        let nodes = self.nodes.borrow();
        to_node_in(&nodes, id)
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(nodes[id.0].children.iter().rev().copied());
        }
        out
    }
}

fn element_data(element: &Element) -> ElementData {
    let mut attrs: BTreeMap<String, String> = element.attrs.iter().cloned().collect();
    let value = attrs.remove("value").unwrap_or_default();
    let disabled = attrs.remove("disabled").is_some();
    let value = if element.tag == "textarea" && value.is_empty() {
        element
            .children
            .iter()
            .map(Node::text_content)
            .collect::<String>()
    } else {
        value
    };
    let len = value.chars().count();

    ElementData {
        tag: element.tag.to_ascii_lowercase(),
        id: element.id.clone(),
        classes: element.classes.clone(),
        attrs,
        styles: BTreeMap::new(),
        value,
        disabled,
        offset_top: 0.0,
        selection: (len, len),
    }
}

fn to_node_in(nodes: &[Slot], id: NodeId) -> Node {
    let slot = &nodes[id.0];
    match &slot.kind {
        Kind::Text(text) => Node::Text(text.clone()),
        Kind::LineBreak => Node::LineBreak,
        Kind::Element(data) => {
            let mut attrs: Vec<(String, String)> = data
                .attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !data.styles.is_empty() {
                let style = data
                    .styles
                    .iter()
                    .map(|(k, v)| format!("{}: {};", k, v))
                    .collect::<Vec<_>>()
                    .join(" ");
                attrs.push(("style".to_string(), style));
            }
            if data.disabled {
                attrs.push(("disabled".to_string(), String::new()));
            }
            Node::Element(Element {
                tag: data.tag.clone(),
                id: data.id.clone(),
                classes: data.classes.clone(),
                attrs,
                children: slot
                    .children
                    .iter()
                    .map(|child| to_node_in(nodes, *child))
                    .collect(),
            })
        }
    }
}

fn text_in(nodes: &[Slot], id: NodeId, out: &mut String) {
    match &nodes[id.0].kind {
        Kind::Text(text) => out.push_str(text),
        Kind::LineBreak => {}
        Kind::Element(_) => {
            for child in &nodes[id.0].children {
                text_in(nodes, *child, out);
            }
        }
    }
}

fn element_matches(data: &ElementData, selector: &Selector) -> bool {
    if let Some(tag) = &selector.tag {
        if !data.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &selector.id {
        if data.id.as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !selector
        .classes
        .iter()
        .all(|class| data.classes.contains(class))
    {
        return false;
    }
    selector.attrs.iter().all(|(name, expected)| {
        let actual = match name.as_str() {
            "value" => Some(data.value.clone()),
            "disabled" => data.disabled.then(String::new),
            _ => data.attrs.get(name).cloned(),
        };
        match (actual, expected) {
            (Some(actual), Some(expected)) => actual == *expected,
            (Some(_), None) => true,
            (None, _) => false,
        }
    })
}

impl Dom for MemoryHost {
    type Element = NodeId;
    type Markup = Vec<Node>;

    fn query_all(&self, scope: Option<&NodeId>, selector: &Selector) -> Vec<NodeId> {
        let candidates = self.descendants(scope.copied().unwrap_or(ROOT));
        let nodes = self.nodes.borrow();
        candidates
            .into_iter()
            .filter(|id| match &nodes[id.0].kind {
                Kind::Element(data) => element_matches(data, selector),
                _ => false,
            })
            .collect()
    }

    fn matches(&self, element: &NodeId, selector: &Selector) -> bool {
        self.with_element(element, |data| element_matches(data, selector))
            .unwrap_or(false)
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(element.0).and_then(|slot| slot.parent)
    }

    fn siblings(&self, element: &NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(parent) = self.parent(element) else {
            return Vec::new();
        };
        let children = self.nodes.borrow()[parent.0].children.clone();
        children
            .into_iter()
            .filter(|child| child != element && self.matches(child, selector))
            .collect()
    }

    fn value(&self, element: &NodeId) -> String {
        self.with_element(element, |data| data.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, element: &NodeId, value: &str) {
        self.with_element_mut(element, |data| {
            data.value = value.to_string();
            let len = value.chars().count();
            data.selection = (len, len);
        });
    }

    fn text(&self, element: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        text_in(&nodes, *element, &mut out);
        out
    }

    fn set_text(&self, element: &NodeId, text: &str) {
        self.set_content(element, &[Node::text(text)]);
    }

    fn attr(&self, element: &NodeId, name: &str) -> Option<String> {
        self.with_element(element, |data| match name {
            "id" => data.id.clone(),
            "class" => Some(data.classes.join(" ")),
            _ => data.attrs.get(name).cloned(),
        })
        .flatten()
    }

    fn set_attr(&self, element: &NodeId, name: &str, value: &str) {
        self.with_element_mut(element, |data| match name {
            "id" => data.id = Some(value.to_string()),
            "class" => {
                data.classes = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {
                data.attrs.insert(name.to_string(), value.to_string());
            }
        });
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        self.with_element(element, |data| data.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&self, element: &NodeId, class: &str) {
        self.with_element_mut(element, |data| {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        });
    }

    fn remove_class(&self, element: &NodeId, class: &str) {
        self.with_element_mut(element, |data| data.classes.retain(|c| c != class));
    }

    fn style(&self, element: &NodeId, property: &str) -> Option<String> {
        self.with_element(element, |data| data.styles.get(property).cloned())
            .flatten()
    }

    fn set_style(&self, element: &NodeId, property: &str, value: &str) {
        self.with_element_mut(element, |data| {
            if value.is_empty() {
                data.styles.remove(property);
            } else {
                data.styles.insert(property.to_string(), value.to_string());
            }
        });
    }

    fn is_disabled(&self, element: &NodeId) -> bool {
        self.with_element(element, |data| data.disabled)
            .unwrap_or(false)
    }

    fn set_disabled(&self, element: &NodeId, disabled: bool) {
        self.with_element_mut(element, |data| data.disabled = disabled);
    }

    fn focus(&self, element: &NodeId) {
        self.focused.set(Some(*element));
    }

    fn scroll_height(&self, element: &NodeId) -> f64 {
        self.with_element(element, |data| {
            let lines = data.value.split('\n').count().max(1);
            lines as f64 * LINE_HEIGHT_PX
        })
        .unwrap_or(0.0)
    }

    fn offset_top(&self, element: &NodeId) -> f64 {
        self.with_element(element, |data| data.offset_top)
            .unwrap_or(0.0)
    }

    fn selection(&self, element: &NodeId) -> (usize, usize) {
        self.with_element(element, |data| data.selection)
            .unwrap_or((0, 0))
    }

    fn set_selection(&self, element: &NodeId, start: usize, end: usize) {
        self.with_element_mut(element, |data| {
            let len = data.value.chars().count();
            let start = start.min(len);
            data.selection = (start, end.clamp(start, len));
        });
    }

    fn markup(&self, element: &NodeId) -> Vec<Node> {
        let nodes = self.nodes.borrow();
        nodes[element.0]
            .children
            .iter()
            .map(|child| to_node_in(&nodes, *child))
            .collect()
    }

    fn restore_markup(&self, element: &NodeId, markup: &Vec<Node>) {
        self.set_content(element, markup);
    }

    fn set_content(&self, element: &NodeId, nodes: &[Node]) {
        let old = std::mem::take(&mut self.nodes.borrow_mut()[element.0].children);
        {
            let mut all = self.nodes.borrow_mut();
            for child in old {
                all[child.0].parent = None;
            }
        }
        for node in nodes {
            self.build(*element, node, None);
        }
    }

    fn prepend(&self, parent: &NodeId, node: &Node) -> Option<NodeId> {
        Some(self.build(*parent, node, Some(0)))
    }

    fn append(&self, parent: &NodeId, node: &Node) -> Option<NodeId> {
        Some(self.build(*parent, node, None))
    }

    fn insert_after(&self, reference: &NodeId, node: &Node) -> Option<NodeId> {
        let parent = self.parent(reference)?;
        let index = self.nodes.borrow()[parent.0]
            .children
            .iter()
            .position(|child| child == reference)?;
        Some(self.build(parent, node, Some(index + 1)))
    }

    fn remove(&self, element: &NodeId) {
        if *element != ROOT && *element != BODY {
            self.detach(*element);
        }
    }
}

impl Window for MemoryHost {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms.borrow_mut().push(message.to_string());
        self.confirm_answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.default_confirm.get())
    }

    fn navigate(&self, url: &str) {
        self.navigations.borrow_mut().push(url.to_string());
    }

    fn submit_form(&self, method: &str, action: &str) {
        self.form_submissions
            .borrow_mut()
            .push((method.to_string(), action.to_string()));
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        let seq = self.next_timer.get();
        self.next_timer.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            due: self.now.get() + delay,
            seq,
            callback,
        });
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.scroll.get()
    }

    fn scroll_to(&self, top: f64, duration: Duration) {
        self.scroll_requests
            .borrow_mut()
            .push(ScrollRequest { top, duration });
        let mut metrics = self.scroll.get();
        metrics.scroll_top = top.max(0.0);
        self.scroll.set(metrics);
    }

    fn location_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn location_origin(&self) -> String {
        self.origin.borrow().clone()
    }

    fn storage_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if !self.storage_available.get() {
            return Err(StorageError::Unavailable("disabled".to_string()));
        }
        Ok(self.storage.borrow().get(key).cloned())
    }

    fn storage_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.storage_available.get() {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "storage disabled".to_string(),
            });
        }
        self.storage
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn share(&self, data: &ShareData) -> bool {
        if !self.share_supported.get() {
            return false;
        }
        self.shares.borrow_mut().push(data.clone());
        true
    }

    fn copy_to_clipboard(&self, text: &str) -> bool {
        *self.clipboard.borrow_mut() = Some(text.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn fixture() -> MemoryHost {
        let host = MemoryHost::new();
        host.mount(
            Element::new("form")
                .id("login-form")
                .child(
                    Element::new("div").class("mb-3").child(
                        Element::new("input")
                            .id("username")
                            .class("form-control")
                            .attr("name", "username")
                            .attr("value", "bob"),
                    ),
                )
                .child(
                    Element::new("button")
                        .attr("type", "submit")
                        .text("Log in"),
                ),
        );
        host
    }

    #[test]
    fn test_query_by_id_class_and_attr() {
        let host = fixture();
        let input = host.by_id("username").unwrap();
        assert_eq!(host.value(&input), "bob");

        let form = host.by_id("login-form").unwrap();
        let by_name = host.query_in(&form, &Selector::name("username")).unwrap();
        assert_eq!(by_name, input);

        let button = host
            .query_in(&form, &Selector::tag("button").with_attr("type", "submit"))
            .unwrap();
        assert_eq!(host.text(&button), "Log in");
        assert!(host.query(&Selector::class("missing")).is_none());
    }

    #[test]
    fn test_query_excludes_scope_itself() {
        let host = fixture();
        let form = host.by_id("login-form").unwrap();
        assert!(host.query_all(Some(&form), &Selector::tag("form")).is_empty());
    }

    #[test]
    fn test_closest_and_siblings() {
        let host = fixture();
        let input = host.by_id("username").unwrap();
        let group = host.closest(&input, &Selector::class("mb-3")).unwrap();
        assert!(host.has_class(&group, "mb-3"));

        host.insert_after(&input, &Element::new("div").class("invalid-feedback").into());
        let feedback = host.siblings(&input, &Selector::class("invalid-feedback"));
        assert_eq!(feedback.len(), 1);
    }

    #[test]
    fn test_prepend_and_remove() {
        let host = MemoryHost::new();
        let list = host.mount(Element::new("div").id("comments-list"));
        host.append(&list, &Element::new("p").id("old").into());
        let new = host.prepend(&list, &Element::new("p").id("new").into()).unwrap();

        let items = host.query_all(Some(&list), &Selector::tag("p"));
        assert_eq!(items[0], new);

        host.remove(&new);
        assert!(!host.is_attached(&new));
        assert!(host.by_id("new").is_none());
        assert!(host.by_id("old").is_some());
    }

    #[test]
    fn test_markup_round_trip() {
        let host = fixture();
        let button = host.query(&Selector::tag("button")).unwrap();
        let saved = host.markup(&button);

        host.set_content(&button, &[Node::text("Logging in...")]);
        assert_eq!(host.text(&button), "Logging in...");

        host.restore_markup(&button, &saved);
        assert_eq!(host.text(&button), "Log in");
    }

    #[test]
    fn test_timers_run_in_order_on_advance() {
        let host = Rc::new(MemoryHost::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(300, "b"), (100, "a"), (300, "c")] {
            let log = Rc::clone(&log);
            host.set_timeout(
                Duration::from_millis(delay),
                Box::new(move || log.borrow_mut().push(label)),
            );
        }

        host.advance(Duration::from_millis(200));
        assert_eq!(*log.borrow(), vec!["a"]);

        host.advance(Duration::from_millis(100));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_nested_timer_fires_within_same_advance() {
        let host = Rc::new(MemoryHost::new());
        let fired = Rc::new(Cell::new(false));

        let inner_host = Rc::clone(&host);
        let inner_fired = Rc::clone(&fired);
        host.set_timeout(
            Duration::from_millis(100),
            Box::new(move || {
                inner_host.set_timeout(
                    Duration::from_millis(100),
                    Box::new(move || inner_fired.set(true)),
                );
            }),
        );

        host.advance(Duration::from_millis(250));
        assert!(fired.get());
    }

    #[test]
    fn test_confirm_answers_queue() {
        let host = MemoryHost::new();
        host.answer_confirm(false);
        assert!(!host.confirm("first?"));
        assert!(host.confirm("second?"));
        assert_eq!(host.confirms(), vec!["first?", "second?"]);
    }

    #[test]
    fn test_storage_unavailable() {
        let host = MemoryHost::new();
        host.set_storage_available(false);
        assert!(host.storage_get("bookmarks").is_err());
        assert!(host.storage_set("bookmarks", "[]").is_err());
    }

    #[test]
    fn test_scroll_height_tracks_lines() {
        let host = MemoryHost::new();
        let area = host.mount(Element::new("textarea").id("comment-content"));
        assert_eq!(host.scroll_height(&area), LINE_HEIGHT_PX);
        host.set_value(&area, "a\nb\nc");
        assert_eq!(host.scroll_height(&area), 3.0 * LINE_HEIGHT_PX);
    }
}

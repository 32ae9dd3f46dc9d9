//! Host abstraction: the document and window capabilities the controllers use
//!
//! Controllers never touch a concrete page. They talk to a [`Host`], which is
//! any type implementing both [`Dom`] (element lookup and mutation) and
//! [`Window`] (dialogs, navigation, timers, scrolling, local storage).
//!
//! Two hosts ship with the workspace:
//!
//! - [`memory::MemoryHost`]: an in-memory element tree with scripted dialogs
//!   and a manual clock, used by tests and headless drivers
//! - the browser host in the `blog-web` crate, backed by `web-sys`
//!
//! All methods take `&self`. The page is a shared resource mutated from event
//! handlers on a single thread, so implementations use interior mutability
//! (the browser provides it natively).

use std::fmt;
use std::time::Duration;

use crate::error::StorageError;
use crate::render::Node;

pub mod memory;

/// Element query, the subset of CSS selectors the controllers need
///
/// A selector matches an element when every populated criterion matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Attribute name and, optionally, the exact value required
    pub attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Self {
            classes: vec![class.to_string()],
            ..Default::default()
        }
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Default::default()
        }
    }

    /// Elements carrying `name="<value>"`, e.g. form fields
    pub fn name(value: &str) -> Self {
        Self::default().with_attr("name", value)
    }

    pub fn and_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl ToString) -> Self {
        self.attrs.push((name.to_string(), Some(value.to_string())));
        self
    }

    pub fn has_attr(mut self, name: &str) -> Self {
        self.attrs.push((name.to_string(), None));
        self
    }

    /// CSS text for hosts that delegate to a native selector engine
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(tag) = &self.tag {
            css.push_str(tag);
        }
        if let Some(id) = &self.id {
            css.push('#');
            css.push_str(id);
        }
        for class in &self.classes {
            css.push('.');
            css.push_str(class);
        }
        for (name, value) in &self.attrs {
            match value {
                Some(value) => {
                    let quoted = value.replace('\\', "\\\\").replace('"', "\\\"");
                    css.push_str(&format!("[{}=\"{}\"]", name, quoted));
                }
                None => css.push_str(&format!("[{}]", name)),
            }
        }
        if css.is_empty() {
            css.push('*');
        }
        css
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Document-level access
pub trait Dom {
    /// Handle to a live element
    type Element: Clone + PartialEq + fmt::Debug + 'static;

    /// Saved element contents, restorable with [`Dom::restore_markup`]
    type Markup: Clone + 'static;

    /// All matching descendants of `scope` (or of the whole document) in
    /// document order. `scope` itself is never part of the result.
    fn query_all(&self, scope: Option<&Self::Element>, selector: &Selector) -> Vec<Self::Element>;

    fn query(&self, selector: &Selector) -> Option<Self::Element> {
        self.query_all(None, selector).into_iter().next()
    }

    fn query_in(&self, scope: &Self::Element, selector: &Selector) -> Option<Self::Element> {
        self.query_all(Some(scope), selector).into_iter().next()
    }

    fn by_id(&self, id: &str) -> Option<Self::Element> {
        self.query(&Selector::id(id))
    }

    fn matches(&self, element: &Self::Element, selector: &Selector) -> bool;

    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// The element itself or its nearest ancestor matching `selector`
    fn closest(&self, element: &Self::Element, selector: &Selector) -> Option<Self::Element> {
        let mut current = Some(element.clone());
        while let Some(candidate) = current {
            if self.matches(&candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(&candidate);
        }
        None
    }

    /// Other children of the element's parent that match `selector`
    fn siblings(&self, element: &Self::Element, selector: &Selector) -> Vec<Self::Element>;

    fn value(&self, element: &Self::Element) -> String;
    fn set_value(&self, element: &Self::Element, value: &str);

    fn text(&self, element: &Self::Element) -> String;
    fn set_text(&self, element: &Self::Element, text: &str);

    fn attr(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_attr(&self, element: &Self::Element, name: &str, value: &str);

    fn has_class(&self, element: &Self::Element, class: &str) -> bool;
    fn add_class(&self, element: &Self::Element, class: &str);
    fn remove_class(&self, element: &Self::Element, class: &str);

    fn style(&self, element: &Self::Element, property: &str) -> Option<String>;
    fn set_style(&self, element: &Self::Element, property: &str, value: &str);

    fn is_disabled(&self, element: &Self::Element) -> bool;
    fn set_disabled(&self, element: &Self::Element, disabled: bool);

    fn focus(&self, element: &Self::Element);

    /// Full content height in pixels, including overflow
    fn scroll_height(&self, element: &Self::Element) -> f64;

    /// Distance from the top of the document in pixels
    fn offset_top(&self, element: &Self::Element) -> f64;

    /// Selection of a text field as char offsets `(start, end)`
    fn selection(&self, element: &Self::Element) -> (usize, usize);
    fn set_selection(&self, element: &Self::Element, start: usize, end: usize);

    fn markup(&self, element: &Self::Element) -> Self::Markup;
    fn restore_markup(&self, element: &Self::Element, markup: &Self::Markup);

    /// Replace the element's children with `nodes`
    fn set_content(&self, element: &Self::Element, nodes: &[Node]);

    /// Insert `node` as the first child of `parent`
    fn prepend(&self, parent: &Self::Element, node: &Node) -> Option<Self::Element>;

    /// Insert `node` as the last child of `parent`
    fn append(&self, parent: &Self::Element, node: &Node) -> Option<Self::Element>;

    /// Insert `node` right after `reference`
    fn insert_after(&self, reference: &Self::Element, node: &Node) -> Option<Self::Element>;

    fn remove(&self, element: &Self::Element);
}

/// Scroll position of the document
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Share of the scrollable distance covered, in percent (0–100)
    ///
    /// A page that does not scroll reports 0.
    pub fn progress_percent(&self) -> f64 {
        let scrollable = self.scroll_height - self.client_height;
        if scrollable <= 0.0 {
            return 0.0;
        }
        (self.scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
    }
}

/// Payload for the native share sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Window-level access
pub trait Window {
    /// Blocking notice
    fn alert(&self, message: &str);

    /// Blocking yes/no prompt
    fn confirm(&self, message: &str) -> bool;

    /// Leave the page for `url`
    fn navigate(&self, url: &str);

    /// Full-page form submission with no fields
    fn submit_form(&self, method: &str, action: &str);

    /// Run `callback` once after `delay`
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>);

    fn scroll_metrics(&self) -> ScrollMetrics;

    /// Animate the document scroll position to `top`
    fn scroll_to(&self, top: f64, duration: Duration);

    fn location_path(&self) -> String;
    fn location_origin(&self) -> String;

    fn storage_get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn storage_set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Open the native share sheet; `false` when the host has none
    fn share(&self, data: &ShareData) -> bool;

    /// Put `text` on the clipboard; `false` when unavailable
    fn copy_to_clipboard(&self, text: &str) -> bool;
}

/// Everything a controller needs from the page
pub trait Host: Dom + Window + 'static {}

impl<T: Dom + Window + 'static> Host for T {}

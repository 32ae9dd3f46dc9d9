//! Native event table and translation into [`UiEvent`]s
//!
//! The page gets exactly one listener per native event type. Events that do
//! not bubble (`focus`, `blur`, `mouseenter`, `mouseleave`) are caught in the
//! capture phase so a single document-level listener still sees them.
//! `change` is treated as another `input`: field bindings re-run on both.

use libblogsphere::UiEvent;

/// Where a listener is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOn {
    Document,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    pub event_type: &'static str,
    pub on: ListenOn,
    pub capture: bool,
    /// The handler never cancels the event
    pub passive: bool,
}

impl Listener {
    const fn bubbling(event_type: &'static str) -> Self {
        Self {
            event_type,
            on: ListenOn::Document,
            capture: false,
            passive: false,
        }
    }

    const fn captured(event_type: &'static str) -> Self {
        Self {
            event_type,
            on: ListenOn::Document,
            capture: true,
            passive: true,
        }
    }
}

pub const LISTENERS: [Listener; 10] = [
    Listener::bubbling("submit"),
    Listener::bubbling("input"),
    Listener::bubbling("change"),
    Listener::bubbling("click"),
    Listener::bubbling("keydown"),
    Listener::captured("focus"),
    Listener::captured("blur"),
    Listener::captured("mouseenter"),
    Listener::captured("mouseleave"),
    Listener {
        event_type: "scroll",
        on: ListenOn::Window,
        capture: false,
        passive: true,
    },
];

/// Key and modifier state of a `keydown`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
}

/// Build the [`UiEvent`] for a native event
///
/// Returns `None` for event types the page does not handle, and for events
/// missing what their variant needs (a target element, key state).
pub fn translate<E>(event_type: &str, target: Option<E>, key: Option<KeyPress>) -> Option<UiEvent<E>> {
    if event_type == "scroll" {
        return Some(UiEvent::Scroll);
    }

    let target = target?;
    let event = match event_type {
        "submit" => UiEvent::Submit { form: target },
        "input" | "change" => UiEvent::Input { target },
        "click" => UiEvent::Click { target },
        "focus" => UiEvent::Focus { target },
        "blur" => UiEvent::Blur { target },
        "mouseenter" => UiEvent::PointerEnter { target },
        "mouseleave" => UiEvent::PointerLeave { target },
        "keydown" => {
            let KeyPress { key, ctrl } = key?;
            UiEvent::KeyDown { target, key, ctrl }
        }
        _ => return None,
    };
    Some(event)
}

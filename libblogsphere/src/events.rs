//! Typed page events and the input subscription registry
//!
//! Hosts translate native events into [`UiEvent`] values and hand them to
//! [`crate::app::App::dispatch`]. Input-driven helpers (character counters,
//! textarea auto-resize, live field checks) are not wired as ad-hoc
//! callbacks; they are registered once at boot in [`Subscriptions`] and looked
//! up by target element on every input event.

/// An event raised by the page, carrying the element it targets
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent<E> {
    /// A form is about to be submitted
    Submit { form: E },
    /// The value of a field changed
    Input { target: E },
    Click { target: E },
    Focus { target: E },
    Blur { target: E },
    KeyDown { target: E, key: String, ctrl: bool },
    /// The pointer entered an element
    PointerEnter { target: E },
    /// The pointer left an element
    PointerLeave { target: E },
    /// The document scrolled
    Scroll,
}

impl<E> UiEvent<E> {
    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Submit { .. } => "submit",
            UiEvent::Input { .. } => "input",
            UiEvent::Click { .. } => "click",
            UiEvent::Focus { .. } => "focus",
            UiEvent::Blur { .. } => "blur",
            UiEvent::KeyDown { .. } => "keydown",
            UiEvent::PointerEnter { .. } => "pointerenter",
            UiEvent::PointerLeave { .. } => "pointerleave",
            UiEvent::Scroll => "scroll",
        }
    }
}

/// What the host should do with the native event after dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Let the browser carry on (e.g. submit the form)
    Proceed,
    /// Cancel the browser's default action
    PreventDefault,
}

impl EventOutcome {
    pub fn is_prevented(self) -> bool {
        self == EventOutcome::PreventDefault
    }
}

/// Behaviour attached to a field's input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputBinding<E> {
    /// Live length display, flagged when over `max`
    Counter { counter: Option<E>, max: Option<usize> },
    AutoResize,
    /// Compare against `#password` while typing
    ConfirmPassword,
    /// Live username format checks
    Username,
}

/// Registry of input bindings keyed by target element
#[derive(Debug, Clone)]
pub struct Subscriptions<E> {
    bindings: Vec<(E, InputBinding<E>)>,
}

impl<E> Default for Subscriptions<E> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<E: Clone + PartialEq> Subscriptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `binding` to `target`; an identical binding is not added twice
    pub fn bind(&mut self, target: E, binding: InputBinding<E>) {
        let exists = self
            .bindings
            .iter()
            .any(|(t, b)| *t == target && *b == binding);
        if !exists {
            self.bindings.push((target, binding));
        }
    }

    /// Bindings for `target`, in registration order
    pub fn bindings_for(&self, target: &E) -> Vec<InputBinding<E>> {
        self.bindings
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, binding)| binding.clone())
            .collect()
    }

    /// Every bound target with its binding, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&E, &InputBinding<E>)> {
        self.bindings.iter().map(|(target, binding)| (target, binding))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_for_keeps_registration_order() {
        let mut subs = Subscriptions::new();
        subs.bind(1, InputBinding::Counter { counter: Some(9), max: Some(1000) });
        subs.bind(2, InputBinding::Username);
        subs.bind(1, InputBinding::AutoResize);

        assert_eq!(
            subs.bindings_for(&1),
            vec![
                InputBinding::Counter { counter: Some(9), max: Some(1000) },
                InputBinding::AutoResize
            ]
        );
        assert!(subs.bindings_for(&3).is_empty());
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut subs = Subscriptions::new();
        subs.bind("content", InputBinding::AutoResize);
        subs.bind("content", InputBinding::AutoResize);
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(UiEvent::<u8>::Scroll.name(), "scroll");
        assert_eq!(UiEvent::Submit { form: 1u8 }.name(), "submit");
        assert!(EventOutcome::PreventDefault.is_prevented());
        assert!(!EventOutcome::Proceed.is_prevented());
    }
}

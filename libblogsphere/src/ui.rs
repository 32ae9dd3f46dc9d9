//! Shared UI utilities injected into every controller
//!
//! [`Ui`] bundles the host and configuration together with the helpers every
//! feature needs: rule-based form validation, character counters, textarea
//! auto-resize, alerts and toasts, the confirmation gate, the form error
//! banner and the global request-failure mapping.

use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, FailureKind};
use crate::host::{Host, Selector};
use crate::render::{self, Element, ToastKind};
use crate::validation::{exceeds_limit, RuleSet};

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to perform this action.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";

/// Scroll animation used when revealing the form error banner
const FORM_ERROR_SCROLL: Duration = Duration::from_millis(300);

/// Gap kept above an element scrolled into view
const SCROLL_OFFSET_PX: f64 = 100.0;

pub struct Ui<H: Host> {
    host: Rc<H>,
    config: Rc<Config>,
}

impl<H: Host> Clone for Ui<H> {
    fn clone(&self) -> Self {
        Self {
            host: Rc::clone(&self.host),
            config: Rc::clone(&self.config),
        }
    }
}

impl<H: Host> Ui<H> {
    pub fn new(host: Rc<H>, config: Rc<Config>) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `callback` against the host after `delay`
    ///
    /// The timer holds only a weak reference; it is skipped when the host is
    /// gone by the time it fires.
    pub fn after(&self, delay: Duration, callback: impl FnOnce(&H) + 'static) {
        let host: Weak<H> = Rc::downgrade(&self.host);
        self.host.set_timeout(
            delay,
            Box::new(move || {
                if let Some(host) = host.upgrade() {
                    callback(&host);
                }
            }),
        );
    }

    /// Evaluate `rules` against the named fields of `form`
    ///
    /// Clears every previous `is-invalid` marker inside the form, checks all
    /// fields and marks each failing one. Returns `true` when nothing failed.
    pub fn validate_form(&self, form: &H::Element, rules: &RuleSet) -> bool {
        let host = self.host();

        for marked in host.query_all(Some(form), &Selector::class("is-invalid")) {
            host.remove_class(&marked, "is-invalid");
        }

        let failing = rules.failing_fields(|name| {
            host.query_in(form, &Selector::name(name))
                .map(|field| host.value(&field))
        });

        for name in &failing {
            if let Some(field) = host.query_in(form, &Selector::name(name)) {
                host.add_class(&field, "is-invalid");
            }
        }

        if !failing.is_empty() {
            debug!(fields = ?failing, "Form validation failed");
        }
        failing.is_empty()
    }

    /// Show the live length of `field` and flag it when over `max`
    pub fn update_counter(&self, field: &H::Element, counter: Option<&H::Element>, max: Option<usize>) {
        let host = self.host();
        let count = host.value(field).chars().count();
        let over = exceeds_limit(count, max);

        if let Some(counter) = counter {
            host.set_text(counter, &count.to_string());
            if over {
                host.add_class(counter, "text-danger");
            } else {
                host.remove_class(counter, "text-danger");
            }
        }

        if over {
            host.add_class(field, "is-invalid");
        } else {
            host.remove_class(field, "is-invalid");
        }
    }

    /// Grow or shrink a textarea to fit its content
    pub fn auto_resize(&self, field: &H::Element) {
        let host = self.host();
        host.set_style(field, "height", "auto");
        let height = host.scroll_height(field);
        host.set_style(field, "height", &format!("{}px", height));
    }

    pub fn alert(&self, message: &str) {
        self.host.alert(message);
    }

    /// Confirmation gate for destructive actions
    pub fn confirm(&self, message: &str) -> bool {
        let confirmed = self.host.confirm(message);
        debug!(confirmed, "Confirmation answered");
        confirmed
    }

    /// Timed notification in `.toast-container`, created on demand
    pub fn toast(&self, message: &str, kind: ToastKind) {
        let host = self.host();
        let container = match host.query(&Selector::class("toast-container")) {
            Some(container) => Some(container),
            None => host.query(&Selector::tag("body")).and_then(|body| {
                host.append(
                    &body,
                    &Element::new("div")
                        .class("toast-container position-fixed top-0 end-0 p-3")
                        .into(),
                )
            }),
        };

        let Some(container) = container else {
            warn!("No place to show toast, falling back to alert");
            host.alert(message);
            return;
        };

        if let Some(toast) = host.append(&container, &render::toast(message, kind)) {
            self.after(self.config.ui.toast(), move |host| host.remove(&toast));
        }
    }

    /// Show the consolidated error banner above the first form on the page
    ///
    /// Any previous banner is removed first. The new one is scrolled into
    /// view and hides itself after the configured delay.
    pub fn show_form_error(&self, message: &str) {
        let host = self.host();

        for banner in host.query_all(None, &Selector::class("form-error-message")) {
            host.remove(&banner);
        }

        let Some(form) = host.query(&Selector::tag("form")) else {
            host.alert(message);
            return;
        };
        let Some(banner) = host.prepend(&form, &render::form_error(message)) else {
            host.alert(message);
            return;
        };

        host.scroll_to(
            (host.offset_top(&banner) - SCROLL_OFFSET_PX).max(0.0),
            FORM_ERROR_SCROLL,
        );
        self.after(self.config.ui.form_error_hide(), move |host| host.remove(&banner));
    }

    /// Smoothly scroll so `element` sits just below the top of the viewport
    pub fn scroll_to_element(&self, element: &H::Element) {
        let top = (self.host.offset_top(element) - SCROLL_OFFSET_PX).max(0.0);
        self.host.scroll_to(top, self.config.ui.scroll_duration());
    }

    /// Replace the inline feedback of `field`
    ///
    /// `Some` marks the field invalid and places the message right after it;
    /// `None` clears both.
    pub fn set_feedback(&self, field: &H::Element, message: Option<&str>) {
        let host = self.host();
        for old in host.siblings(field, &Selector::class("invalid-feedback")) {
            host.remove(&old);
        }

        match message {
            Some(message) => {
                host.add_class(field, "is-invalid");
                host.insert_after(field, &render::invalid_feedback(message));
            }
            None => host.remove_class(field, "is-invalid"),
        }
    }

    /// Surface a failed request to the user
    ///
    /// The same mapping applies to every endpoint: 401 sends the user to the
    /// login page, 403 gets the permission notice, and everything else shows
    /// the server's message when it sent one, `generic` otherwise.
    pub fn report_failure(&self, error: &ApiError, generic: &str) {
        warn!(error = %error, "Request failed");

        let server_message = error.server_message().filter(|m| !m.trim().is_empty());
        match error.kind() {
            FailureKind::Unauthorized => {
                self.host.alert(LOGIN_REQUIRED_MESSAGE);
                self.host.navigate(&self.config.api.login_path);
            }
            FailureKind::Forbidden => self.host.alert(FORBIDDEN_MESSAGE),
            FailureKind::Application | FailureKind::Generic => {
                self.host.alert(server_message.unwrap_or(generic));
            }
        }
    }
}

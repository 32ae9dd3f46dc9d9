//! Form validation and submission for the login, registration and post forms
//!
//! Submission is decided synchronously: the checks run against the current
//! field values, and either the native submission goes ahead (with the submit
//! button disabled behind a loading label for a while) or it is cancelled and
//! the offending field is marked next to a single error banner.

use std::time::Duration;

use tracing::{debug, info};

use crate::events::EventOutcome;
use crate::host::{Host, Selector};
use crate::render;
use crate::types::FormKind;
use crate::ui::Ui;
use crate::validation::{
    confirm_password_feedback, login_rules, username_feedback, validate_post,
    validate_registration, FieldError, Registration, LOGIN_FAILED_MESSAGE,
};

/// Credentials filled in by the demo button
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "password";

pub struct FormController<H: Host> {
    ui: Ui<H>,
}

impl<H: Host> Clone for FormController<H> {
    fn clone(&self) -> Self {
        Self {
            ui: self.ui.clone(),
        }
    }
}

impl<H: Host> FormController<H> {
    pub fn new(ui: Ui<H>) -> Self {
        Self { ui }
    }

    /// Decide whether a native submission of `form` may go ahead
    ///
    /// The comment form is not handled here; it never submits natively.
    pub fn on_submit(&self, kind: FormKind, form: &H::Element) -> EventOutcome {
        let timings = &self.ui.config().ui;
        match kind {
            FormKind::Login => self.submit_login(form, timings.login_reenable()),
            FormKind::Register => self.submit_register(form, timings.register_reenable()),
            FormKind::CreatePost => self.submit_post(form, "Publishing...", timings.post_reenable()),
            FormKind::EditPost => self.submit_post(form, "Updating...", timings.post_reenable()),
            FormKind::Comment => EventOutcome::Proceed,
        }
    }

    fn submit_login(&self, form: &H::Element, reenable: Duration) -> EventOutcome {
        if !self.ui.validate_form(form, &login_rules()) {
            info!("Login submission blocked");
            self.ui.show_form_error(LOGIN_FAILED_MESSAGE);
            return EventOutcome::PreventDefault;
        }

        self.start_loading(form, "Logging in...", reenable);
        EventOutcome::Proceed
    }

    fn submit_register(&self, form: &H::Element, reenable: Duration) -> EventOutcome {
        let registration = Registration {
            username: self.field_value("username"),
            email: self.field_value("email"),
            password: self.field_value("password"),
            confirm_password: self.field_value("confirm-password"),
        };

        if let Err(error) = validate_registration(&registration) {
            self.block(&error, false);
            return EventOutcome::PreventDefault;
        }

        self.start_loading(form, "Creating Account...", reenable);
        EventOutcome::Proceed
    }

    fn submit_post(&self, form: &H::Element, label: &str, reenable: Duration) -> EventOutcome {
        let title = self.field_value("title");
        let content = self.field_value("content");

        if let Err(error) = validate_post(&title, &content, self.ui.config().ui.title_max_chars) {
            self.block(&error, true);
            return EventOutcome::PreventDefault;
        }

        self.start_loading(form, label, reenable);
        EventOutcome::Proceed
    }

    fn field_value(&self, id: &str) -> String {
        let host = self.ui.host();
        host.by_id(id)
            .map(|field| host.value(&field))
            .unwrap_or_default()
    }

    fn block(&self, error: &FieldError, focus: bool) {
        info!(field = error.field, "Form submission blocked");
        let host = self.ui.host();
        if let Some(field) = host.by_id(error.field) {
            host.add_class(&field, "is-invalid");
            if focus {
                host.focus(&field);
            }
        }
        self.ui.show_form_error(&error.message);
    }

    /// Swap the submit button for a disabled loading label, restoring it
    /// after `reenable`
    fn start_loading(&self, form: &H::Element, label: &str, reenable: Duration) {
        let host = self.ui.host();
        let Some(button) = host.query_in(form, &Selector::tag("button").with_attr("type", "submit")) else {
            return;
        };

        let original = host.markup(&button);
        host.set_content(&button, &render::loading_label(label));
        host.set_disabled(&button, true);
        debug!(label, "Submit button disabled");

        self.ui.after(reenable, move |host| {
            host.restore_markup(&button, &original);
            host.set_disabled(&button, false);
        });
    }

    /// Live comparison of the confirmation field against `#password`
    pub fn check_confirm_password(&self, field: &H::Element) {
        let host = self.ui.host();
        let password = self.field_value("password");
        let confirm = host.value(field);
        self.ui
            .set_feedback(field, confirm_password_feedback(&password, &confirm));
    }

    /// Live username format checks
    pub fn check_username(&self, field: &H::Element) {
        let username = self.ui.host().value(field);
        self.ui.set_feedback(field, username_feedback(&username));
    }

    /// Mark the group of every pre-filled `.form-control` as focused
    pub fn init_focus_state(&self) {
        let host = self.ui.host();
        for field in host.query_all(None, &Selector::class("form-control")) {
            if !host.value(&field).is_empty() {
                self.set_group_focused(&field, true);
            }
        }
    }

    pub fn on_focus(&self, target: &H::Element) {
        if self.ui.host().has_class(target, "form-control") {
            self.set_group_focused(target, true);
        }
    }

    pub fn on_blur(&self, target: &H::Element) {
        let host = self.ui.host();
        if host.has_class(target, "form-control") && host.value(target).is_empty() {
            self.set_group_focused(target, false);
        }
    }

    fn set_group_focused(&self, field: &H::Element, focused: bool) {
        let host = self.ui.host();
        if let Some(group) = host.closest(field, &Selector::class("mb-3")) {
            if focused {
                host.add_class(&group, "focused");
            } else {
                host.remove_class(&group, "focused");
            }
        }
    }

    /// Fill the demo credentials into the login fields
    ///
    /// Returns the fields that changed so the caller can replay their input
    /// handlers.
    pub fn fill_demo(&self) -> Vec<H::Element> {
        let host = self.ui.host();
        let mut filled = Vec::new();
        for (id, value) in [("username", DEMO_USERNAME), ("password", DEMO_PASSWORD)] {
            if let Some(field) = host.by_id(id) {
                host.set_value(&field, value);
                filled.push(field);
            }
        }
        debug!(fields = filled.len(), "Demo credentials filled");
        filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::host::memory::MemoryHost;
    use crate::host::Dom;
    use crate::render::Element;
    use std::rc::Rc;

    fn field(id: &str, value: &str) -> Element {
        Element::new("div").class("mb-3").child(
            Element::new("input")
                .id(id)
                .class("form-control")
                .attr("name", id)
                .attr("value", value),
        )
    }

    fn submit_button(text: &str) -> Element {
        Element::new("button").attr("type", "submit").text(text)
    }

    fn controller(host: &Rc<MemoryHost>) -> FormController<MemoryHost> {
        FormController::new(Ui::new(Rc::clone(host), Rc::new(Config::default())))
    }

    fn post_form(title: &str, content: &str) -> Rc<MemoryHost> {
        let host = Rc::new(MemoryHost::new());
        host.mount(
            Element::new("form")
                .id("create-post-form")
                .child(field("title", title))
                .child(
                    Element::new("textarea")
                        .id("content")
                        .class("form-control")
                        .attr("name", "content")
                        .text(content),
                )
                .child(submit_button("Publish")),
        );
        host
    }

    #[test]
    fn test_valid_post_proceeds_with_loading_label() {
        let host = post_form("Hello", "Long enough body");
        let forms = controller(&host);
        let form = host.by_id("create-post-form").unwrap();

        assert_eq!(forms.on_submit(FormKind::CreatePost, &form), EventOutcome::Proceed);

        let button = host.query(&Selector::tag("button")).unwrap();
        assert!(host.is_disabled(&button));
        assert_eq!(host.text(&button), " Publishing...");

        host.advance(Duration::from_secs(3));
        assert!(!host.is_disabled(&button));
        assert_eq!(host.text(&button), "Publish");
    }

    #[test]
    fn test_short_post_is_blocked_and_focused() {
        let host = post_form("Hello", "too short");
        let forms = controller(&host);
        let form = host.by_id("create-post-form").unwrap();

        assert_eq!(
            forms.on_submit(FormKind::CreatePost, &form),
            EventOutcome::PreventDefault
        );
        let content = host.by_id("content").unwrap();
        assert!(host.has_class(&content, "is-invalid"));
        assert_eq!(host.focused(), Some(content));

        let banner = host.query(&Selector::class("form-error-message")).unwrap();
        assert!(host.text(&banner).contains("at least 10 characters"));
        let button = host.query(&Selector::tag("button")).unwrap();
        assert!(!host.is_disabled(&button));
    }

    #[test]
    fn test_edit_form_uses_updating_label() {
        let host = Rc::new(MemoryHost::new());
        host.mount(
            Element::new("form")
                .id("edit-post-form")
                .child(field("title", "Title"))
                .child(field("content", "Edited content here"))
                .child(submit_button("Save")),
        );
        let forms = controller(&host);
        let form = host.by_id("edit-post-form").unwrap();

        assert_eq!(forms.on_submit(FormKind::EditPost, &form), EventOutcome::Proceed);
        let button = host.query(&Selector::tag("button")).unwrap();
        assert_eq!(host.text(&button), " Updating...");
    }

    #[test]
    fn test_login_rules_use_banner() {
        let host = Rc::new(MemoryHost::new());
        host.mount(
            Element::new("form")
                .id("login-form")
                .child(field("username", "al"))
                .child(field("password", "secret"))
                .child(submit_button("Log in")),
        );
        let forms = controller(&host);
        let form = host.by_id("login-form").unwrap();

        assert_eq!(forms.on_submit(FormKind::Login, &form), EventOutcome::PreventDefault);
        let banner = host.query(&Selector::class("form-error-message")).unwrap();
        assert_eq!(host.text(&banner), format!(" {}", LOGIN_FAILED_MESSAGE));
    }

    #[test]
    fn test_registration_mismatch_marks_confirmation() {
        let host = Rc::new(MemoryHost::new());
        host.mount(
            Element::new("form")
                .id("register-form")
                .child(field("username", "alice"))
                .child(field("email", "alice@example.com"))
                .child(field("password", "secret1"))
                .child(field("confirm-password", "secret2"))
                .child(submit_button("Create Account")),
        );
        let forms = controller(&host);
        let form = host.by_id("register-form").unwrap();

        assert_eq!(forms.on_submit(FormKind::Register, &form), EventOutcome::PreventDefault);
        let confirm = host.by_id("confirm-password").unwrap();
        assert!(host.has_class(&confirm, "is-invalid"));

        host.set_value(&confirm, "secret1");
        assert_eq!(forms.on_submit(FormKind::Register, &form), EventOutcome::Proceed);
        let button = host.query(&Selector::tag("button")).unwrap();
        assert_eq!(host.text(&button), " Creating Account...");

        host.advance(Duration::from_millis(4999));
        assert!(host.is_disabled(&button));
        host.advance(Duration::from_millis(1));
        assert!(!host.is_disabled(&button));
    }

    #[test]
    fn test_live_checks() {
        let host = Rc::new(MemoryHost::new());
        host.mount(
            Element::new("form")
                .id("register-form")
                .child(field("username", "a!"))
                .child(field("password", "secret"))
                .child(field("confirm-password", "secre")),
        );
        let forms = controller(&host);

        let username = host.by_id("username").unwrap();
        forms.check_username(&username);
        assert!(host.has_class(&username, "is-invalid"));

        host.set_value(&username, "alice");
        forms.check_username(&username);
        assert!(!host.has_class(&username, "is-invalid"));

        let confirm = host.by_id("confirm-password").unwrap();
        forms.check_confirm_password(&confirm);
        let feedback = host.siblings(&confirm, &Selector::class("invalid-feedback"));
        assert_eq!(host.text(&feedback[0]), "Passwords do not match");
    }

    #[test]
    fn test_focus_effects() {
        let host = Rc::new(MemoryHost::new());
        host.mount(field("title", "Prefilled"));
        host.mount(field("content", ""));
        let forms = controller(&host);
        forms.init_focus_state();

        let title = host.by_id("title").unwrap();
        let content = host.by_id("content").unwrap();
        let title_group = host.parent(&title).unwrap();
        let content_group = host.parent(&content).unwrap();
        assert!(host.has_class(&title_group, "focused"));
        assert!(!host.has_class(&content_group, "focused"));

        forms.on_focus(&content);
        assert!(host.has_class(&content_group, "focused"));
        forms.on_blur(&content);
        assert!(!host.has_class(&content_group, "focused"));

        forms.on_blur(&title);
        assert!(host.has_class(&title_group, "focused"));
    }

    #[test]
    fn test_fill_demo() {
        let host = Rc::new(MemoryHost::new());
        host.mount(field("username", ""));
        host.mount(field("password", ""));
        let forms = controller(&host);

        assert_eq!(forms.fill_demo().len(), 2);
        assert_eq!(host.value(&host.by_id("username").unwrap()), DEMO_USERNAME);
        assert_eq!(host.value(&host.by_id("password").unwrap()), DEMO_PASSWORD);
    }
}

//! Comment creation and deletion
//!
//! Both operations are a single request followed by a page patch: a created
//! comment is prepended to `#comments-list`, a deleted one fades out and is
//! removed, and every `.comment-count` label follows along.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::events::EventOutcome;
use crate::host::{Host, Selector};
use crate::render::{self, ToastKind};
use crate::types::{comment_element_id, CommentId, CommentView, FormKind, PostId};
use crate::ui::Ui;

pub const EMPTY_COMMENT_MESSAGE: &str = "Comment cannot be empty";
pub const COMMENT_ADDED_MESSAGE: &str = "Comment added successfully!";
pub const ADD_FAILED_MESSAGE: &str = "An error occurred while adding the comment.";
pub const CONFIRM_DELETE_MESSAGE: &str = "Are you sure you want to delete this comment?";
pub const COMMENT_DELETED_MESSAGE: &str = "Comment deleted successfully!";
pub const DELETE_FAILED_MESSAGE: &str = "An error occurred while deleting the comment.";

pub const COMMENT_FIELD_ID: &str = "comment-content";
pub const COMMENT_COUNTER_ID: &str = "comment-counter";
pub const COMMENTS_LIST_ID: &str = "comments-list";

static POST_PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/post/(\d+)").expect("hardcoded post path regex is invalid"));

/// Post id embedded in a `/post/<id>` path
pub fn post_id_from_path(path: &str) -> Option<PostId> {
    POST_PATH_REGEX
        .captures(path)
        .and_then(|captures| captures.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// Wrap the `[start, end)` char range of `text` in `before`/`after`
///
/// Returns the new text and the selection covering the wrapped part.
pub fn wrap_selection(
    text: &str,
    start: usize,
    end: usize,
    before: &str,
    after: &str,
) -> (String, (usize, usize)) {
    let chars: Vec<char> = text.chars().collect();
    let end = end.min(chars.len());
    let start = start.min(end);

    let mut wrapped = String::with_capacity(text.len() + before.len() + after.len());
    wrapped.extend(&chars[..start]);
    wrapped.push_str(before);
    wrapped.extend(&chars[start..end]);
    wrapped.push_str(after);
    wrapped.extend(&chars[end..]);

    let shift = before.chars().count();
    (wrapped, (start + shift, end + shift))
}

pub struct CommentManager<H: Host> {
    ui: Ui<H>,
    api: Rc<ApiClient>,
    submitting: Rc<Cell<bool>>,
    deleting: Rc<RefCell<HashSet<CommentId>>>,
}

impl<H: Host> Clone for CommentManager<H> {
    fn clone(&self) -> Self {
        Self {
            ui: self.ui.clone(),
            api: Rc::clone(&self.api),
            submitting: Rc::clone(&self.submitting),
            deleting: Rc::clone(&self.deleting),
        }
    }
}

impl<H: Host> CommentManager<H> {
    pub fn new(ui: Ui<H>, api: Rc<ApiClient>) -> Self {
        Self {
            ui,
            api,
            submitting: Rc::new(Cell::new(false)),
            deleting: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    /// Create the `#comment-counter` line after the comment box when the
    /// page does not provide one
    pub fn ensure_counter(&self) -> Option<H::Element> {
        let host = self.ui.host();
        if let Some(counter) = host.by_id(COMMENT_COUNTER_ID) {
            return Some(counter);
        }
        let field = host.by_id(COMMENT_FIELD_ID)?;
        let line = host.insert_after(
            &field,
            &render::comment_counter(self.ui.config().ui.comment_max_chars),
        )?;
        debug!("Comment counter created");
        host.query_in(&line, &Selector::id(COMMENT_COUNTER_ID))
    }

    /// Post the comment form asynchronously instead of submitting it
    ///
    /// The native submission is always cancelled.
    pub fn on_submit(&self, form: &H::Element) -> (EventOutcome, Option<LocalBoxFuture<'static, ()>>) {
        let host = self.ui.host();
        let content = host
            .by_id(COMMENT_FIELD_ID)
            .map(|field| host.value(&field))
            .unwrap_or_default();

        let post_id = host
            .attr(form, "data-post-id")
            .and_then(|id| id.parse().ok())
            .or_else(|| post_id_from_path(&host.location_path()));

        let Some(post_id) = post_id else {
            warn!("Comment form has no post id");
            return (EventOutcome::PreventDefault, None);
        };

        (EventOutcome::PreventDefault, self.add_comment(post_id, content))
    }

    /// Create a comment on `post_id`
    ///
    /// Blank content is rejected locally. While a request is in flight the
    /// submit button stays disabled and further submissions are dropped.
    pub fn add_comment(&self, post_id: PostId, content: String) -> Option<LocalBoxFuture<'static, ()>> {
        let content = content.trim().to_string();
        if content.is_empty() {
            self.ui.alert(EMPTY_COMMENT_MESSAGE);
            return None;
        }
        if self.submitting.replace(true) {
            debug!(%post_id, "Comment already being submitted");
            return None;
        }

        let button = self.submit_button();
        if let Some(button) = &button {
            self.ui.host().set_disabled(button, true);
        }
        info!(%post_id, "Adding comment");

        let this = self.clone();
        Some(
            async move {
                match this.api.add_comment(post_id, &content).await {
                    Ok(comment) => this.show_new_comment(&comment),
                    Err(error) => this.ui.report_failure(&error, ADD_FAILED_MESSAGE),
                }
                if let Some(button) = &button {
                    this.ui.host().set_disabled(button, false);
                }
                this.submitting.set(false);
            }
            .boxed_local(),
        )
    }

    fn submit_button(&self) -> Option<H::Element> {
        let host = self.ui.host();
        let form = host.by_id(FormKind::Comment.element_id())?;
        host.query_in(&form, &Selector::tag("button").with_attr("type", "submit"))
    }

    fn show_new_comment(&self, comment: &CommentView) {
        let host = self.ui.host();
        info!(comment_id = %comment.id, "Comment added");

        let inserted = host
            .by_id(COMMENTS_LIST_ID)
            .and_then(|list| host.prepend(&list, &render::comment_item(comment)));
        if inserted.is_none() {
            warn!("No #{} on the page", COMMENTS_LIST_ID);
        }

        if let Some(field) = host.by_id(COMMENT_FIELD_ID) {
            host.set_value(&field, "");
            let counter = host.by_id(COMMENT_COUNTER_ID);
            self.ui.update_counter(
                &field,
                counter.as_ref(),
                Some(self.ui.config().ui.comment_max_chars),
            );
        }

        self.update_count(1);
        for empty in self.empty_states() {
            host.set_style(&empty, "display", "none");
        }

        if let Some(item) = &inserted {
            self.ui.scroll_to_element(item);
        }
        self.ui.toast(COMMENT_ADDED_MESSAGE, ToastKind::Success);
    }

    fn delete_buttons(&self, comment_id: CommentId) -> Vec<H::Element> {
        self.ui.host().query_all(
            None,
            &Selector::class("delete-comment-btn").with_attr("data-comment-id", comment_id),
        )
    }

    /// Delete a comment after confirmation
    ///
    /// The comment's delete buttons stay disabled until the server answers.
    pub fn delete_comment(&self, comment_id: CommentId) -> Option<LocalBoxFuture<'static, ()>> {
        if self.deleting.borrow().contains(&comment_id) {
            debug!(%comment_id, "Comment already being deleted");
            return None;
        }
        if !self.ui.confirm(CONFIRM_DELETE_MESSAGE) {
            return None;
        }
        self.deleting.borrow_mut().insert(comment_id);
        info!(%comment_id, "Deleting comment");

        let buttons = self.delete_buttons(comment_id);
        for button in &buttons {
            self.ui.host().set_disabled(button, true);
        }

        let this = self.clone();
        Some(
            async move {
                match this.api.delete_comment(comment_id).await {
                    Ok(()) => this.remove_comment(comment_id),
                    Err(error) => this.ui.report_failure(&error, DELETE_FAILED_MESSAGE),
                }
                for button in &buttons {
                    this.ui.host().set_disabled(button, false);
                }
                this.deleting.borrow_mut().remove(&comment_id);
            }
            .boxed_local(),
        )
    }

    fn remove_comment(&self, comment_id: CommentId) {
        let host = self.ui.host();
        info!(%comment_id, "Comment deleted");

        if let Some(item) = host.by_id(&comment_element_id(comment_id)) {
            host.add_class(&item, "animate__animated");
            host.add_class(&item, "animate__fadeOut");
            self.ui
                .after(self.ui.config().ui.comment_remove_delay(), move |host| {
                    host.remove(&item)
                });
        }

        self.update_count(-1);
        self.ui.toast(COMMENT_DELETED_MESSAGE, ToastKind::Success);
    }

    /// Shift every comment count label by `delta`, never below zero
    pub fn update_count(&self, delta: i64) -> u64 {
        let host = self.ui.host();
        let labels = host.query_all(None, &Selector::class("comment-count"));

        let current = labels
            .first()
            .and_then(|label| host.text(label).trim().parse::<i64>().ok())
            .unwrap_or(0);
        let count = current.saturating_add(delta).max(0) as u64;

        let badges = host.query_all(None, &Selector::class("badge").and_class("bg-primary"));
        for label in labels.iter().chain(badges.iter()) {
            host.set_text(label, &count.to_string());
        }

        if count == 0 {
            for empty in self.empty_states() {
                host.set_style(&empty, "display", "");
            }
        }
        count
    }

    /// The "no comments yet" placeholder
    fn empty_states(&self) -> Vec<H::Element> {
        self.ui.host().query_all(
            None,
            &Selector::class("text-center").and_class("py-4"),
        )
    }

    /// Ctrl+B / Ctrl+I formatting shortcuts in the comment box
    pub fn on_key_down(&self, target: &H::Element, key: &str, ctrl: bool) -> EventOutcome {
        let host = self.ui.host();
        if !ctrl || host.attr(target, "id").as_deref() != Some(COMMENT_FIELD_ID) {
            return EventOutcome::Proceed;
        }

        let marker = match key {
            "b" => "**",
            "i" => "*",
            _ => return EventOutcome::Proceed,
        };
        self.wrap_text(target, marker, marker);
        EventOutcome::PreventDefault
    }

    /// Wrap the field's selection, keeping the wrapped text selected
    pub fn wrap_text(&self, field: &H::Element, before: &str, after: &str) {
        let host = self.ui.host();
        let (start, end) = host.selection(field);
        let (text, (start, end)) = wrap_selection(&host.value(field), start, end, before, after);

        host.set_value(field, &text);
        host.set_selection(field, start, end);
        host.focus(field);
    }

    pub fn on_focus(&self, target: &H::Element) {
        if self.is_comment_field(target) {
            self.set_card_focused(target, true);
        }
    }

    pub fn on_blur(&self, target: &H::Element) {
        if self.is_comment_field(target) && self.ui.host().value(target).trim().is_empty() {
            self.set_card_focused(target, false);
        }
    }

    fn is_comment_field(&self, element: &H::Element) -> bool {
        self.ui.host().attr(element, "id").as_deref() == Some(COMMENT_FIELD_ID)
    }

    fn set_card_focused(&self, field: &H::Element, focused: bool) {
        let host = self.ui.host();
        if let Some(card) = host.closest(field, &Selector::class("card-body")) {
            if focused {
                host.add_class(&card, "comment-focused");
            } else {
                host.remove_class(&card, "comment-focused");
            }
        }
    }
}

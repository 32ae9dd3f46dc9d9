//! Event routing for a BlogSphere page
//!
//! [`App`] owns one instance of every controller, all sharing a single
//! [`Ui`] handle and [`ApiClient`]. Hosts call [`App::boot`] once the page is
//! ready and then feed every native event through [`App::dispatch`].
//!
//! Dispatch is split in two. Whether the browser's default action must be
//! cancelled is decided synchronously and returned as the
//! [`EventOutcome`]; work that has to wait for the server comes back as a
//! future the host spawns on its local executor.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tracing::{debug, info, trace};

use crate::api::{ApiClient, ApiTransport};
use crate::bookmarks::BookmarkController;
use crate::comments::{CommentManager, COMMENT_FIELD_ID};
use crate::config::Config;
use crate::events::{EventOutcome, InputBinding, Subscriptions, UiEvent};
use crate::forms::FormController;
use crate::host::{Host, Selector};
use crate::posts::PostManager;
use crate::types::{CommentId, FormKind, PostId};
use crate::ui::Ui;

/// Result of dispatching one event
pub struct Dispatch {
    pub outcome: EventOutcome,
    /// Continuation waiting on the server, if the event started a request
    pub task: Option<LocalBoxFuture<'static, ()>>,
}

impl Dispatch {
    pub fn proceed() -> Self {
        Self {
            outcome: EventOutcome::Proceed,
            task: None,
        }
    }

    pub fn prevent() -> Self {
        Self {
            outcome: EventOutcome::PreventDefault,
            task: None,
        }
    }

    fn with_task(outcome: EventOutcome, task: Option<LocalBoxFuture<'static, ()>>) -> Self {
        Self { outcome, task }
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("outcome", &self.outcome)
            .field("task", &self.task.is_some())
            .finish()
    }
}

/// Click targets the page wires up by class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickHook {
    Like,
    DeletePost,
    DeleteComment,
    Bookmark,
    Share,
    DemoFill,
}

impl ClickHook {
    const ALL: [ClickHook; 6] = [
        ClickHook::Like,
        ClickHook::DeletePost,
        ClickHook::DeleteComment,
        ClickHook::Bookmark,
        ClickHook::Share,
        ClickHook::DemoFill,
    ];

    fn class(self) -> &'static str {
        match self {
            ClickHook::Like => "like-btn",
            ClickHook::DeletePost => "delete-post-btn",
            ClickHook::DeleteComment => "delete-comment-btn",
            ClickHook::Bookmark => "bookmark-btn",
            ClickHook::Share => "share-btn",
            ClickHook::DemoFill => "demo-fill-btn",
        }
    }
}

pub struct App<H: Host> {
    ui: Ui<H>,
    forms: FormController<H>,
    comments: CommentManager<H>,
    posts: PostManager<H>,
    bookmarks: BookmarkController<H>,
    subscriptions: RefCell<Subscriptions<H::Element>>,
    reading_progress: Cell<bool>,
}

impl<H: Host> App<H> {
    pub fn new(host: Rc<H>, config: Config, transport: Rc<dyn ApiTransport>) -> Self {
        let config = Rc::new(config);
        let ui = Ui::new(host, Rc::clone(&config));
        let api = Rc::new(ApiClient::new(transport, config));

        Self {
            forms: FormController::new(ui.clone()),
            comments: CommentManager::new(ui.clone(), Rc::clone(&api)),
            posts: PostManager::new(ui.clone(), api),
            bookmarks: BookmarkController::new(ui.clone()),
            ui,
            subscriptions: RefCell::new(Subscriptions::new()),
            reading_progress: Cell::new(false),
        }
    }

    pub fn ui(&self) -> &Ui<H> {
        &self.ui
    }

    /// One-time page setup
    ///
    /// Schedules flash message dismissal, registers input bindings and
    /// primes counters and textarea heights, sets initial focus styling,
    /// installs the reading progress bar on post pages, loads deferred images
    /// already in view and syncs bookmark buttons with local storage.
    pub fn boot(&self) {
        let host = self.ui.host();

        let flashes = host.query_all(None, &Selector::class("flash-message"));
        if !flashes.is_empty() {
            self.ui.after(self.ui.config().ui.flash_hide(), move |host| {
                for flash in &flashes {
                    host.set_style(flash, "display", "none");
                }
            });
        }

        self.register_bindings();
        let bound: Vec<H::Element> = {
            let subscriptions = self.subscriptions.borrow();
            let mut targets: Vec<H::Element> = Vec::new();
            for (target, _) in subscriptions.iter() {
                if !targets.contains(target) {
                    targets.push(target.clone());
                }
            }
            targets
        };
        for target in &bound {
            self.prime_input(target);
        }

        self.forms.init_focus_state();
        self.reading_progress.set(self.posts.install_reading_progress());
        let lazy_images = self.posts.load_lazy_images();
        self.bookmarks.sync_buttons();

        info!(
            bindings = self.subscriptions.borrow().len(),
            reading_progress = self.reading_progress.get(),
            lazy_images,
            "Page booted"
        );
    }

    fn register_bindings(&self) {
        let host = self.ui.host();
        let limits = &self.ui.config().ui;
        let comment_counter = self.comments.ensure_counter();
        let mut subscriptions = self.subscriptions.borrow_mut();

        if let Some(title) = host.by_id("title") {
            let counter = host.by_id("title-count");
            subscriptions.bind(
                title,
                InputBinding::Counter {
                    counter,
                    max: Some(limits.title_max_chars),
                },
            );
        }

        if let Some(content) = host.by_id("content") {
            let counter = host.by_id("content-count");
            subscriptions.bind(content.clone(), InputBinding::Counter { counter, max: None });
            subscriptions.bind(content, InputBinding::AutoResize);
        }

        if let Some(comment) = host.by_id(COMMENT_FIELD_ID) {
            subscriptions.bind(
                comment.clone(),
                InputBinding::Counter {
                    counter: comment_counter,
                    max: Some(limits.comment_max_chars),
                },
            );
            subscriptions.bind(comment, InputBinding::AutoResize);
        }

        if host.by_id(FormKind::Register.element_id()).is_some() {
            if let Some(confirm) = host.by_id("confirm-password") {
                subscriptions.bind(confirm, InputBinding::ConfirmPassword);
            }
            if let Some(username) = host.by_id("username") {
                subscriptions.bind(username, InputBinding::Username);
            }
        }
    }

    /// Initial counter text and textarea height; live checks wait for input
    fn prime_input(&self, target: &H::Element) {
        let bindings = self.subscriptions.borrow().bindings_for(target);
        for binding in bindings {
            match binding {
                InputBinding::Counter {
                    counter: Some(counter),
                    ..
                } => {
                    let count = self.ui.host().value(target).chars().count();
                    self.ui.host().set_text(&counter, &count.to_string());
                }
                InputBinding::AutoResize => self.ui.auto_resize(target),
                _ => {}
            }
        }
    }

    /// Run every input binding of `target`
    fn apply_input(&self, target: &H::Element) {
        let bindings = self.subscriptions.borrow().bindings_for(target);
        for binding in bindings {
            match binding {
                InputBinding::Counter { counter, max } => {
                    self.ui.update_counter(target, counter.as_ref(), max)
                }
                InputBinding::AutoResize => self.ui.auto_resize(target),
                InputBinding::ConfirmPassword => self.forms.check_confirm_password(target),
                InputBinding::Username => self.forms.check_username(target),
            }
        }
    }

    /// Route one page event to its controller
    pub fn dispatch(&self, event: UiEvent<H::Element>) -> Dispatch {
        trace!(event = event.name(), "Dispatching event");

        match event {
            UiEvent::Submit { form } => self.on_submit(&form),
            UiEvent::Input { target } => {
                self.apply_input(&target);
                Dispatch::proceed()
            }
            UiEvent::Click { target } => self.on_click(&target),
            UiEvent::Focus { target } => {
                self.forms.on_focus(&target);
                self.comments.on_focus(&target);
                Dispatch::proceed()
            }
            UiEvent::Blur { target } => {
                self.forms.on_blur(&target);
                self.comments.on_blur(&target);
                Dispatch::proceed()
            }
            UiEvent::KeyDown { target, key, ctrl } => {
                Dispatch::with_task(self.comments.on_key_down(&target, &key, ctrl), None)
            }
            UiEvent::PointerEnter { target } => {
                self.posts.on_pointer(&target, true);
                Dispatch::proceed()
            }
            UiEvent::PointerLeave { target } => {
                self.posts.on_pointer(&target, false);
                Dispatch::proceed()
            }
            UiEvent::Scroll => {
                if self.reading_progress.get() {
                    self.posts.on_scroll();
                }
                self.posts.load_lazy_images();
                Dispatch::proceed()
            }
        }
    }

    /// Dispatch and drive any resulting request to completion
    pub async fn dispatch_and_wait(&self, event: UiEvent<H::Element>) -> EventOutcome {
        let dispatch = self.dispatch(event);
        if let Some(task) = dispatch.task {
            task.await;
        }
        dispatch.outcome
    }

    fn on_submit(&self, form: &H::Element) -> Dispatch {
        let host = self.ui.host();
        let Some(kind) = host
            .attr(form, "id")
            .and_then(|id| FormKind::from_element_id(&id))
        else {
            return Dispatch::proceed();
        };
        debug!(form = kind.element_id(), "Form submitted");

        match kind {
            FormKind::Comment => {
                let (outcome, task) = self.comments.on_submit(form);
                Dispatch::with_task(outcome, task)
            }
            _ => Dispatch::with_task(self.forms.on_submit(kind, form), None),
        }
    }

    fn on_click(&self, target: &H::Element) -> Dispatch {
        let host = self.ui.host();
        let Some((hook, element)) = ClickHook::ALL.into_iter().find_map(|hook| {
            host.closest(target, &Selector::class(hook.class()))
                .map(|element| (hook, element))
        }) else {
            return Dispatch::proceed();
        };

        if host.is_disabled(&element) {
            debug!(hook = hook.class(), "Click on disabled control ignored");
            return Dispatch::prevent();
        }
        debug!(hook = hook.class(), "Click routed");

        let post_id = || {
            host.attr(&element, "data-post-id")
                .and_then(|id| id.parse::<PostId>().ok())
        };

        match hook {
            ClickHook::Like => match post_id() {
                Some(post_id) => Dispatch::with_task(
                    EventOutcome::PreventDefault,
                    self.posts.toggle_like(post_id),
                ),
                None => Dispatch::proceed(),
            },
            ClickHook::DeletePost => {
                if let Some(post_id) = post_id() {
                    self.posts.delete_post(post_id);
                }
                Dispatch::prevent()
            }
            ClickHook::DeleteComment => {
                let comment_id = host
                    .attr(&element, "data-comment-id")
                    .and_then(|id| id.parse::<CommentId>().ok());
                match comment_id {
                    Some(comment_id) => Dispatch::with_task(
                        EventOutcome::PreventDefault,
                        self.comments.delete_comment(comment_id),
                    ),
                    None => Dispatch::proceed(),
                }
            }
            ClickHook::Bookmark => {
                if let Some(post_id) = post_id() {
                    self.bookmarks.toggle(post_id);
                }
                Dispatch::prevent()
            }
            ClickHook::Share => {
                if let Some(post_id) = post_id() {
                    let title = host.attr(&element, "data-post-title").unwrap_or_default();
                    self.posts.share_post(post_id, &title);
                }
                Dispatch::prevent()
            }
            ClickHook::DemoFill => {
                for field in self.forms.fill_demo() {
                    self.apply_input(&field);
                }
                Dispatch::prevent()
            }
        }
    }
}

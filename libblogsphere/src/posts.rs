//! Post interactions: likes, deletion, sharing, the reading progress bar and
//! deferred image loading

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::host::{Host, Selector, ShareData};
use crate::render;
use crate::types::{LikeState, PostId};
use crate::ui::Ui;

pub const LIKE_FAILED_MESSAGE: &str = "An error occurred while liking the post.";
pub const CONFIRM_DELETE_POST_MESSAGE: &str =
    "Are you sure you want to delete this post? This action cannot be undone.";
pub const SHARE_TEXT: &str = "Check out this blog post on BlogSphere!";
pub const URL_COPIED_MESSAGE: &str = "Post URL copied to clipboard!";

pub struct PostManager<H: Host> {
    ui: Ui<H>,
    api: Rc<ApiClient>,
    liking: Rc<RefCell<HashSet<PostId>>>,
}

impl<H: Host> Clone for PostManager<H> {
    fn clone(&self) -> Self {
        Self {
            ui: self.ui.clone(),
            api: Rc::clone(&self.api),
            liking: Rc::clone(&self.liking),
        }
    }
}

impl<H: Host> PostManager<H> {
    pub fn new(ui: Ui<H>, api: Rc<ApiClient>) -> Self {
        Self {
            ui,
            api,
            liking: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    fn like_buttons(&self, post_id: PostId) -> Vec<H::Element> {
        self.ui.host().query_all(
            None,
            &Selector::class("like-btn").with_attr("data-post-id", post_id),
        )
    }

    /// Ask the server to flip the like state of `post_id`
    ///
    /// The post's like buttons are disabled until the answer arrives, and a
    /// second toggle for the same post is dropped meanwhile.
    pub fn toggle_like(&self, post_id: PostId) -> Option<LocalBoxFuture<'static, ()>> {
        if !self.liking.borrow_mut().insert(post_id) {
            debug!(%post_id, "Like already in flight");
            return None;
        }

        let buttons = self.like_buttons(post_id);
        for button in &buttons {
            self.ui.host().set_disabled(button, true);
        }
        debug!(%post_id, "Toggling like");

        let this = self.clone();
        Some(
            async move {
                match this.api.like_post(post_id).await {
                    Ok(state) => this.apply_like(post_id, state),
                    Err(error) => this.ui.report_failure(&error, LIKE_FAILED_MESSAGE),
                }
                for button in &buttons {
                    this.ui.host().set_disabled(button, false);
                }
                this.liking.borrow_mut().remove(&post_id);
            }
            .boxed_local(),
        )
    }

    /// Render the server's like state onto every like button of the post
    pub fn apply_like(&self, post_id: PostId, state: LikeState) {
        let host = self.ui.host();
        info!(%post_id, liked = state.liked, count = state.like_count, "Like state applied");

        for button in self.like_buttons(post_id) {
            if state.liked {
                host.add_class(&button, "liked");
                host.remove_class(&button, "btn-outline-danger");
                host.add_class(&button, "btn-danger");
            } else {
                host.remove_class(&button, "liked");
                host.remove_class(&button, "btn-danger");
                host.add_class(&button, "btn-outline-danger");
            }

            if let Some(label) = host.query_in(&button, &Selector::class("like-count")) {
                host.set_text(&label, &state.like_count.to_string());
            }
        }
    }

    /// Hover highlight on like buttons that are not liked yet
    pub fn on_pointer(&self, target: &H::Element, entered: bool) {
        let host = self.ui.host();
        if !host.has_class(target, "like-btn") || host.has_class(target, "liked") {
            return;
        }
        if entered {
            host.add_class(target, "text-danger");
        } else {
            host.remove_class(target, "text-danger");
        }
    }

    /// Confirm, then leave the page through `POST /delete_post/{id}`
    pub fn delete_post(&self, post_id: PostId) -> bool {
        if !self.ui.confirm(CONFIRM_DELETE_POST_MESSAGE) {
            return false;
        }
        let action = self.api.delete_post_action(post_id);
        info!(%post_id, action = %action, "Deleting post");
        self.ui.host().submit_form("POST", &action);
        true
    }

    /// Native share sheet, or copy the post URL when there is none
    pub fn share_post(&self, post_id: PostId, title: &str) {
        let host = self.ui.host();
        let url = render::post_url(&host.location_origin(), post_id);
        let data = ShareData {
            title: title.to_string(),
            text: SHARE_TEXT.to_string(),
            url: url.clone(),
        };

        if host.share(&data) {
            debug!(%post_id, "Shared through host");
            return;
        }
        if host.copy_to_clipboard(&url) {
            self.ui.alert(URL_COPIED_MESSAGE);
        }
    }

    /// Put a reading progress bar at the top of post pages
    ///
    /// Returns whether the page has one afterwards.
    pub fn install_reading_progress(&self) -> bool {
        let host = self.ui.host();
        if host.query(&Selector::class("post-content")).is_none() {
            return false;
        }
        if host.query(&Selector::class("reading-progress")).is_some() {
            return true;
        }
        match host.query(&Selector::tag("body")) {
            Some(body) => host.prepend(&body, &render::reading_progress()).is_some(),
            None => false,
        }
    }

    /// Move `data-src` into `src` for images that came within reach
    ///
    /// An image is in reach once its top edge is above the bottom of the
    /// viewport. Loaded images keep `data-src`; a matching `src` marks them
    /// done. Returns how many images were loaded by this call.
    pub fn load_lazy_images(&self) -> usize {
        let host = self.ui.host();
        let metrics = host.scroll_metrics();
        let horizon = metrics.scroll_top + metrics.client_height;

        let mut loaded = 0;
        for image in host.query_all(None, &Selector::tag("img").has_attr("data-src")) {
            let Some(source) = host.attr(&image, "data-src") else {
                continue;
            };
            if host.attr(&image, "src").as_deref() == Some(source.as_str())
                || host.offset_top(&image) > horizon
            {
                continue;
            }
            host.set_attr(&image, "src", &source);
            host.remove_class(&image, "lazy");
            loaded += 1;
        }

        if loaded > 0 {
            debug!(loaded, "Deferred images loaded");
        }
        loaded
    }

    /// Size the progress bar to the share of the page scrolled so far
    pub fn on_scroll(&self) -> Option<f64> {
        let host = self.ui.host();
        let container = host.query(&Selector::class("reading-progress"))?;
        let bar = host.query_in(&container, &Selector::class("progress-bar"))?;

        let percent = host.scroll_metrics().progress_percent();
        host.set_style(&bar, "width", &format!("{}%", percent));
        Some(percent)
    }
}

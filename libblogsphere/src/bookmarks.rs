//! Client-local bookmarks
//!
//! The bookmark set lives only in local storage, as a JSON array of post ids
//! under one key. It is never sent to the server.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::host::{Host, Selector, Window};
use crate::render;
use crate::types::PostId;
use crate::ui::Ui;

pub const BOOKMARK_ADDED_MESSAGE: &str = "Post added to bookmarks";
pub const BOOKMARK_REMOVED_MESSAGE: &str = "Post removed from bookmarks";
pub const BOOKMARKS_UNAVAILABLE_MESSAGE: &str = "Bookmarks are not available in this browser.";

/// Ordered set of bookmarked post ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmarks(Vec<PostId>);

impl Bookmarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, post_id: PostId) -> bool {
        self.0.contains(&post_id)
    }

    /// Flip membership of `post_id`; returns whether it is now bookmarked
    pub fn toggle(&mut self, post_id: PostId) -> bool {
        match self.0.iter().position(|id| *id == post_id) {
            Some(index) => {
                self.0.remove(index);
                false
            }
            None => {
                self.0.push(post_id);
                true
            }
        }
    }

    pub fn ids(&self) -> &[PostId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(text: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Read-modify-write access to the persisted bookmark set
pub struct BookmarkStore<'a, W: Window + ?Sized> {
    window: &'a W,
    key: &'a str,
}

impl<'a, W: Window + ?Sized> BookmarkStore<'a, W> {
    pub fn new(window: &'a W, key: &'a str) -> Self {
        Self { window, key }
    }

    /// The persisted set; a missing key is an empty set
    pub fn load(&self) -> Result<Bookmarks, StorageError> {
        match self.window.storage_get(self.key)? {
            Some(text) => Bookmarks::from_json(&text),
            None => Ok(Bookmarks::new()),
        }
    }

    pub fn save(&self, bookmarks: &Bookmarks) -> Result<(), StorageError> {
        self.window.storage_set(self.key, &bookmarks.to_json()?)
    }

    /// Toggle `post_id` in the persisted set
    ///
    /// A stored value that is not a JSON array of ids is replaced.
    pub fn toggle(&self, post_id: PostId) -> Result<bool, StorageError> {
        let mut bookmarks = match self.load() {
            Err(StorageError::Corrupt(error)) => {
                warn!(key = self.key, error = %error, "Discarding unreadable bookmarks");
                Bookmarks::new()
            }
            other => other?,
        };
        let bookmarked = bookmarks.toggle(post_id);
        self.save(&bookmarks)?;
        Ok(bookmarked)
    }
}

pub struct BookmarkController<H: Host> {
    ui: Ui<H>,
}

impl<H: Host> Clone for BookmarkController<H> {
    fn clone(&self) -> Self {
        Self {
            ui: self.ui.clone(),
        }
    }
}

impl<H: Host> BookmarkController<H> {
    pub fn new(ui: Ui<H>) -> Self {
        Self { ui }
    }

    fn store(&self) -> BookmarkStore<'_, H> {
        BookmarkStore::new(self.ui.host(), &self.ui.config().storage.bookmarks_key)
    }

    /// Toggle the bookmark for `post_id` and reflect it on the page
    pub fn toggle(&self, post_id: PostId) -> Option<bool> {
        match self.store().toggle(post_id) {
            Ok(bookmarked) => {
                info!(%post_id, bookmarked, "Bookmark toggled");
                self.ui.alert(if bookmarked {
                    BOOKMARK_ADDED_MESSAGE
                } else {
                    BOOKMARK_REMOVED_MESSAGE
                });
                self.update_buttons(post_id, bookmarked);
                Some(bookmarked)
            }
            Err(error) => {
                warn!(%post_id, error = %error, "Bookmark not saved");
                self.ui.alert(BOOKMARKS_UNAVAILABLE_MESSAGE);
                None
            }
        }
    }

    fn update_buttons(&self, post_id: PostId, bookmarked: bool) {
        let host = self.ui.host();
        let selector = Selector::class("bookmark-btn").with_attr("data-post-id", post_id);
        for button in host.query_all(None, &selector) {
            if bookmarked {
                host.add_class(&button, "bookmarked");
            } else {
                host.remove_class(&button, "bookmarked");
            }
            host.set_content(&button, &render::bookmark_label(bookmarked));
        }
    }

    /// Bring every bookmark button in line with the persisted set
    pub fn sync_buttons(&self) {
        let host = self.ui.host();
        let buttons = host.query_all(None, &Selector::class("bookmark-btn").has_attr("data-post-id"));
        if buttons.is_empty() {
            return;
        }

        let bookmarks = match self.store().load() {
            Ok(bookmarks) => bookmarks,
            Err(error) => {
                warn!(error = %error, "Could not read bookmarks");
                return;
            }
        };

        for button in buttons {
            let Some(post_id) = host
                .attr(&button, "data-post-id")
                .and_then(|id| id.parse::<PostId>().ok())
            else {
                continue;
            };
            if bookmarks.contains(post_id) {
                self.update_buttons(post_id, true);
            }
        }
    }
}

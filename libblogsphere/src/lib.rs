//! BlogSphere - client-side interaction layer for a server-rendered blog
//!
//! This library wires page events (form submits, clicks, input, scroll, key
//! presses) to the blog's JSON API, validates forms before they leave the
//! page and patches the document in place. It never touches a concrete page
//! directly: everything goes through the [`host::Host`] abstraction, so the
//! same controllers run in the browser and against the in-memory host used by
//! the tests.

pub mod api;
pub mod app;
pub mod bookmarks;
pub mod comments;
pub mod config;
pub mod error;
pub mod events;
pub mod forms;
pub mod host;
pub mod logging;
pub mod posts;
pub mod render;
pub mod types;
pub mod ui;
pub mod validation;

// Re-export commonly used types
pub use api::{ApiClient, ApiTransport, HttpResponse};
pub use app::{App, Dispatch};
pub use config::Config;
pub use error::{ApiError, BlogError, Result};
pub use events::{EventOutcome, UiEvent};
pub use host::{Dom, Host, Selector, Window};
pub use types::{CommentId, CommentView, FormKind, LikeState, PostId};

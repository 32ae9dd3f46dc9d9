//! Shared fixtures for integration tests: page builders and a booted app
//! wired to the in-memory host and the scripted transport.

#![allow(dead_code)]

use std::rc::Rc;

use libblogsphere::api::mock::MockTransport;
use libblogsphere::api::ApiTransport;
use libblogsphere::host::memory::{MemoryHost, NodeId};
use libblogsphere::render::Element;
use libblogsphere::{App, Config, Dom, EventOutcome, Selector, UiEvent};

pub struct Page {
    pub host: Rc<MemoryHost>,
    pub transport: Rc<MockTransport>,
    pub app: App<MemoryHost>,
}

impl Page {
    /// Mount `nodes` into a fresh document and boot the app over it
    pub fn boot(nodes: Vec<Element>) -> Self {
        Self::boot_with(nodes, Config::default(), |_| {})
    }

    /// Like [`Page::boot`], with a config and a hook to prepare the host
    /// (location, storage, scroll) before boot runs
    pub fn boot_with(nodes: Vec<Element>, config: Config, prepare: impl FnOnce(&MemoryHost)) -> Self {
        let host = Rc::new(MemoryHost::new());
        for node in nodes {
            host.mount(node);
        }
        prepare(&host);

        let transport = Rc::new(MockTransport::new());
        let api_transport: Rc<dyn ApiTransport> = transport.clone();
        let app = App::new(Rc::clone(&host), config, api_transport);
        app.boot();

        Self {
            host,
            transport,
            app,
        }
    }

    pub fn id(&self, id: &str) -> NodeId {
        self.host
            .by_id(id)
            .unwrap_or_else(|| panic!("no element #{}", id))
    }

    pub fn first(&self, class: &str) -> NodeId {
        self.host
            .query(&Selector::class(class))
            .unwrap_or_else(|| panic!("no element .{}", class))
    }

    pub fn text_of(&self, id: &str) -> String {
        self.host.text(&self.id(id))
    }

    pub fn type_into(&self, field: NodeId, value: &str) -> EventOutcome {
        self.host.set_value(&field, value);
        self.app.dispatch(UiEvent::Input { target: field }).outcome
    }

    pub async fn click(&self, target: NodeId) -> EventOutcome {
        self.app.dispatch_and_wait(UiEvent::Click { target }).await
    }

    pub async fn submit(&self, form_id: &str) -> EventOutcome {
        let form = self.id(form_id);
        self.app.dispatch_and_wait(UiEvent::Submit { form }).await
    }
}

pub fn like_button(post_id: u64, liked: bool, count: u64) -> Element {
    let state = if liked {
        "btn btn-sm like-btn liked btn-danger"
    } else {
        "btn btn-sm like-btn btn-outline-danger"
    };
    Element::new("button")
        .class(state)
        .attr("data-post-id", post_id.to_string())
        .child(Element::new("i").class("fas fa-heart"))
        .child(Element::new("span").class("like-count").text(count.to_string()))
}

pub fn bookmark_button(post_id: u64) -> Element {
    Element::new("button")
        .class("btn btn-sm bookmark-btn")
        .attr("data-post-id", post_id.to_string())
        .child(Element::new("i").class("far fa-bookmark"))
        .text(" Bookmark")
}

/// An existing, server-rendered comment with its delete button
pub fn existing_comment(comment_id: u64) -> Element {
    Element::new("div")
        .class("comment-item")
        .id(format!("comment-{}", comment_id))
        .child(Element::new("p").text("Earlier comment"))
        .child(
            Element::new("button")
                .class("btn btn-sm btn-outline-danger delete-comment-btn")
                .attr("data-comment-id", comment_id.to_string())
                .child(Element::new("i").class("fas fa-trash")),
        )
}

/// Post detail page for post 7 with `comments` already listed
pub fn post_page(comments: &[u64]) -> Vec<Element> {
    let mut list = Element::new("div").id("comments-list");
    if comments.is_empty() {
        list = list.child(
            Element::new("div")
                .class("text-center py-4")
                .text("No comments yet. Be the first!"),
        );
    }
    for id in comments {
        list = list.child(existing_comment(*id));
    }

    vec![
        Element::new("div").class("toast-container"),
        Element::new("div")
            .class("alert flash-message")
            .text("Welcome back!"),
        Element::new("article")
            .class("post-content")
            .child(Element::new("h1").text("Hello"))
            .child(like_button(7, false, 4))
            .child(bookmark_button(7))
            .child(
                Element::new("button")
                    .class("btn btn-sm share-btn")
                    .attr("data-post-id", "7")
                    .attr("data-post-title", "Hello"),
            )
            .child(
                Element::new("button")
                    .class("btn btn-danger delete-post-btn")
                    .attr("data-post-id", "7")
                    .text("Delete"),
            ),
        Element::new("div").id("comments-section").child(
            Element::new("h4")
                .text("Comments (")
                .child(Element::new("span").class("comment-count").text(comments.len().to_string()))
                .text(")"),
        ),
        Element::new("div").class("card-body").child(
            Element::new("form")
                .id("comment-form")
                .attr("data-post-id", "7")
                .child(
                    Element::new("textarea")
                        .id("comment-content")
                        .class("form-control")
                        .attr("name", "content"),
                )
                .child(
                    Element::new("button")
                        .class("btn btn-primary")
                        .attr("type", "submit")
                        .text("Post Comment"),
                ),
        ),
        list,
    ]
}

/// A `.mb-3` group holding one named `.form-control` input
pub fn form_field(id: &str, value: &str) -> Element {
    Element::new("div").class("mb-3").child(
        Element::new("input")
            .id(id)
            .class("form-control")
            .attr("name", id)
            .attr("value", value),
    )
}

pub fn register_page(username: &str, email: &str, password: &str, confirm: &str) -> Vec<Element> {
    vec![Element::new("form")
        .id("register-form")
        .child(form_field("username", username))
        .child(form_field("email", email))
        .child(form_field("password", password))
        .child(form_field("confirm-password", confirm))
        .child(
            Element::new("button")
                .attr("type", "submit")
                .text("Create Account"),
        )]
}

pub fn post_editor(form_id: &str, title: &str, content: &str) -> Vec<Element> {
    vec![Element::new("form")
        .id(form_id)
        .child(form_field("title", title))
        .child(Element::new("small").child(Element::new("span").id("title-count").text("0")))
        .child(
            Element::new("div").class("mb-3").child(
                Element::new("textarea")
                    .id("content")
                    .class("form-control")
                    .attr("name", "content")
                    .text(content),
            ),
        )
        .child(Element::new("small").child(Element::new("span").id("content-count").text("0")))
        .child(Element::new("button").attr("type", "submit").text("Publish"))]
}

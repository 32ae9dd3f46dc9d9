//! Comment workflow tests
//!
//! Drive the comment form and delete buttons of a booted post page through
//! `App::dispatch` and check both the requests sent and the page afterwards.

mod common;

use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use serde_json::json;

use common::{post_page, Page};
use libblogsphere::api::HttpResponse;
use libblogsphere::comments::{
    ADD_FAILED_MESSAGE, COMMENT_ADDED_MESSAGE, COMMENT_DELETED_MESSAGE, CONFIRM_DELETE_MESSAGE,
    EMPTY_COMMENT_MESSAGE,
};
use libblogsphere::host::Dom;
use libblogsphere::render::Element;
use libblogsphere::ui::LOGIN_REQUIRED_MESSAGE;
use libblogsphere::{Config, EventOutcome, Selector, UiEvent};

fn created(id: u64, content: &str) -> serde_json::Value {
    json!({
        "success": true,
        "comment": {
            "id": id,
            "author": "alice",
            "content": content,
            "created_at": "2024-01-15 10:30:00"
        }
    })
}

fn submit_button(page: &Page) -> libblogsphere::host::memory::NodeId {
    let form = page.id("comment-form");
    page.host
        .query_in(&form, &Selector::tag("button"))
        .expect("comment form has a submit button")
}

#[tokio::test]
async fn test_add_comment_patches_page() -> Result<()> {
    let page = Page::boot(post_page(&[]));
    page.transport.reply_json(200, created(42, "hi\n<there>"));

    let field = page.id("comment-content");
    page.type_into(field, "  hi\n<there>  ");
    let outcome = page.submit("comment-form").await;

    assert_eq!(outcome, EventOutcome::PreventDefault);

    let requests = page.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "/api/add_comment");
    assert_eq!(
        requests[0].body,
        Some(json!({"post_id": 7, "content": "hi\n<there>"}))
    );

    // New comment sits at the top of the list, content escaped
    let list = page.id("comments-list");
    let item = page.id("comment-42");
    assert_eq!(
        page.host.query_in(&list, &Selector::class("comment-item")),
        Some(item)
    );
    let html = page.host.html(&item);
    assert!(html.contains("hi<br>&lt;there&gt;"));
    assert!(html.contains("alice"));
    assert!(html.contains(r#"data-comment-id="42""#));

    assert_eq!(page.host.value(&field), "");
    assert_eq!(page.text_of("comment-counter"), "0");
    assert_eq!(page.host.text(&page.first("comment-count")), "1");
    assert!(!page.host.is_visible(&page.first("py-4")));
    assert!(!page.host.is_disabled(&submit_button(&page)));

    let toasts = page.host.text(&page.first("toast-container"));
    assert!(toasts.contains(COMMENT_ADDED_MESSAGE));
    assert_eq!(page.host.scroll_requests().len(), 1);
    assert!(page.host.alerts().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_blank_comment_is_rejected_locally() {
    let page = Page::boot(post_page(&[]));

    page.type_into(page.id("comment-content"), "   \n ");
    let outcome = page.submit("comment-form").await;

    assert_eq!(outcome, EventOutcome::PreventDefault);
    assert_eq!(page.transport.request_count(), 0);
    assert_eq!(page.host.alerts(), vec![EMPTY_COMMENT_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_add_comment_application_failure_shows_server_message() {
    let page = Page::boot(post_page(&[]));
    page.transport
        .reply_json(200, json!({"success": false, "message": "Post not found"}));

    page.type_into(page.id("comment-content"), "Nice post");
    page.submit("comment-form").await;

    assert_eq!(page.host.last_alert().as_deref(), Some("Post not found"));
    assert!(page.host.by_id("comment-42").is_none());
    assert_eq!(page.host.text(&page.first("comment-count")), "0");
    assert_eq!(page.host.value(&page.id("comment-content")), "Nice post");
    assert!(!page.host.is_disabled(&submit_button(&page)));
}

#[tokio::test]
async fn test_add_comment_network_failure_shows_generic_message() {
    let page = Page::boot(post_page(&[]));
    page.transport.fail("connection refused");

    page.type_into(page.id("comment-content"), "Nice post");
    page.submit("comment-form").await;

    assert_eq!(page.host.last_alert().as_deref(), Some(ADD_FAILED_MESSAGE));
    assert!(page.host.navigations().is_empty());
}

#[tokio::test]
async fn test_add_comment_unauthorized_redirects_to_login() {
    let page = Page::boot(post_page(&[]));
    page.transport.reply(HttpResponse::new(401, ""));

    page.type_into(page.id("comment-content"), "Nice post");
    page.submit("comment-form").await;

    assert_eq!(page.host.last_alert().as_deref(), Some(LOGIN_REQUIRED_MESSAGE));
    assert_eq!(page.host.navigations(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_dropped() {
    let page = Page::boot(post_page(&[]));
    let held = page.transport.hold();

    page.type_into(page.id("comment-content"), "First");
    let form = page.id("comment-form");
    let mut task = page
        .app
        .dispatch(UiEvent::Submit { form })
        .task
        .expect("request started");
    assert!((&mut task).now_or_never().is_none());
    assert!(page.host.is_disabled(&submit_button(&page)));

    let second = page.app.dispatch(UiEvent::Submit { form });
    assert_eq!(second.outcome, EventOutcome::PreventDefault);
    assert!(second.task.is_none());
    assert_eq!(page.transport.request_count(), 1);

    held.release_json(200, created(1, "First"));
    task.await;
    assert!(!page.host.is_disabled(&submit_button(&page)));
    assert!(page.host.by_id("comment-1").is_some());

    // Free again once the first request settled
    page.transport.reply_json(200, created(2, "Second"));
    page.type_into(page.id("comment-content"), "Second");
    page.submit("comment-form").await;
    assert_eq!(page.transport.request_count(), 2);
    assert_eq!(page.host.text(&page.first("comment-count")), "2");
}

#[tokio::test]
async fn test_post_id_falls_back_to_location_path() {
    let nodes = vec![
        Element::new("form")
            .id("comment-form")
            .child(Element::new("textarea").id("comment-content"))
            .child(Element::new("button").attr("type", "submit")),
        Element::new("div").id("comments-list"),
    ];
    let page = Page::boot_with(nodes, Config::default(), |host| {
        host.set_location("http://localhost", "/post/12")
    });
    page.transport.reply_json(200, created(3, "Hello"));

    page.type_into(page.id("comment-content"), "Hello");
    page.submit("comment-form").await;

    let requests = page.transport.requests();
    assert_eq!(requests[0].body.as_ref().map(|b| b["post_id"].clone()), Some(json!(12)));
}

#[tokio::test]
async fn test_comment_without_post_id_sends_nothing() {
    let nodes = vec![Element::new("form")
        .id("comment-form")
        .child(Element::new("textarea").id("comment-content"))];
    let page = Page::boot(nodes);

    page.type_into(page.id("comment-content"), "Hello");
    let outcome = page.submit("comment-form").await;

    assert_eq!(outcome, EventOutcome::PreventDefault);
    assert_eq!(page.transport.request_count(), 0);
    assert!(page.host.alerts().is_empty());
}

#[tokio::test]
async fn test_delete_comment_fades_then_removes() {
    let page = Page::boot(post_page(&[5, 6]));
    page.transport.reply_json(200, json!({"success": true}));

    let item = page.id("comment-5");
    let button = page
        .host
        .query_in(&item, &Selector::class("delete-comment-btn"))
        .expect("delete button");
    let icon = page
        .host
        .query_in(&item, &Selector::tag("i"))
        .expect("trash icon");
    let outcome = page.click(icon).await;

    assert_eq!(outcome, EventOutcome::PreventDefault);
    assert!(!page.host.is_disabled(&button));
    assert_eq!(page.host.confirms(), vec![CONFIRM_DELETE_MESSAGE.to_string()]);
    assert_eq!(page.transport.requests()[0].url, "/api/delete_comment/5");
    assert_eq!(page.transport.requests()[0].body, None);

    assert!(page.host.has_class(&item, "animate__fadeOut"));
    assert!(page.host.is_attached(&item));
    assert_eq!(page.host.text(&page.first("comment-count")), "1");

    page.host.advance(Duration::from_millis(299));
    assert!(page.host.is_attached(&item));
    page.host.advance(Duration::from_millis(1));
    assert!(!page.host.is_attached(&item));
    assert!(page.host.is_attached(&page.id("comment-6")));

    let toasts = page.host.text(&page.first("toast-container"));
    assert!(toasts.contains(COMMENT_DELETED_MESSAGE));
}

#[tokio::test]
async fn test_delete_button_disabled_while_in_flight() {
    let page = Page::boot(post_page(&[5]));
    let held = page.transport.hold();
    let button = page.first("delete-comment-btn");

    let mut task = page
        .app
        .dispatch(UiEvent::Click { target: button })
        .task
        .expect("request started");
    assert!((&mut task).now_or_never().is_none());
    assert!(page.host.is_disabled(&button));

    let second = page.app.dispatch(UiEvent::Click { target: button });
    assert_eq!(second.outcome, EventOutcome::PreventDefault);
    assert!(second.task.is_none());
    assert_eq!(page.host.confirms().len(), 1);

    held.release_json(500, json!({"success": false, "message": "Database busy"}));
    task.await;
    assert!(!page.host.is_disabled(&button));
    assert!(page.host.is_attached(&page.id("comment-5")));
    assert_eq!(page.transport.request_count(), 1);
}

#[tokio::test]
async fn test_cancelled_delete_sends_nothing() {
    let page = Page::boot(post_page(&[5]));
    page.host.answer_confirm(false);

    let button = page.first("delete-comment-btn");
    page.click(button).await;

    assert_eq!(page.transport.request_count(), 0);
    assert!(!page.host.has_class(&page.id("comment-5"), "animate__fadeOut"));
}

#[tokio::test]
async fn test_delete_failure_keeps_comment() {
    let page = Page::boot(post_page(&[5]));
    page.transport.reply_json(
        500,
        json!({"success": false, "message": "Database error"}),
    );

    page.click(page.first("delete-comment-btn")).await;

    assert_eq!(page.host.last_alert().as_deref(), Some("Database error"));
    let item = page.id("comment-5");
    assert!(!page.host.has_class(&item, "animate__fadeOut"));
    assert_eq!(page.host.text(&page.first("comment-count")), "1");
}

#[tokio::test]
async fn test_comment_count_never_goes_negative() {
    let page = Page::boot(post_page(&[5]));
    page.host.set_text(&page.first("comment-count"), "0");
    page.transport.reply_json(200, json!({"success": true}));

    page.click(page.first("delete-comment-btn")).await;

    assert_eq!(page.host.text(&page.first("comment-count")), "0");
}

#[tokio::test]
async fn test_comment_count_saturates_at_largest_value() {
    let page = Page::boot(post_page(&[]));
    let largest = i64::MAX.to_string();
    page.host.set_text(&page.first("comment-count"), &largest);
    page.transport.reply_json(200, created(3, "One more"));

    page.type_into(page.id("comment-content"), "One more");
    page.submit("comment-form").await;

    assert_eq!(page.host.text(&page.first("comment-count")), largest);
}

#[tokio::test]
async fn test_empty_state_returns_after_last_comment_is_deleted() {
    let page = Page::boot(post_page(&[]));
    let empty = page.first("py-4");
    page.transport.reply_json(200, created(9, "Only one"));
    page.transport.reply_json(200, json!({"success": true}));

    page.type_into(page.id("comment-content"), "Only one");
    page.submit("comment-form").await;
    assert!(!page.host.is_visible(&empty));

    page.click(page.first("delete-comment-btn")).await;
    assert_eq!(page.host.text(&page.first("comment-count")), "0");
    assert!(page.host.is_visible(&empty));
}

#[test]
fn test_bold_shortcut_wraps_selection() {
    let page = Page::boot(post_page(&[]));
    let field = page.id("comment-content");
    page.host.set_value(&field, "hello world");
    page.host.set_selection(&field, 6, 11);

    let dispatch = page.app.dispatch(UiEvent::KeyDown {
        target: field,
        key: "b".to_string(),
        ctrl: true,
    });

    assert_eq!(dispatch.outcome, EventOutcome::PreventDefault);
    assert_eq!(page.host.value(&field), "hello **world**");
    assert_eq!(page.host.selection(&field), (8, 13));
    assert_eq!(page.host.focused(), Some(field));
}

#[test]
fn test_shortcuts_ignore_plain_keys_and_other_fields() {
    let page = Page::boot(post_page(&[]));
    let field = page.id("comment-content");
    page.host.set_value(&field, "text");

    let plain = page.app.dispatch(UiEvent::KeyDown {
        target: field,
        key: "b".to_string(),
        ctrl: false,
    });
    assert_eq!(plain.outcome, EventOutcome::Proceed);

    let other = page.first("like-btn");
    let elsewhere = page.app.dispatch(UiEvent::KeyDown {
        target: other,
        key: "i".to_string(),
        ctrl: true,
    });
    assert_eq!(elsewhere.outcome, EventOutcome::Proceed);
    assert_eq!(page.host.value(&field), "text");
}

#[test]
fn test_comment_counter_is_created_and_flags_overflow() {
    let page = Page::boot(post_page(&[]));
    let counter = page.id("comment-counter");
    assert_eq!(page.host.text(&counter), "0");

    let field = page.id("comment-content");
    page.type_into(field, &"x".repeat(1001));
    assert_eq!(page.host.text(&counter), "1001");
    assert!(page.host.has_class(&counter, "text-danger"));
    assert!(page.host.has_class(&field, "is-invalid"));

    page.type_into(field, &"x".repeat(1000));
    assert!(!page.host.has_class(&counter, "text-danger"));
    assert!(!page.host.has_class(&field, "is-invalid"));
}

#[test]
fn test_comment_card_focus_styling() {
    let page = Page::boot(post_page(&[]));
    let field = page.id("comment-content");
    let card = page.first("card-body");

    page.app.dispatch(UiEvent::Focus { target: field });
    assert!(page.host.has_class(&card, "comment-focused"));

    page.host.set_value(&field, "draft");
    page.app.dispatch(UiEvent::Blur { target: field });
    assert!(page.host.has_class(&card, "comment-focused"));

    page.host.set_value(&field, "  ");
    page.app.dispatch(UiEvent::Blur { target: field });
    assert!(!page.host.has_class(&card, "comment-focused"));
}

//! Scripted transport for testing
//!
//! Replies are queued up front and consumed in order. Every request is
//! recorded so tests can assert on URLs and bodies. A reply can also be held
//! open and released later through a [`HeldReply`], which lets tests observe
//! the page while a request is still in flight.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::Value;

use crate::api::{ApiTransport, HttpResponse};
use crate::error::ApiError;

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Option<Value>,
}

enum Scripted {
    Reply(HttpResponse),
    NetworkError(String),
    Held(oneshot::Receiver<HttpResponse>),
}

/// Releases a held reply
pub struct HeldReply {
    sender: oneshot::Sender<HttpResponse>,
}

impl HeldReply {
    pub fn release(self, response: HttpResponse) {
        // The request may have been dropped already; nothing to deliver then
        let _ = self.sender.send(response);
    }

    pub fn release_json(self, status: u16, body: Value) {
        self.release(HttpResponse::json(status, &body));
    }
}

#[derive(Default)]
pub struct MockTransport {
    script: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, response: HttpResponse) {
        self.script.borrow_mut().push_back(Scripted::Reply(response));
    }

    pub fn reply_json(&self, status: u16, body: Value) {
        self.reply(HttpResponse::json(status, &body));
    }

    /// Queue a transport failure (connection refused, reset, ...)
    pub fn fail(&self, reason: &str) {
        self.script
            .borrow_mut()
            .push_back(Scripted::NetworkError(reason.to_string()));
    }

    /// Queue a reply that stays pending until released
    pub fn hold(&self) -> HeldReply {
        let (sender, receiver) = oneshot::channel();
        self.script.borrow_mut().push_back(Scripted::Held(receiver));
        HeldReply { sender }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Number of scripted replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

#[async_trait(?Send)]
impl ApiTransport for MockTransport {
    async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: url.to_string(),
            body: body.cloned(),
        });

        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::NetworkError(reason)) => Err(ApiError::Transport(reason)),
            Some(Scripted::Held(receiver)) => receiver
                .await
                .map_err(|_| ApiError::Transport("held reply was dropped".to_string())),
            None => Err(ApiError::Transport(format!("no scripted reply for {}", url))),
        }
    }
}

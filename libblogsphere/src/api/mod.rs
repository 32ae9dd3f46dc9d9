//! BlogSphere JSON API client
//!
//! Every endpoint answers with an envelope carrying a `success` flag and,
//! on failure, a `message`. [`ApiClient`] builds the requests, hands them to an
//! [`ApiTransport`] and turns the envelope into either the typed payload or an
//! [`ApiError`] that [`crate::ui::Ui::report_failure`] knows how to present.
//!
//! Two transports ship with the crate:
//!
//! - [`http::HttpTransport`], backed by `reqwest`
//! - [`mock::MockTransport`], scripted replies for tests

use std::rc::Rc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::ApiError;
use crate::types::{CommentId, CommentView, LikeState, PostId};

pub mod http;

// Mock transport is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Raw HTTP answer: status code and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a POST request and returns whatever the server answered
///
/// Transports only fail for transport reasons; status codes are returned as
/// data and classified by [`ApiClient`].
#[async_trait(?Send)]
pub trait ApiTransport {
    async fn post(&self, url: &str, body: Option<&Value>) -> Result<HttpResponse, ApiError>;
}

#[derive(Debug, Deserialize)]
struct AddCommentPayload {
    comment: CommentView,
}

pub struct ApiClient {
    transport: Rc<dyn ApiTransport>,
    config: Rc<Config>,
}

impl ApiClient {
    pub fn new(transport: Rc<dyn ApiTransport>, config: Rc<Config>) -> Self {
        Self { transport, config }
    }

    /// `POST /api/add_comment`
    #[instrument(skip(self, content), fields(len = content.chars().count()))]
    pub async fn add_comment(&self, post_id: PostId, content: &str) -> Result<CommentView, ApiError> {
        let body = json!({ "post_id": post_id, "content": content });
        let payload: AddCommentPayload = self.call("/api/add_comment", Some(&body)).await?;
        Ok(payload.comment)
    }

    /// `POST /api/delete_comment/{id}`
    #[instrument(skip(self))]
    pub async fn delete_comment(&self, comment_id: CommentId) -> Result<(), ApiError> {
        let path = format!("/api/delete_comment/{}", comment_id);
        let _: serde::de::IgnoredAny = self.call(&path, None).await?;
        Ok(())
    }

    /// `POST /api/like_post`; the answer is the authoritative like state
    #[instrument(skip(self))]
    pub async fn like_post(&self, post_id: PostId) -> Result<LikeState, ApiError> {
        let body = json!({ "post_id": post_id });
        self.call("/api/like_post", Some(&body)).await
    }

    /// Target of the full-page form submission that deletes a post
    pub fn delete_post_action(&self, post_id: PostId) -> String {
        self.config.endpoint(&format!("/delete_post/{}", post_id))
    }

    async fn call<T: DeserializeOwned>(&self, path: &str, body: Option<&Value>) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        debug!(url = %url, "Sending request");

        let response = self.transport.post(&url, body).await?;
        debug!(status = response.status, "Response received");

        decode_envelope(response)
    }
}

/// Classify a raw response and extract the payload of a successful envelope
pub fn decode_envelope<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let parsed = serde_json::from_str::<Value>(&response.body);

    if !response.is_success() {
        let message = parsed
            .ok()
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(ApiError::from_status(response.status, message));
    }

    let value = parsed.map_err(|e| ApiError::Decode(e.to_string()))?;

    if value.get("success").and_then(Value::as_bool) != Some(true) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ApiError::Application(message));
    }

    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

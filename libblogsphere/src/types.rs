//! Core types shared by the controllers

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-side post identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

/// Server-side comment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PostId)
    }
}

impl FromStr for CommentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CommentId)
    }
}

/// Timestamp format the server uses for `created_at`
pub const SERVER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A freshly created comment as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: CommentId,
    pub author: String,
    pub content: String,
    pub created_at: String,
}

impl CommentView {
    /// Element id the comment is addressable by
    pub fn element_id(&self) -> String {
        comment_element_id(self.id)
    }

    /// Human-readable creation time, or the raw value when it does not parse
    pub fn display_time(&self) -> String {
        NaiveDateTime::parse_from_str(&self.created_at, SERVER_TIMESTAMP_FORMAT)
            .map(|ts| ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
            .unwrap_or_else(|_| self.created_at.clone())
    }
}

pub fn comment_element_id(id: CommentId) -> String {
    format!("comment-{}", id)
}

/// Like state for a single post, as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

/// Which of the intercepted forms a submit event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Login,
    Register,
    CreatePost,
    EditPost,
    Comment,
}

impl FormKind {
    pub const ALL: [FormKind; 5] = [
        FormKind::Login,
        FormKind::Register,
        FormKind::CreatePost,
        FormKind::EditPost,
        FormKind::Comment,
    ];

    pub fn element_id(&self) -> &'static str {
        match self {
            FormKind::Login => "login-form",
            FormKind::Register => "register-form",
            FormKind::CreatePost => "create-post-form",
            FormKind::EditPost => "edit-post-form",
            FormKind::Comment => "comment-form",
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.element_id() == id)
    }
}

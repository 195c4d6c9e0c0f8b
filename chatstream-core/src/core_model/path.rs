//! Locators into the remote store
//!
//! A [`Path`] names a feed, a participant list or a single record. The
//! [`PathScheme`] lays out where users' inboxes and group chats live under the
//! configured root and sandbox.

use super::types::{ChatId, SendableId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of path segments, rendered as `a/b/c`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { segments: segments.into_iter().map(Into::into).collect() }
    }

    /// Parse `a/b/c`. Empty segments are ignored.
    pub fn parse(s: &str) -> Self {
        Self::new(s.split('/').filter(|segment| !segment.is_empty()))
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// The path without its last segment
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self { segments: self.segments[..self.segments.len() - 1].to_vec() })
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Store layout under `{root}/{sandbox}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathScheme {
    base: Path,
}

impl PathScheme {
    pub fn new(root: &str, sandbox: &str) -> Self {
        Self { base: Path::parse(root).child(sandbox) }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `{base}/users/{user}`
    pub fn user_path(&self, user: &UserId) -> Path {
        self.base.child("users").child(user.as_str())
    }

    /// A user's inbox: `{base}/users/{user}/messages`
    pub fn messages_path(&self, user: &UserId) -> Path {
        self.user_path(user).child("messages")
    }

    /// `{base}/users/{user}/messages/{id}`
    pub fn message_path(&self, user: &UserId, id: &SendableId) -> Path {
        self.messages_path(user).child(id.as_str())
    }

    /// Chats a user belongs to: `{base}/users/{user}/chats`
    pub fn user_chats_path(&self, user: &UserId) -> Path {
        self.user_path(user).child("chats")
    }

    /// `{base}/chats/{chat}`
    pub fn chat_path(&self, chat: &ChatId) -> Path {
        self.base.child("chats").child(chat.as_str())
    }

    /// `{base}/chats/{chat}/messages`
    pub fn chat_messages_path(&self, chat: &ChatId) -> Path {
        self.chat_path(chat).child("messages")
    }

    /// `{base}/chats/{chat}/users`
    pub fn chat_users_path(&self, chat: &ChatId) -> Path {
        self.chat_path(chat).child("users")
    }
}

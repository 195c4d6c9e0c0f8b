//! Test fixtures for creating common test objects
//!
//! Provides a chat wired to an [`InMemoryAdapter`] plus shortcuts for the
//! store writes a remote participant would make.

use crate::config::ChatConfig;
use crate::core_chat::{Chat, ChatPaths, InMemoryAdapter, RemoteAdapter};
use crate::core_model::{ChatId, Message, Path, PathScheme, Sendable, UserId};
use std::sync::Arc;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

/// Store layout used by every fixture
pub fn test_scheme() -> PathScheme {
    PathScheme::new("chatstream", "test")
}

/// A chat for `alice` on an in-memory store
///
/// Must be built inside a tokio runtime.
pub struct ChatFixture {
    pub adapter: Arc<InMemoryAdapter>,
    pub chat: Chat,
    pub scheme: PathScheme,
}

impl ChatFixture {
    /// Alice's one-to-one chat with default settings
    pub fn one_to_one() -> Self {
        Self::one_to_one_with_config(ChatConfig::default())
    }

    pub fn one_to_one_with_config(config: ChatConfig) -> Self {
        let scheme = test_scheme();
        let alice = UserId::new(ALICE);
        let paths = ChatPaths::one_to_one(&scheme, &alice);
        Self::build(scheme, paths, config)
    }

    /// Alice's view of group chat `chat_id`
    pub fn group(chat_id: &str) -> Self {
        let scheme = test_scheme();
        let paths = ChatPaths::group(&scheme, &ChatId::new(chat_id));
        Self::build(scheme, paths, ChatConfig::default())
    }

    fn build(scheme: PathScheme, paths: ChatPaths, config: ChatConfig) -> Self {
        let alice = UserId::new(ALICE);
        let adapter = Arc::new(InMemoryAdapter::new(alice.clone()));
        let remote: Arc<dyn RemoteAdapter> = adapter.clone();
        let chat = Chat::new(remote, paths, alice, config);
        Self { adapter, chat, scheme }
    }

    /// Path of the chat's live feed
    pub fn feed(&self) -> Path {
        self.chat.paths().messages().clone()
    }

    /// Write `sendable` to the chat's feed as the store would receive it
    pub fn deliver(&self, sendable: Sendable) -> Sendable {
        self.adapter.insert(&self.feed(), sendable)
    }

    /// Write a text message from `from` to the chat's feed
    pub fn deliver_text(&self, from: &str, text: &str) -> Sendable {
        self.deliver(Message::with_text(UserId::new(from), text))
    }
}

//! Where a chat reads and writes
//!
//! A one-to-one chat listens on the local user's inbox and writes into each
//! recipient's inbox. A group chat reads and writes a single shared feed and
//! keeps its participant list next to it.

use crate::core_model::{ChatId, Message, Path, PathScheme, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    /// Outbound goes to the recipient's inbox under this scheme
    Inbox(PathScheme),
    /// Outbound goes to the chat's own feed
    Feed,
}

/// Resolved paths for one chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPaths {
    messages: Path,
    participants: Option<Path>,
    route: Route,
}

impl ChatPaths {
    /// Inbox-style chat for `local_user`
    pub fn one_to_one(scheme: &PathScheme, local_user: &UserId) -> Self {
        Self {
            messages: scheme.messages_path(local_user),
            participants: None,
            route: Route::Inbox(scheme.clone()),
        }
    }

    /// Shared-feed chat with a participant list
    pub fn group(scheme: &PathScheme, chat: &ChatId) -> Self {
        Self {
            messages: scheme.chat_messages_path(chat),
            participants: Some(scheme.chat_users_path(chat)),
            route: Route::Feed,
        }
    }

    /// Shared-feed chat on arbitrary paths
    pub fn custom(messages: Path, participants: Option<Path>) -> Self {
        Self {
            messages,
            participants,
            route: Route::Feed,
        }
    }

    /// Path of the live feed
    pub fn messages(&self) -> &Path {
        &self.messages
    }

    pub fn participants(&self) -> Option<&Path> {
        self.participants.as_ref()
    }

    /// Where a sendable addressed to `recipient` is written
    pub fn outbound_path(&self, recipient: &UserId) -> Path {
        match &self.route {
            Route::Inbox(scheme) => scheme.messages_path(recipient),
            Route::Feed => self.messages.clone(),
        }
    }

    /// Where a receipt for `message` is written: back to its sender
    pub fn receipt_path(&self, message: &Message) -> Path {
        self.outbound_path(message.sender())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_to_one_routes_to_recipient_inbox() {
        let scheme = PathScheme::new("chat", "prod");
        let alice = UserId::new("alice");
        let paths = ChatPaths::one_to_one(&scheme, &alice);

        assert_eq!(paths.messages().to_string(), "chat/prod/users/alice/messages");
        assert_eq!(
            paths.outbound_path(&UserId::new("bob")).to_string(),
            "chat/prod/users/bob/messages"
        );
        assert!(paths.participants().is_none());
    }

    #[test]
    fn test_receipt_goes_back_to_sender() {
        let scheme = PathScheme::new("chat", "prod");
        let paths = ChatPaths::one_to_one(&scheme, &UserId::new("alice"));
        let sendable = Message::with_text(UserId::new("bob"), "hi");
        let message = Message::from_sendable(&sendable).unwrap();

        assert_eq!(paths.receipt_path(&message).to_string(), "chat/prod/users/bob/messages");
    }

    #[test]
    fn test_group_uses_shared_feed() {
        let scheme = PathScheme::new("chat", "prod");
        let chat = ChatId::new("c1");
        let paths = ChatPaths::group(&scheme, &chat);

        assert_eq!(paths.messages().to_string(), "chat/prod/chats/c1/messages");
        assert_eq!(paths.participants().unwrap().to_string(), "chat/prod/chats/c1/users");
        assert_eq!(paths.outbound_path(&UserId::new("bob")), *paths.messages());
    }
}

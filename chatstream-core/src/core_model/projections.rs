//! Typed projections of a [`Sendable`]
//!
//! Each projection exists only for a sendable of the matching kind. The
//! conversion `from_sendable` is total: a kind mismatch yields `None`.

use super::sendable::{body, Body, Sendable, SendableType};
use super::types::{ChatId, SendableId, UserId};

const KEY_TYPE: &str = "type";
const KEY_ID: &str = "id";
const KEY_TEXT: &str = "text";

macro_rules! projection {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Sendable);

        impl $name {
            /// Narrow a sendable to this projection
            pub fn from_sendable(sendable: &Sendable) -> Option<Self> {
                sendable.is_type(&$kind).then(|| Self(sendable.clone()))
            }

            pub fn sendable(&self) -> &Sendable {
                &self.0
            }

            pub fn into_sendable(self) -> Sendable {
                self.0
            }

            pub fn id(&self) -> &SendableId {
                &self.0.id
            }

            pub fn sender(&self) -> &UserId {
                &self.0.from
            }
        }
    };
}

projection!(
    /// A chat message
    Message => SendableType::Message
);
projection!(
    /// Acknowledges that a message was received or read
    DeliveryReceipt => SendableType::DeliveryReceipt
);
projection!(
    /// Typing indicator
    TypingState => SendableType::TypingState
);
projection!(
    /// Invitation to join a chat
    Invitation => SendableType::Invitation
);
projection!(
    /// User availability
    Presence => SendableType::Presence
);

impl Message {
    /// Prepare an outbound text message
    pub fn with_text(from: UserId, text: impl Into<String>) -> Sendable {
        Sendable::new(SendableType::Message, from, body([(KEY_TEXT, text.into())]))
    }

    /// Prepare an outbound message with a custom body
    pub fn with_body(from: UserId, body: Body) -> Sendable {
        Sendable::new(SendableType::Message, from, body)
    }

    pub fn text(&self) -> Option<&str> {
        self.0.body_str(KEY_TEXT)
    }
}

/// Receipt flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryReceiptType {
    Received,
    Read,
}

impl DeliveryReceiptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryReceiptType::Received => "received",
            DeliveryReceiptType::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "received" => Some(DeliveryReceiptType::Received),
            "read" => Some(DeliveryReceiptType::Read),
            _ => None,
        }
    }
}

impl DeliveryReceipt {
    /// Prepare an outbound receipt for `message_id`
    pub fn create(from: UserId, receipt_type: DeliveryReceiptType, message_id: &SendableId) -> Sendable {
        Sendable::new(
            SendableType::DeliveryReceipt,
            from,
            body([(KEY_TYPE, receipt_type.as_str()), (KEY_ID, message_id.as_str())]),
        )
    }

    pub fn receipt_type(&self) -> Option<DeliveryReceiptType> {
        self.0.body_str(KEY_TYPE).and_then(DeliveryReceiptType::parse)
    }

    /// The message this receipt acknowledges
    pub fn message_id(&self) -> Option<SendableId> {
        self.0.body_str(KEY_ID).map(SendableId::new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingStateType {
    Typing,
    None,
}

impl TypingStateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypingStateType::Typing => "typing",
            TypingStateType::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "typing" => Some(TypingStateType::Typing),
            "none" => Some(TypingStateType::None),
            _ => None,
        }
    }
}

impl TypingState {
    pub fn create(from: UserId, state: TypingStateType) -> Sendable {
        Sendable::new(SendableType::TypingState, from, body([(KEY_TYPE, state.as_str())]))
    }

    pub fn typing_state(&self) -> Option<TypingStateType> {
        self.0.body_str(KEY_TYPE).and_then(TypingStateType::parse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationType {
    Chat,
}

impl InvitationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationType::Chat => "chat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(InvitationType::Chat),
            _ => None,
        }
    }
}

impl Invitation {
    pub fn create(from: UserId, chat_id: &ChatId) -> Sendable {
        Sendable::new(
            SendableType::Invitation,
            from,
            body([(KEY_TYPE, InvitationType::Chat.as_str()), (KEY_ID, chat_id.as_str())]),
        )
    }

    pub fn invitation_type(&self) -> Option<InvitationType> {
        self.0.body_str(KEY_TYPE).and_then(InvitationType::parse)
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.0.body_str(KEY_ID).map(ChatId::new)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceType {
    Available,
    Busy,
    ExtendedAway,
    Unavailable,
}

impl PresenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceType::Available => "available",
            PresenceType::Busy => "busy",
            PresenceType::ExtendedAway => "extended_away",
            PresenceType::Unavailable => "unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(PresenceType::Available),
            "busy" => Some(PresenceType::Busy),
            "extended_away" => Some(PresenceType::ExtendedAway),
            "unavailable" => Some(PresenceType::Unavailable),
            _ => None,
        }
    }
}

impl Presence {
    pub fn create(from: UserId, presence: PresenceType) -> Sendable {
        Sendable::new(SendableType::Presence, from, body([(KEY_TYPE, presence.as_str())]))
    }

    pub fn presence_type(&self) -> Option<PresenceType> {
        self.0.body_str(KEY_TYPE).and_then(PresenceType::parse)
    }
}

/// A sendable narrowed to its kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypedSendable {
    Message(Message),
    DeliveryReceipt(DeliveryReceipt),
    TypingState(TypingState),
    Invitation(Invitation),
    Presence(Presence),
}

impl TypedSendable {
    /// Classify a sendable by kind. `None` for kinds without a projection.
    pub fn classify(sendable: &Sendable) -> Option<Self> {
        let typed = match sendable.kind() {
            SendableType::Message => TypedSendable::Message(Message(sendable.clone())),
            SendableType::DeliveryReceipt => {
                TypedSendable::DeliveryReceipt(DeliveryReceipt(sendable.clone()))
            }
            SendableType::TypingState => TypedSendable::TypingState(TypingState(sendable.clone())),
            SendableType::Invitation => TypedSendable::Invitation(Invitation(sendable.clone())),
            SendableType::Presence => TypedSendable::Presence(Presence(sendable.clone())),
            SendableType::Unknown(_) => return None,
        };
        Some(typed)
    }

    pub fn sendable(&self) -> &Sendable {
        match self {
            TypedSendable::Message(m) => m.sendable(),
            TypedSendable::DeliveryReceipt(r) => r.sendable(),
            TypedSendable::TypingState(t) => t.sendable(),
            TypedSendable::Invitation(i) => i.sendable(),
            TypedSendable::Presence(p) => p.sendable(),
        }
    }

    pub fn kind(&self) -> &SendableType {
        self.sendable().kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[test]
    fn test_projection_requires_matching_kind() {
        let msg = Message::with_text(alice(), "hello");
        assert!(Message::from_sendable(&msg).is_some());
        assert!(DeliveryReceipt::from_sendable(&msg).is_none());
        assert!(TypingState::from_sendable(&msg).is_none());
        assert!(Invitation::from_sendable(&msg).is_none());
        assert!(Presence::from_sendable(&msg).is_none());
        assert_eq!(Message::from_sendable(&msg).unwrap().text(), Some("hello"));
    }

    #[test]
    fn test_receipt_accessors() {
        let target = SendableId::new("m-7");
        let receipt = DeliveryReceipt::create(alice(), DeliveryReceiptType::Read, &target);
        let receipt = DeliveryReceipt::from_sendable(&receipt).unwrap();
        assert_eq!(receipt.receipt_type(), Some(DeliveryReceiptType::Read));
        assert_eq!(receipt.message_id(), Some(target));
    }

    #[test]
    fn test_typing_invitation_presence_accessors() {
        let typing = TypingState::create(alice(), TypingStateType::Typing);
        assert_eq!(
            TypingState::from_sendable(&typing).unwrap().typing_state(),
            Some(TypingStateType::Typing)
        );

        let chat = ChatId::new("c-1");
        let invite = Invitation::create(alice(), &chat);
        let invite = Invitation::from_sendable(&invite).unwrap();
        assert_eq!(invite.invitation_type(), Some(InvitationType::Chat));
        assert_eq!(invite.chat_id(), Some(chat));

        let presence = Presence::create(alice(), PresenceType::ExtendedAway);
        assert_eq!(
            Presence::from_sendable(&presence).unwrap().presence_type(),
            Some(PresenceType::ExtendedAway)
        );
    }

    #[test]
    fn test_malformed_body_yields_none_not_panic() {
        let odd = Sendable::new(SendableType::DeliveryReceipt, alice(), Body::new());
        let receipt = DeliveryReceipt::from_sendable(&odd).unwrap();
        assert_eq!(receipt.receipt_type(), None);
        assert_eq!(receipt.message_id(), None);
    }

    #[test]
    fn test_unknown_kind_is_not_classified() {
        let odd = Sendable::new(SendableType::Unknown("poll".into()), alice(), Body::new());
        assert!(TypedSendable::classify(&odd).is_none());
    }

    fn any_kind() -> impl Strategy<Value = SendableType> {
        prop_oneof![
            Just(SendableType::Message),
            Just(SendableType::DeliveryReceipt),
            Just(SendableType::TypingState),
            Just(SendableType::Invitation),
            Just(SendableType::Presence),
            "[a-z]{3,8}".prop_map(|s| SendableType::parse(&s)),
        ]
    }

    proptest! {
        #[test]
        fn prop_classification_preserves_kind(kind in any_kind()) {
            let sendable = Sendable::new(kind.clone(), alice(), Body::new());
            match TypedSendable::classify(&sendable) {
                Some(typed) => {
                    prop_assert!(kind.is_known());
                    prop_assert_eq!(typed.kind(), &kind);
                    prop_assert_eq!(typed.sendable(), &sendable);
                }
                None => prop_assert!(!kind.is_known()),
            }
        }
    }
}

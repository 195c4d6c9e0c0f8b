//! Merged event representation

use crate::core_chat::errors::ChatError;
use crate::core_model::{
    DeliveryReceipt, Invitation, Message, Presence, TypedSendable, TypingState,
};

/// One typed chat event, as published on the merged channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Message(Message),
    DeliveryReceipt(DeliveryReceipt),
    TypingState(TypingState),
    Invitation(Invitation),
    Presence(Presence),
    Error(ChatError),
}

impl ChatEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, ChatEvent::Error(_))
    }
}

impl From<TypedSendable> for ChatEvent {
    fn from(typed: TypedSendable) -> Self {
        match typed {
            TypedSendable::Message(m) => ChatEvent::Message(m),
            TypedSendable::DeliveryReceipt(r) => ChatEvent::DeliveryReceipt(r),
            TypedSendable::TypingState(t) => ChatEvent::TypingState(t),
            TypedSendable::Invitation(i) => ChatEvent::Invitation(i),
            TypedSendable::Presence(p) => ChatEvent::Presence(p),
        }
    }
}

impl From<ChatError> for ChatEvent {
    fn from(error: ChatError) -> Self {
        ChatEvent::Error(error)
    }
}

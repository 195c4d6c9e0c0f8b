//! Event Broadcasting System
//!
//! Fans sendables and errors out to any number of subscribers, one tokio
//! broadcast channel per typed projection plus a raw channel, an error channel
//! and a merged [`ChatEvent`] channel.
//!
//! Every current subscriber receives every event; late subscribers do not see
//! past events. A subscriber that falls more than `capacity` events behind
//! gets `RecvError::Lagged` and resumes from the oldest retained event.

use super::event::ChatEvent;
use crate::core_chat::errors::ChatError;
use crate::core_model::{
    DeliveryReceipt, Invitation, Message, Presence, Sendable, SendableType, TypedSendable,
    TypingState,
};
use tokio::sync::broadcast;

/// Per-kind broadcast hub for one chat
#[derive(Clone)]
pub struct Events {
    sendables: broadcast::Sender<Sendable>,
    messages: broadcast::Sender<Message>,
    delivery_receipts: broadcast::Sender<DeliveryReceipt>,
    typing_states: broadcast::Sender<TypingState>,
    invitations: broadcast::Sender<Invitation>,
    presences: broadcast::Sender<Presence>,
    errors: broadcast::Sender<ChatError>,
    all: broadcast::Sender<ChatEvent>,
}

impl Events {
    /// Create a hub whose channels each buffer `capacity` events
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sendables: broadcast::channel(capacity).0,
            messages: broadcast::channel(capacity).0,
            delivery_receipts: broadcast::channel(capacity).0,
            typing_states: broadcast::channel(capacity).0,
            invitations: broadcast::channel(capacity).0,
            presences: broadcast::channel(capacity).0,
            errors: broadcast::channel(capacity).0,
            all: broadcast::channel(capacity).0,
        }
    }

    /// Publish a sendable on the raw channel and on the channel for its kind
    ///
    /// Returns the kind it was classified as, or `None` when the kind has no
    /// typed channel (raw channel only).
    pub fn publish_sendable(&self, sendable: &Sendable) -> Option<SendableType> {
        let _ = self.sendables.send(sendable.clone());

        let typed = TypedSendable::classify(sendable)?;
        let kind = typed.kind().clone();
        match &typed {
            TypedSendable::Message(m) => {
                let _ = self.messages.send(m.clone());
            }
            TypedSendable::DeliveryReceipt(r) => {
                let _ = self.delivery_receipts.send(r.clone());
            }
            TypedSendable::TypingState(t) => {
                let _ = self.typing_states.send(t.clone());
            }
            TypedSendable::Invitation(i) => {
                let _ = self.invitations.send(i.clone());
            }
            TypedSendable::Presence(p) => {
                let _ = self.presences.send(p.clone());
            }
        }
        let _ = self.all.send(typed.into());
        Some(kind)
    }

    /// Publish an error on the error channel and the merged channel
    ///
    /// Returns the number of error subscribers that received it
    pub fn publish_error(&self, error: ChatError) -> usize {
        let count = self.errors.send(error.clone()).unwrap_or(0);
        let _ = self.all.send(ChatEvent::Error(error));
        count
    }

    pub fn subscribe_sendables(&self) -> broadcast::Receiver<Sendable> {
        self.sendables.subscribe()
    }

    pub fn subscribe_messages(&self) -> broadcast::Receiver<Message> {
        self.messages.subscribe()
    }

    pub fn subscribe_delivery_receipts(&self) -> broadcast::Receiver<DeliveryReceipt> {
        self.delivery_receipts.subscribe()
    }

    pub fn subscribe_typing_states(&self) -> broadcast::Receiver<TypingState> {
        self.typing_states.subscribe()
    }

    pub fn subscribe_invitations(&self) -> broadcast::Receiver<Invitation> {
        self.invitations.subscribe()
    }

    pub fn subscribe_presences(&self) -> broadcast::Receiver<Presence> {
        self.presences.subscribe()
    }

    /// Errors are a persistent stream; there is no terminal event
    pub fn subscribe_errors(&self) -> broadcast::Receiver<ChatError> {
        self.errors.subscribe()
    }

    /// Every typed event and error in publication order
    pub fn subscribe_all(&self) -> broadcast::Receiver<ChatEvent> {
        self.all.subscribe()
    }

    /// Number of live raw-channel subscribers
    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.sendables.receiver_count()
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new(256)
    }
}

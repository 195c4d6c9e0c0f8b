//! Connection lifecycle
//!
//! ```text
//!  Disconnected ──connect()──► Resolving ──bound resolved──► Connected
//!       ▲                         │                             │
//!       └──── failure / disconnect() ◄────── disconnect() / feed closed
//! ```
//!
//! [`Session`] is the state machine plus the subscription registry it owns.
//! It is always accessed under the chat's session lock, which is also the
//! gate every publication passes through.

use crate::core_chat::errors::{ChatError, ChatResult};
use crate::core_chat::registry::{Disposable, SubscriptionId, SubscriptionRegistry};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Where a chat is in its connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live feed. Initial and post-teardown state.
    Disconnected,
    /// Querying the replay point before opening the feed
    Resolving,
    /// Live feed open
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Resolving => "resolving",
            ConnectionState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle state and the resources opened under it
pub struct Session {
    state: ConnectionState,
    pending: Option<CancellationToken>,
    feed: Option<SubscriptionId>,
    registry: SubscriptionRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            pending: None,
            feed: None,
            registry: SubscriptionRegistry::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Disconnected → Resolving
    ///
    /// Returns the token that `disconnect` cancels to abort this attempt.
    /// Any other state rejects the call, so a second `connect` never opens a
    /// duplicate feed.
    pub fn begin_connect(&mut self) -> ChatResult<CancellationToken> {
        if self.state != ConnectionState::Disconnected {
            return Err(ChatError::AlreadyConnected);
        }
        let token = CancellationToken::new();
        self.state = ConnectionState::Resolving;
        self.pending = Some(token.clone());
        Ok(token)
    }

    /// Resolving → Disconnected after a failed attempt
    pub fn fail_connect(&mut self) {
        if self.state == ConnectionState::Resolving {
            self.state = ConnectionState::Disconnected;
        }
        self.pending = None;
    }

    /// Resolving → Connected, registering the live feed
    pub fn complete_connect(&mut self, id: SubscriptionId, feed: impl Disposable + 'static) {
        self.registry.insert(id, feed);
        self.feed = Some(id);
        self.pending = None;
        self.state = ConnectionState::Connected;
    }

    /// Register a resource to be released on teardown
    pub fn manage(&mut self, resource: impl Disposable + 'static) -> SubscriptionId {
        self.registry.add(resource)
    }

    pub fn register(&mut self, id: SubscriptionId, resource: impl Disposable + 'static) {
        self.registry.insert(id, resource);
    }

    /// Dispose one resource whose consumer has gone away
    pub fn release(&mut self, id: &SubscriptionId) -> bool {
        self.registry.remove(id)
    }

    /// An adapter stream ended on its own
    ///
    /// Returns `true` when it was the live feed, in which case the session
    /// drops back to Disconnected and releases everything opened under the
    /// connection.
    pub fn subscription_closed(&mut self, id: &SubscriptionId) -> bool {
        self.registry.remove(id);
        if self.feed.as_ref() == Some(id) {
            self.teardown();
            return true;
        }
        false
    }

    /// Any state → Disconnected. Cancels a pending connect and releases every
    /// registered resource. Returns how many resources were released.
    pub fn teardown(&mut self) -> usize {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.feed = None;
        self.state = ConnectionState::Disconnected;
        self.registry.dispose_all()
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let session = Session::new();
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.subscription_count(), 0);
    }

    #[test]
    fn test_happy_path() {
        let mut session = Session::new();
        let token = session.begin_connect().unwrap();
        assert_eq!(session.state(), ConnectionState::Resolving);

        session.complete_connect(SubscriptionId::generate(), token.clone());
        assert_eq!(session.state(), ConnectionState::Connected);
        assert_eq!(session.subscription_count(), 1);

        assert_eq!(session.teardown(), 1);
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_double_connect_rejected() {
        let mut session = Session::new();
        let token = session.begin_connect().unwrap();
        assert_eq!(session.begin_connect().unwrap_err(), ChatError::AlreadyConnected);

        session.complete_connect(SubscriptionId::generate(), token);
        assert_eq!(session.begin_connect().unwrap_err(), ChatError::AlreadyConnected);
        assert_eq!(session.subscription_count(), 1);
    }

    #[test]
    fn test_failed_resolution_allows_retry() {
        let mut session = Session::new();
        session.begin_connect().unwrap();
        session.fail_connect();
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(session.begin_connect().is_ok());
    }

    #[test]
    fn test_teardown_cancels_pending_connect() {
        let mut session = Session::new();
        let token = session.begin_connect().unwrap();
        assert_eq!(session.teardown(), 0);
        assert!(token.is_cancelled());
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut session = Session::new();
        assert_eq!(session.teardown(), 0);
        assert_eq!(session.teardown(), 0);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_feed_closed_disconnects_but_other_closures_do_not() {
        let mut session = Session::new();
        let token = session.begin_connect().unwrap();
        let feed = SubscriptionId::generate();
        session.complete_connect(feed, token);

        let list = SubscriptionId::generate();
        session.register(list, CancellationToken::new());
        assert!(!session.subscription_closed(&list));
        assert_eq!(session.state(), ConnectionState::Connected);

        assert!(session.subscription_closed(&feed));
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.subscription_count(), 0);
    }

    #[test]
    fn test_feed_closed_releases_remaining_watches() {
        let mut session = Session::new();
        let token = session.begin_connect().unwrap();
        let feed = SubscriptionId::generate();
        session.complete_connect(feed, token);

        let watch = CancellationToken::new();
        session.register(SubscriptionId::generate(), watch.clone());
        let managed = CancellationToken::new();
        session.manage(managed.clone());
        assert_eq!(session.subscription_count(), 3);

        assert!(session.subscription_closed(&feed));
        assert!(watch.is_cancelled());
        assert!(managed.is_cancelled());
        assert_eq!(session.subscription_count(), 0);
    }

    #[test]
    fn test_release_disposes_one_entry() {
        let mut session = Session::new();
        let token = session.begin_connect().unwrap();
        session.complete_connect(SubscriptionId::generate(), token);

        let watch = CancellationToken::new();
        let id = SubscriptionId::generate();
        session.register(id, watch.clone());

        assert!(session.release(&id));
        assert!(watch.is_cancelled());
        assert!(!session.release(&id));
        assert_eq!(session.subscription_count(), 1);
        assert_eq!(session.state(), ConnectionState::Connected);
    }
}

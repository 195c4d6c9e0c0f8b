//! Chat stream engine
//!
//! A [`Chat`] owns one live feed on its messages path, the local log of
//! everything that feed delivered, and the event hub it publishes on.
//!
//! # Architecture
//!
//! ```text
//!              ┌─────────┐  adapter calls  ┌──────────────┐
//!  caller ────►│  Chat   │────────────────►│ Issuer task  │──► RemoteAdapter
//!              └─────────┘                 └──────────────┘        │
//!                   │ registry                                      │ streams
//!                   ▼                                               ▼
//!              ┌─────────┐   Inbound (mpsc)  ┌──────────────┐   pump tasks
//!              │ Session │◄──────────────────│ Notifier task│◄───────┘
//!              └─────────┘    gate + log     └──────────────┘
//!                                                  │
//!                                                  ▼
//!                                            Events (broadcast)
//! ```

use crate::config::ChatConfig;
use crate::core_chat::adapter::RemoteAdapter;
use crate::core_chat::errors::{AdapterResult, ChatError, ChatResult};
use crate::core_chat::issuer::Issuer;
use crate::core_chat::lifecycle::ConnectionState;
use crate::core_chat::notifier::{spawn_notifier, spawn_pump, ChatShared, Inbound};
use crate::core_chat::paths::ChatPaths;
use crate::core_chat::registry::{Disposable, SubscriptionId, TaskSubscription};
use crate::core_events::Events;
use crate::core_model::{
    DataProvider, DeliveryReceipt, DeliveryReceiptType, ListEvent, Message, Path, Sendable,
    SendableId, SendableType, Timestamp, User, UserId,
};
use crate::metrics::Timer;
use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// One conversation bound to a remote feed
///
/// Must be created inside a tokio runtime: construction spawns the chat's
/// issuer and notifier tasks. Dropping the chat disconnects it and stops both.
pub struct Chat {
    shared: Arc<ChatShared>,
    adapter: Arc<dyn RemoteAdapter>,
    paths: ChatPaths,
    local_user: UserId,
    config: ChatConfig,
    issuer: Issuer,
    inbound: mpsc::UnboundedSender<Inbound>,
    shutdown: CancellationToken,
}

impl Chat {
    pub fn new(
        adapter: Arc<dyn RemoteAdapter>,
        paths: ChatPaths,
        local_user: UserId,
        config: ChatConfig,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let shared = Arc::new(ChatShared::new(&config));
        let (issuer, _) = Issuer::spawn(shutdown.clone());
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        spawn_notifier(Arc::clone(&shared), inbound_rx);

        debug!(path = %paths.messages(), user = %local_user, "Chat created");

        Self {
            shared,
            adapter,
            paths,
            local_user,
            config,
            issuer,
            inbound,
            shutdown,
        }
    }

    pub fn paths(&self) -> &ChatPaths {
        &self.paths
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The event hub. Subscribe before `connect` to see replayed history.
    pub fn events(&self) -> &Events {
        &self.shared.events
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.session().state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Open the live feed
    ///
    /// Resolves the replay point (the local user's last sent sendable, when
    /// `start_from_last_receipt` is set), then opens the feed on the messages
    /// path. Fails with [`ChatError::AlreadyConnected`] unless disconnected,
    /// and with [`ChatError::ConnectCancelled`] if `disconnect` runs first.
    pub async fn connect(&self) -> ChatResult<()> {
        let token = self.shared.session().begin_connect()?;
        let path = self.paths.messages().clone();
        info!(path = %path, user = %self.local_user, "Connecting chat");

        let newer_than = if self.config.start_from_last_receipt {
            let resolved = tokio::select! {
                _ = token.cancelled() => return Err(ChatError::ConnectCancelled),
                resolved = self.date_of_last_sent_message() => resolved,
            };
            match resolved {
                Ok(date) => date,
                Err(error) => return Err(self.abort_connect(&token, error)),
            }
        } else {
            None
        };

        let adapter = Arc::clone(&self.adapter);
        let feed_path = path.clone();
        let limit = self.config.history_limit();
        let opened = tokio::select! {
            _ = token.cancelled() => return Err(ChatError::ConnectCancelled),
            opened = self.issuer.call(async move {
                adapter.messages_on(&feed_path, newer_than, limit)
            }) => opened,
        };
        let stream = match opened {
            Ok(stream) => stream,
            Err(error) => return Err(self.abort_connect(&token, error)),
        };

        let mut session = self.shared.session();
        if token.is_cancelled() {
            return Err(ChatError::ConnectCancelled);
        }
        let id = SubscriptionId::generate();
        let pump = spawn_pump(
            stream,
            token.clone(),
            id,
            path.clone(),
            self.inbound.clone(),
            |origin, sendable| Inbound::Sendable { origin, sendable },
        );
        session.complete_connect(id, TaskSubscription::new(token, pump));
        drop(session);

        counter!("chatstream.connections.opened").increment(1);
        info!(
            path = %path,
            newer_than = ?newer_than.map(|date| date.as_millis()),
            limit = ?limit,
            "Chat connected"
        );
        Ok(())
    }

    /// Resolving → Disconnected after a failure; publishes the failure unless
    /// the attempt was already cancelled
    fn abort_connect(&self, token: &CancellationToken, error: ChatError) -> ChatError {
        let mut session = self.shared.session();
        if token.is_cancelled() {
            return ChatError::ConnectCancelled;
        }
        session.fail_connect();
        warn!(path = %self.paths.messages(), error = %error, "Connect failed");
        self.shared.events.publish_error(error.clone());
        error
    }

    /// Tear down every subscription and return to Disconnected. Idempotent.
    ///
    /// Once this returns, no further events from the torn-down subscriptions
    /// are published.
    pub fn disconnect(&self) {
        let mut session = self.shared.session();
        let was = session.state();
        let released = session.teardown();
        drop(session);

        if was != ConnectionState::Disconnected || released > 0 {
            info!(path = %self.paths.messages(), released, "Chat disconnected");
        }
    }

    /// Every sendable the live feed delivered, in arrival order
    pub fn get_sendables(&self) -> Vec<Sendable> {
        self.shared.sendables()
    }

    /// Delivered sendables of one kind, in arrival order
    pub fn get_sendables_of(&self, kind: &SendableType) -> Vec<Sendable> {
        self.shared.sendables_of(kind)
    }

    #[cfg(test)]
    pub(crate) fn subscription_count(&self) -> usize {
        self.shared.session().subscription_count()
    }

    /// Register a caller resource to be released on `disconnect`
    pub fn manage(&self, resource: impl Disposable + 'static) -> SubscriptionId {
        self.shared.session().manage(resource)
    }

    /// Date of the newest sendable the local user sent on the messages path
    pub async fn date_of_last_sent_message(&self) -> ChatResult<Option<Timestamp>> {
        let adapter = Arc::clone(&self.adapter);
        let path = self.paths.messages().clone();
        self.issue("date_of_last_sent_message", async move {
            adapter.date_of_last_sent_message(&path).await
        })
        .await
    }

    /// One-shot history query on the messages path
    ///
    /// Results are returned to the caller only. They are not appended to the
    /// local log and not published.
    pub async fn load_more_messages(
        &self,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: Option<usize>,
    ) -> ChatResult<Vec<Sendable>> {
        let adapter = Arc::clone(&self.adapter);
        let path = self.paths.messages().clone();
        let page = self
            .issue("load_more_messages", async move {
                adapter.load_more_messages(&path, from, to, limit).await
            })
            .await?;
        debug!(count = page.len(), from = ?from, to = ?to, "Loaded history page");
        Ok(page)
    }

    pub async fn load_more_messages_from(
        &self,
        from: Timestamp,
        limit: usize,
    ) -> ChatResult<Vec<Sendable>> {
        self.load_more_messages(Some(from), None, Some(limit)).await
    }

    /// Newest `limit` sendables dated at or before `to`
    pub async fn load_more_messages_to(
        &self,
        to: Timestamp,
        limit: usize,
    ) -> ChatResult<Vec<Sendable>> {
        self.load_more_messages(None, Some(to), Some(limit)).await
    }

    pub async fn load_more_messages_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> ChatResult<Vec<Sendable>> {
        self.load_more_messages(Some(from), Some(to), None).await
    }

    /// Write `sendable` to `path`
    pub async fn send(&self, path: &Path, sendable: Sendable) -> ChatResult<()> {
        self.send_with_id(path, sendable, |_| {}).await
    }

    /// Write `sendable` to `path` and hand the store-assigned id to `on_id`
    pub async fn send_with_id<F>(&self, path: &Path, sendable: Sendable, on_id: F) -> ChatResult<()>
    where
        F: FnOnce(SendableId),
    {
        let adapter = Arc::clone(&self.adapter);
        let target = path.clone();
        let kind = sendable.kind().clone();
        let id = self
            .issue("send", async move { adapter.send(&target, sendable).await })
            .await?;

        counter!("chatstream.outbound.sent").increment(1);
        debug!(path = %path, id = %id, kind = %kind, "Sendable sent");
        on_id(id);
        Ok(())
    }

    pub async fn delete_sendable(&self, path: &Path) -> ChatResult<()> {
        let adapter = Arc::clone(&self.adapter);
        let target = path.clone();
        self.issue("delete_sendable", async move { adapter.delete_sendable(&target).await })
            .await
    }

    /// Add `users` to the list at `path`, writing `provider`'s projection of each
    pub async fn add_users(
        &self,
        path: &Path,
        provider: Arc<dyn DataProvider>,
        users: Vec<User>,
    ) -> ChatResult<()> {
        let adapter = Arc::clone(&self.adapter);
        let target = path.clone();
        self.issue("add_users", async move {
            adapter.add_users(&target, provider.as_ref(), &users).await
        })
        .await
    }

    pub async fn add_user(
        &self,
        path: &Path,
        provider: Arc<dyn DataProvider>,
        user: User,
    ) -> ChatResult<()> {
        self.add_users(path, provider, vec![user]).await
    }

    pub async fn update_users(
        &self,
        path: &Path,
        provider: Arc<dyn DataProvider>,
        users: Vec<User>,
    ) -> ChatResult<()> {
        let adapter = Arc::clone(&self.adapter);
        let target = path.clone();
        self.issue("update_users", async move {
            adapter.update_users(&target, provider.as_ref(), &users).await
        })
        .await
    }

    pub async fn update_user(
        &self,
        path: &Path,
        provider: Arc<dyn DataProvider>,
        user: User,
    ) -> ChatResult<()> {
        self.update_users(path, provider, vec![user]).await
    }

    pub async fn remove_users(&self, path: &Path, users: Vec<User>) -> ChatResult<()> {
        let adapter = Arc::clone(&self.adapter);
        let target = path.clone();
        self.issue("remove_users", async move { adapter.remove_users(&target, &users).await })
            .await
    }

    pub async fn remove_user(&self, path: &Path, user: User) -> ChatResult<()> {
        self.remove_users(path, vec![user]).await
    }

    /// Tell `message`'s sender it arrived
    pub async fn mark_received(&self, message: &Message) -> ChatResult<()> {
        self.send_receipt(message, DeliveryReceiptType::Received).await
    }

    /// Tell `message`'s sender it was read
    pub async fn mark_read(&self, message: &Message) -> ChatResult<()> {
        self.send_receipt(message, DeliveryReceiptType::Read).await
    }

    async fn send_receipt(
        &self,
        message: &Message,
        receipt_type: DeliveryReceiptType,
    ) -> ChatResult<()> {
        if !self.config.delivery_receipts_enabled || message.sender() == &self.local_user {
            trace!(id = %message.id(), "Skipping delivery receipt");
            return Ok(());
        }
        let receipt = DeliveryReceipt::create(self.local_user.clone(), receipt_type, message.id());
        self.send(&self.paths.receipt_path(message), receipt).await
    }

    /// Watch the participant list at `path`
    ///
    /// Requires a connection. The watch is torn down with the feed, whether
    /// by `disconnect` or because the adapter closed it, and released once
    /// the returned receiver is dropped. Stream errors go to the error
    /// channel.
    pub async fn list_change_on(
        &self,
        path: &Path,
    ) -> ChatResult<mpsc::UnboundedReceiver<ListEvent>> {
        if !self.is_connected() {
            return Err(ChatError::NotConnected);
        }

        let adapter = Arc::clone(&self.adapter);
        let target = path.clone();
        let stream = self
            .issuer
            .call(async move { adapter.list_change_on(&target) })
            .await?;

        let (sink, changes) = mpsc::unbounded_channel();
        let mut session = self.shared.session();
        if session.state() != ConnectionState::Connected {
            return Err(ChatError::NotConnected);
        }
        let token = CancellationToken::new();
        let id = SubscriptionId::generate();
        let pump = spawn_pump(
            stream,
            token.clone(),
            id,
            path.clone(),
            self.inbound.clone(),
            move |origin, event| Inbound::ListChange {
                origin,
                id,
                event,
                sink: sink.clone(),
            },
        );
        session.register(id, TaskSubscription::new(token, pump));
        debug!(path = %path, subscription = %id, "Watching participant list");
        Ok(changes)
    }

    async fn issue<T, F>(&self, op: &'static str, call: F) -> ChatResult<T>
    where
        F: Future<Output = AdapterResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let timer = Timer::new("chatstream.adapter.call.duration_ms");
        let result = self.issuer.call(call).await?;
        timer.stop();

        result.map_err(|error| {
            counter!("chatstream.adapter.errors").increment(1);
            debug!(op, error = %error, "Adapter call failed");
            ChatError::from(error)
        })
    }
}

impl Drop for Chat {
    fn drop(&mut self) {
        self.disconnect();
        self.shutdown.cancel();
    }
}

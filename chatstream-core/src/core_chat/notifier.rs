//! Notifier
//!
//! The one task per chat that writes the local log and publishes on the event
//! hub. Adapter streams are pumped into it over an unbounded channel, so
//! publication order equals arrival order for each feed.
//!
//! Every delivery happens under the session lock and is dropped if the
//! subscription it came from has been cancelled. `disconnect` takes the same
//! lock, so once it returns nothing from a torn-down subscription is
//! published.

use crate::config::ChatConfig;
use crate::core_chat::errors::{AdapterResult, ChatError};
use crate::core_chat::lifecycle::Session;
use crate::core_chat::registry::SubscriptionId;
use crate::core_events::Events;
use crate::core_model::{ListEvent, Path, Sendable, SendableType};
use futures::stream::{BoxStream, StreamExt};
use metrics::counter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Work item for the notifier
pub enum Inbound {
    Sendable {
        origin: CancellationToken,
        sendable: Sendable,
    },
    Failure {
        origin: CancellationToken,
        error: ChatError,
    },
    ListChange {
        origin: CancellationToken,
        id: SubscriptionId,
        event: ListEvent,
        sink: mpsc::UnboundedSender<ListEvent>,
    },
    /// The adapter ended a stream on its own
    Closed {
        origin: CancellationToken,
        id: SubscriptionId,
        path: Path,
    },
}

impl Inbound {
    fn origin(&self) -> &CancellationToken {
        match self {
            Inbound::Sendable { origin, .. }
            | Inbound::Failure { origin, .. }
            | Inbound::ListChange { origin, .. }
            | Inbound::Closed { origin, .. } => origin,
        }
    }
}

/// State shared between a chat, its notifier and its pumps
pub struct ChatShared {
    pub events: Events,
    log: RwLock<Vec<Sendable>>,
    session: Mutex<Session>,
    report_classification_gaps: bool,
}

impl ChatShared {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            events: Events::new(config.event_capacity),
            log: RwLock::new(Vec::new()),
            session: Mutex::new(Session::new()),
            report_classification_gaps: config.report_classification_gaps,
        }
    }

    /// Lock the session. A panic while holding the lock leaves the session
    /// consistent (every mutation is a single assignment), so poisoning is
    /// ignored.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the local log in arrival order
    pub fn sendables(&self) -> Vec<Sendable> {
        self.log.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Snapshot of the local log restricted to one kind, in arrival order
    pub fn sendables_of(&self, kind: &SendableType) -> Vec<Sendable> {
        self.log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|sendable| sendable.is_type(kind))
            .cloned()
            .collect()
    }

    fn deliver(&self, inbound: Inbound) {
        let mut session = self.session();
        if inbound.origin().is_cancelled() {
            trace!("Dropping delivery from cancelled subscription");
            return;
        }

        match inbound {
            Inbound::Sendable { sendable, .. } => self.dispatch(sendable),
            Inbound::Failure { error, .. } => {
                counter!("chatstream.adapter.errors").increment(1);
                warn!(error = %error, "Stream error");
                self.events.publish_error(error);
            }
            Inbound::ListChange { id, event, sink, .. } => {
                if sink.send(event).is_err() {
                    session.release(&id);
                    debug!(subscription = %id, "List watcher dropped, watch released");
                }
            }
            Inbound::Closed { id, path, .. } => {
                if session.subscription_closed(&id) {
                    info!(path = %path, "Feed closed by adapter, chat disconnected");
                } else {
                    debug!(path = %path, subscription = %id, "Stream closed by adapter");
                }
            }
        }
    }

    fn dispatch(&self, sendable: Sendable) {
        debug!(
            id = %sendable.id,
            kind = %sendable.kind(),
            date = %sendable.date,
            "Sendable received"
        );
        counter!("chatstream.sendables.received").increment(1);

        self.log.write().unwrap_or_else(PoisonError::into_inner).push(sendable.clone());

        if self.events.publish_sendable(&sendable).is_none() {
            counter!("chatstream.sendables.unclassified").increment(1);
            warn!(id = %sendable.id, kind = %sendable.kind(), "Unclassified sendable kind");
            if self.report_classification_gaps {
                self.events.publish_error(ChatError::ClassificationGap {
                    id: sendable.id.clone(),
                    kind: sendable.kind().clone(),
                });
            }
        }
    }
}

/// Spawn the notifier. It stops once every [`Inbound`] sender is gone.
pub fn spawn_notifier(
    shared: Arc<ChatShared>,
    mut inbound_rx: mpsc::UnboundedReceiver<Inbound>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(inbound) = inbound_rx.recv().await {
            shared.deliver(inbound);
        }
        debug!("Notifier stopped");
    })
}

/// Forward an adapter stream to the notifier until it ends or `origin` is
/// cancelled. `Err` items become error deliveries and do not stop the pump.
pub fn spawn_pump<T, F>(
    mut stream: BoxStream<'static, AdapterResult<T>>,
    origin: CancellationToken,
    id: SubscriptionId,
    path: Path,
    inbound: mpsc::UnboundedSender<Inbound>,
    wrap: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(CancellationToken, T) -> Inbound + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                biased;
                _ = origin.cancelled() => break,
                next = stream.next() => next,
            };

            let delivery = match next {
                Some(Ok(item)) => wrap(origin.clone(), item),
                Some(Err(error)) => Inbound::Failure {
                    origin: origin.clone(),
                    error: error.into(),
                },
                None => {
                    let _ = inbound.send(Inbound::Closed {
                        origin: origin.clone(),
                        id,
                        path: path.clone(),
                    });
                    break;
                }
            };

            if inbound.send(delivery).is_err() {
                break;
            }
        }
        trace!(path = %path, "Pump stopped");
    })
}

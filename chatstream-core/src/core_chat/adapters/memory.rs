//! In-memory RemoteAdapter
//!
//! A complete store held in process memory. Used by tests and the demo, and
//! as the reference for adapter semantics:
//! - every write gets a fresh id and a strictly increasing date
//! - live feeds replay stored history, then deliver new writes
//! - participant lists emit an `Added` per existing entry on watch
//!
//! Faults can be injected with [`InMemoryAdapter::fail_next`] (one-shot
//! calls) and [`InMemoryAdapter::fail_feeds`] (live feeds).

use crate::core_chat::adapter::{ListEventStream, RemoteAdapter, SendableStream};
use crate::core_chat::errors::{AdapterError, AdapterResult};
use crate::core_model::{
    Body, DataProvider, ListEvent, Path, Sendable, SendableId, Timestamp, User, UserId,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

type FeedSender = mpsc::UnboundedSender<AdapterResult<Sendable>>;
type ListSender = mpsc::UnboundedSender<AdapterResult<ListEvent>>;

#[derive(Default)]
struct Store {
    clock: Timestamp,
    feeds: HashMap<Path, Vec<Sendable>>,
    watchers: HashMap<Path, Vec<FeedSender>>,
    lists: HashMap<Path, BTreeMap<String, Body>>,
    list_watchers: HashMap<Path, Vec<ListSender>>,
    failures: VecDeque<AdapterError>,
}

impl Store {
    fn tick(&mut self) -> Timestamp {
        self.clock = self.clock.next().max(Timestamp::now());
        self.clock
    }

    fn append(&mut self, path: &Path, sendable: Sendable) -> Sendable {
        let stored = Sendable::from_record(
            SendableId::generate(),
            sendable.kind().clone(),
            sendable.from,
            self.tick(),
            sendable.body,
        );
        self.feeds.entry(path.clone()).or_default().push(stored.clone());

        if let Some(watchers) = self.watchers.get_mut(path) {
            watchers.retain(|watcher| watcher.send(Ok(stored.clone())).is_ok());
        }
        stored
    }

    fn notify_list(&mut self, path: &Path, event: ListEvent) {
        if let Some(watchers) = self.list_watchers.get_mut(path) {
            watchers.retain(|watcher| watcher.send(Ok(event.clone())).is_ok());
        }
    }

    fn take_failure(&mut self) -> AdapterResult<()> {
        match self.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Process-local store
///
/// Clones made with [`InMemoryAdapter::for_user`] share the same store, so
/// several users' chats can talk to each other in one process.
pub struct InMemoryAdapter {
    local_user: UserId,
    store: Arc<Mutex<Store>>,
}

impl InMemoryAdapter {
    /// Store seen from `local_user`'s session
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    /// Another user's session on the same store
    pub fn for_user(&self, local_user: UserId) -> Self {
        Self {
            local_user,
            store: Arc::clone(&self.store),
        }
    }

    /// Start the logical clock at `start`; later writes are dated after it
    pub fn with_start_time(self, start: Timestamp) -> Self {
        self.lock().clock = start;
        self
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write a sendable as another participant would. Returns it as stored.
    pub fn insert(&self, path: &Path, sendable: Sendable) -> Sendable {
        let stored = self.lock().append(path, sendable);
        trace!(path = %path, id = %stored.id, "Inserted sendable");
        stored
    }

    /// Everything stored at `path`, oldest first
    pub fn sendables(&self, path: &Path) -> Vec<Sendable> {
        self.lock().feeds.get(path).cloned().unwrap_or_default()
    }

    /// Current entries of the participant list at `path`
    pub fn list_entries(&self, path: &Path) -> BTreeMap<String, Body> {
        self.lock().lists.get(path).cloned().unwrap_or_default()
    }

    /// Fail the next one-shot call with `error`. Queued failures are consumed
    /// in order.
    pub fn fail_next(&self, error: AdapterError) {
        self.lock().failures.push_back(error);
    }

    /// Deliver `error` on every open feed and list watch, then end them
    pub fn fail_feeds(&self, error: AdapterError) {
        let mut store = self.lock();
        let mut ended = 0;
        for (_, watchers) in store.watchers.drain() {
            for watcher in watchers {
                let _ = watcher.send(Err(error.clone()));
                ended += 1;
            }
        }
        for (_, watchers) in store.list_watchers.drain() {
            for watcher in watchers {
                let _ = watcher.send(Err(error.clone()));
                ended += 1;
            }
        }
        debug!(ended, error = %error, "Failed all feeds");
    }

    /// Deliver `error` on the feeds at `path` without ending them
    pub fn push_feed_error(&self, path: &Path, error: AdapterError) {
        if let Some(watchers) = self.lock().watchers.get_mut(path) {
            watchers.retain(|watcher| watcher.send(Err(error.clone())).is_ok());
        }
    }

    /// End the feeds at `path` without an error, as a store does when it
    /// drops a listener. List watches stay open.
    pub fn end_feeds(&self, path: &Path) {
        let ended = self.lock().watchers.remove(path).map_or(0, |watchers| watchers.len());
        debug!(path = %path, ended, "Ended feeds");
    }

    /// Live feeds on `path` whose consumer is still attached
    pub fn feed_watcher_count(&self, path: &Path) -> usize {
        self.lock()
            .watchers
            .get(path)
            .map(|watchers| watchers.iter().filter(|watcher| !watcher.is_closed()).count())
            .unwrap_or(0)
    }

    /// List watches on `path` whose consumer is still attached
    pub fn list_watcher_count(&self, path: &Path) -> usize {
        self.lock()
            .list_watchers
            .get(path)
            .map(|watchers| watchers.iter().filter(|watcher| !watcher.is_closed()).count())
            .unwrap_or(0)
    }

    fn write_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
        event: fn(String, Body) -> ListEvent,
    ) -> AdapterResult<()> {
        let mut store = self.lock();
        store.take_failure()?;
        for user in users {
            let data = provider.data(user);
            store
                .lists
                .entry(path.clone())
                .or_default()
                .insert(user.id.to_string(), data.clone());
            store.notify_list(path, event(user.id.to_string(), data));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteAdapter for InMemoryAdapter {
    fn messages_on(
        &self,
        path: &Path,
        newer_than: Option<Timestamp>,
        limit: Option<usize>,
    ) -> SendableStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut store = self.lock();

        let history: Vec<&Sendable> = store
            .feeds
            .get(path)
            .map(|feed| {
                feed.iter()
                    .filter(|sendable| newer_than.map_or(true, |bound| sendable.date > bound))
                    .collect()
            })
            .unwrap_or_default();
        let skip = limit.map_or(0, |limit| history.len().saturating_sub(limit));
        for sendable in history.into_iter().skip(skip) {
            let _ = tx.send(Ok(sendable.clone()));
        }

        store.watchers.entry(path.clone()).or_default().push(tx);
        debug!(path = %path, newer_than = ?newer_than, limit = ?limit, "Feed opened");
        UnboundedReceiverStream::new(rx).boxed()
    }

    async fn load_more_messages(
        &self,
        path: &Path,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: Option<usize>,
    ) -> AdapterResult<Vec<Sendable>> {
        let mut store = self.lock();
        store.take_failure()?;

        let matching: Vec<Sendable> = store
            .feeds
            .get(path)
            .map(|feed| {
                feed.iter()
                    .filter(|sendable| from.map_or(true, |from| sendable.date >= from))
                    .filter(|sendable| to.map_or(true, |to| sendable.date <= to))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let page = match (limit, from) {
            (None, _) => matching,
            (Some(limit), Some(_)) => matching.into_iter().take(limit).collect(),
            (Some(limit), None) => {
                let skip = matching.len().saturating_sub(limit);
                matching.into_iter().skip(skip).collect()
            }
        };
        Ok(page)
    }

    async fn date_of_last_sent_message(&self, path: &Path) -> AdapterResult<Option<Timestamp>> {
        let mut store = self.lock();
        store.take_failure()?;

        Ok(store.feeds.get(path).and_then(|feed| {
            feed.iter()
                .rev()
                .find(|sendable| sendable.from == self.local_user)
                .map(|sendable| sendable.date)
        }))
    }

    fn list_change_on(&self, path: &Path) -> ListEventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut store = self.lock();

        if let Some(entries) = store.lists.get(path) {
            for (id, data) in entries {
                let _ = tx.send(Ok(ListEvent::added(id.clone(), data.clone())));
            }
        }

        store.list_watchers.entry(path.clone()).or_default().push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    async fn send(&self, path: &Path, sendable: Sendable) -> AdapterResult<SendableId> {
        let mut store = self.lock();
        store.take_failure()?;
        let stored = store.append(path, sendable);
        trace!(path = %path, id = %stored.id, "Stored sendable");
        Ok(stored.id)
    }

    async fn delete_sendable(&self, path: &Path) -> AdapterResult<()> {
        let mut store = self.lock();
        store.take_failure()?;

        let (feed_path, id) = match (path.parent(), path.last()) {
            (Some(parent), Some(id)) => (parent, id.to_string()),
            _ => return Err(AdapterError::NotFound(path.to_string())),
        };
        let feed = store
            .feeds
            .get_mut(&feed_path)
            .ok_or_else(|| AdapterError::NotFound(path.to_string()))?;
        let before = feed.len();
        feed.retain(|sendable| sendable.id.as_str() != id);
        if feed.len() == before {
            return Err(AdapterError::NotFound(path.to_string()));
        }
        Ok(())
    }

    async fn add_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
    ) -> AdapterResult<()> {
        self.write_users(path, provider, users, |id, data| ListEvent::added(id, data))
    }

    async fn update_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
    ) -> AdapterResult<()> {
        self.write_users(path, provider, users, |id, data| ListEvent::modified(id, data))
    }

    async fn remove_users(&self, path: &Path, users: &[User]) -> AdapterResult<()> {
        let mut store = self.lock();
        store.take_failure()?;
        for user in users {
            let id = user.id.to_string();
            let removed = store.lists.get_mut(path).and_then(|list| list.remove(&id));
            if let Some(data) = removed {
                store.notify_list(path, ListEvent::removed(id, data));
            }
        }
        Ok(())
    }
}

/*
    Tests for the chat stream engine

    Test suite covering:
    - Classification and dispatch to typed channels
    - Connection lifecycle (double connect, cancellation, failures)
    - Paginated history
    - Outbound operations, receipts and participant lists
*/

mod dispatch_tests;

use crate::core_chat::adapter::{ListEventStream, RemoteAdapter, SendableStream};
use crate::core_chat::errors::{AdapterError, AdapterResult};
use crate::core_chat::InMemoryAdapter;
use crate::core_model::{DataProvider, Path, Sendable, SendableId, Timestamp, User, UserId};
use async_trait::async_trait;
use tokio::sync::Semaphore;

/// In-memory store whose replay-point query blocks until released
pub(crate) struct GatedAdapter {
    pub inner: InMemoryAdapter,
    pub gate: Semaphore,
}

impl GatedAdapter {
    pub fn new(local_user: &str) -> Self {
        Self {
            inner: InMemoryAdapter::new(UserId::new(local_user)),
            gate: Semaphore::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl RemoteAdapter for GatedAdapter {
    fn messages_on(
        &self,
        path: &Path,
        newer_than: Option<Timestamp>,
        limit: Option<usize>,
    ) -> SendableStream {
        self.inner.messages_on(path, newer_than, limit)
    }

    async fn load_more_messages(
        &self,
        path: &Path,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: Option<usize>,
    ) -> AdapterResult<Vec<Sendable>> {
        self.inner.load_more_messages(path, from, to, limit).await
    }

    async fn date_of_last_sent_message(&self, path: &Path) -> AdapterResult<Option<Timestamp>> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| AdapterError::Other(e.to_string()))?;
        self.inner.date_of_last_sent_message(path).await
    }

    fn list_change_on(&self, path: &Path) -> ListEventStream {
        self.inner.list_change_on(path)
    }

    async fn send(&self, path: &Path, sendable: Sendable) -> AdapterResult<SendableId> {
        self.inner.send(path, sendable).await
    }

    async fn delete_sendable(&self, path: &Path) -> AdapterResult<()> {
        self.inner.delete_sendable(path).await
    }

    async fn add_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
    ) -> AdapterResult<()> {
        self.inner.add_users(path, provider, users).await
    }

    async fn update_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
    ) -> AdapterResult<()> {
        self.inner.update_users(path, provider, users).await
    }

    async fn remove_users(&self, path: &Path, users: &[User]) -> AdapterResult<()> {
        self.inner.remove_users(path, users).await
    }
}

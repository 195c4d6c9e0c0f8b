//! RemoteAdapter Trait - Abstraction over the remote data store
//!
//! The chat engine never talks to a store directly. Everything it needs is
//! behind this trait, which enables:
//! - Swapping the backing store without touching the engine
//! - Testability via the in-memory implementation
//!
//! # Architecture
//!
//! ```text
//! Chat
//!   |
//!   v
//! RemoteAdapter (trait)
//!   |
//!   +---> InMemoryAdapter (tests, demo)
//!   |
//!   +---> a hosted document store adapter (out of tree)
//! ```
//!
//! Decoding records into [`Sendable`]s is the adapter's job. A decode failure
//! on a live feed is reported as an `Err` item; it does not end the stream.

use crate::core_chat::errors::AdapterResult;
use crate::core_model::{DataProvider, ListEvent, Path, Sendable, SendableId, Timestamp, User};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Live feed of sendables. Ends only if the adapter gives up on the feed.
pub type SendableStream = BoxStream<'static, AdapterResult<Sendable>>;

/// Live feed of participant-list changes
pub type ListEventStream = BoxStream<'static, AdapterResult<ListEvent>>;

/// Operations the chat engine needs from the remote store
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    /// Open a live feed on `path`
    ///
    /// # Arguments
    ///
    /// * `newer_than` - Only sendables dated strictly after this
    /// * `limit` - Replay at most this many of the newest stored sendables
    ///   before switching to live delivery
    fn messages_on(
        &self,
        path: &Path,
        newer_than: Option<Timestamp>,
        limit: Option<usize>,
    ) -> SendableStream;

    /// One-shot history query, ascending by date
    ///
    /// All bounds are optional and inclusive. With no bounds the adapter's
    /// defaults apply.
    async fn load_more_messages(
        &self,
        path: &Path,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: Option<usize>,
    ) -> AdapterResult<Vec<Sendable>>;

    /// Date of the newest sendable in `path` sent by the local user
    async fn date_of_last_sent_message(&self, path: &Path) -> AdapterResult<Option<Timestamp>>;

    /// Open a live feed of changes to a participant list
    fn list_change_on(&self, path: &Path) -> ListEventStream;

    /// Write a sendable and return the identifier the store assigned
    async fn send(&self, path: &Path, sendable: Sendable) -> AdapterResult<SendableId>;

    /// Delete the record at `path`
    async fn delete_sendable(&self, path: &Path) -> AdapterResult<()>;

    /// Add users to a participant list, writing `provider.data(user)` for each
    async fn add_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
    ) -> AdapterResult<()>;

    /// Overwrite users' entries in a participant list
    async fn update_users(
        &self,
        path: &Path,
        provider: &dyn DataProvider,
        users: &[User],
    ) -> AdapterResult<()>;

    /// Remove users from a participant list
    async fn remove_users(&self, path: &Path, users: &[User]) -> AdapterResult<()>;
}

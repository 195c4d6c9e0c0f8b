//! Subscription registry
//!
//! Holds every live resource opened on behalf of a chat so they can all be
//! released in one call on disconnect.

use std::collections::HashMap;
use std::fmt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A resource that can be released. Releasing twice is a no-op.
pub trait Disposable: Send {
    fn dispose(&self);
}

impl Disposable for CancellationToken {
    fn dispose(&self) {
        self.cancel();
    }
}

impl<T: Send> Disposable for JoinHandle<T> {
    fn dispose(&self) {
        self.abort();
    }
}

/// A pump task paired with the token that stops it
pub struct TaskSubscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl TaskSubscription {
    pub fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { token, task }
    }
}

impl Disposable for TaskSubscription {
    fn dispose(&self) {
        self.token.cancel();
        self.task.abort();
    }
}

/// Opaque registry handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn generate() -> Self {
        SubscriptionId(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map of live subscriptions
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: HashMap<SubscriptionId, Box<dyn Disposable>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under a fresh handle
    pub fn add(&mut self, resource: impl Disposable + 'static) -> SubscriptionId {
        let id = SubscriptionId::generate();
        self.insert(id, resource);
        id
    }

    /// Register under a handle chosen by the caller. An existing entry with
    /// the same handle is disposed first.
    pub fn insert(&mut self, id: SubscriptionId, resource: impl Disposable + 'static) {
        if let Some(previous) = self.entries.insert(id, Box::new(resource)) {
            previous.dispose();
        }
    }

    /// Dispose and forget one entry. Returns whether it was present.
    pub fn remove(&mut self, id: &SubscriptionId) -> bool {
        match self.entries.remove(id) {
            Some(resource) => {
                resource.dispose();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: &SubscriptionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Dispose every entry and clear the registry. Returns how many were released.
    pub fn dispose_all(&mut self) -> usize {
        let released = self.entries.len();
        for (_, resource) in self.entries.drain() {
            resource.dispose();
        }
        released
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

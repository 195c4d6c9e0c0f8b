//! Chat stream engine
//!
//! Connects a chat to its remote feed, keeps the local log, classifies and
//! publishes every arriving sendable, and issues one-shot history and
//! outbound calls against the same store.

pub mod adapter;
pub mod adapters;
pub mod chat;
pub mod errors;
pub mod issuer;
pub mod lifecycle;
pub mod notifier;
pub mod paths;
pub mod registry;

#[cfg(test)]
mod tests;

// Re-exports
pub use adapter::{ListEventStream, RemoteAdapter, SendableStream};
pub use adapters::InMemoryAdapter;
pub use chat::Chat;
pub use errors::{AdapterError, AdapterResult, ChatError, ChatResult};
pub use lifecycle::ConnectionState;
pub use paths::ChatPaths;
pub use registry::{Disposable, SubscriptionId, TaskSubscription};

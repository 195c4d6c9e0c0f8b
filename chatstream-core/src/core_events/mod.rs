//! Event hub
//!
//! Decouples the chat engine (producer) from UI and business logic
//! (consumers).

pub mod broadcaster;
pub mod event;

pub use broadcaster::Events;
pub use event::ChatEvent;

//! Sendable model
//!
//! Envelope, typed projections, store locators and participants shared by the
//! event hub, the chat engine and remote adapters.

pub mod path;
pub mod projections;
pub mod sendable;
pub mod types;
pub mod user;

pub use path::{Path, PathScheme};
pub use projections::{
    DeliveryReceipt, DeliveryReceiptType, Invitation, InvitationType, Message, Presence,
    PresenceType, TypedSendable, TypingState, TypingStateType,
};
pub use sendable::{body, Body, Sendable, SendableType};
pub use types::{ChatId, SendableId, Timestamp, UserId};
pub use user::{
    DataProvider, FullProfile, IdOnly, ListEvent, ListEventKind, RoleOnly, RoleType, User,
};

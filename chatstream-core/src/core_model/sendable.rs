//! The sendable envelope
//!
//! Every record on a chat feed is a [`Sendable`]: an identifier, a kind, the
//! sender, a store-assigned date and a free-form JSON body. Typed views over
//! a sendable live in [`super::projections`].

use super::types::{SendableId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON object carried by a sendable or written to a participant list
pub type Body = serde_json::Map<String, Value>;

/// Discriminates the kind of payload a sendable carries
///
/// Kinds this SDK does not know about decode to [`SendableType::Unknown`]
/// instead of failing, so a newer peer can never break an older feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SendableType {
    Message,
    DeliveryReceipt,
    TypingState,
    Invitation,
    Presence,
    Unknown(String),
}

impl SendableType {
    /// Every kind with a typed channel
    pub const KNOWN: [SendableType; 5] = [
        SendableType::Message,
        SendableType::DeliveryReceipt,
        SendableType::TypingState,
        SendableType::Invitation,
        SendableType::Presence,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            SendableType::Message => "message",
            SendableType::DeliveryReceipt => "receipt",
            SendableType::TypingState => "typing",
            SendableType::Invitation => "invitation",
            SendableType::Presence => "presence",
            SendableType::Unknown(other) => other,
        }
    }

    /// Parse a wire string. Never fails.
    pub fn parse(s: &str) -> Self {
        match s {
            "message" => SendableType::Message,
            "receipt" => SendableType::DeliveryReceipt,
            "typing" => SendableType::TypingState,
            "invitation" => SendableType::Invitation,
            "presence" => SendableType::Presence,
            other => SendableType::Unknown(other.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SendableType::Unknown(_))
    }
}

impl From<String> for SendableType {
    fn from(s: String) -> Self {
        SendableType::parse(&s)
    }
}

impl From<SendableType> for String {
    fn from(kind: SendableType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SendableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tagged, timestamped unit of communication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sendable {
    /// Identifier, unique within its feed
    pub id: SendableId,

    #[serde(rename = "type")]
    kind: SendableType,

    /// Sender
    pub from: UserId,

    /// Assigned by the remote store on write
    pub date: Timestamp,

    /// Kind-specific payload
    #[serde(default)]
    pub body: Body,
}

impl Sendable {
    /// Prepare an outbound sendable. The store replaces the id and date on write.
    pub fn new(kind: SendableType, from: UserId, body: Body) -> Self {
        Self {
            id: SendableId::generate(),
            kind,
            from,
            date: Timestamp::now(),
            body,
        }
    }

    /// Build a sendable from a decoded store record
    pub fn from_record(
        id: SendableId,
        kind: SendableType,
        from: UserId,
        date: Timestamp,
        body: Body,
    ) -> Self {
        Self { id, kind, from, date, body }
    }

    /// The kind of this sendable. Fixed at construction.
    pub fn kind(&self) -> &SendableType {
        &self.kind
    }

    pub fn is_type(&self, kind: &SendableType) -> bool {
        &self.kind == kind
    }

    /// String value of a body field, if present and a string
    pub fn body_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }
}

/// Build a [`Body`] from `(key, value)` pairs
pub fn body<K, V, I>(pairs: I) -> Body
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

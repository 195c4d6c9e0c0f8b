//! Participants and participant-list changes

use super::sendable::Body;
use super::types::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a participant in a group chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Owner,
    Admin,
    Member,
    Watcher,
    Banned,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Owner => "owner",
            RoleType::Admin => "admin",
            RoleType::Member => "member",
            RoleType::Watcher => "watcher",
            RoleType::Banned => "banned",
        }
    }
}

/// A chat participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub role: Option<RoleType>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self { id, name: None, role: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: RoleType) -> Self {
        self.role = Some(role);
        self
    }
}

/// Extracts the data written for a user at a participant-list path
///
/// The same add/update call can write a full profile to one list and only a
/// role or a bare entry to another by swapping the provider.
pub trait DataProvider: Send + Sync {
    fn data(&self, user: &User) -> Body;
}

impl<F> DataProvider for F
where
    F: Fn(&User) -> Body + Send + Sync,
{
    fn data(&self, user: &User) -> Body {
        self(user)
    }
}

/// Writes an empty entry keyed by the user id
#[derive(Debug, Clone, Copy, Default)]
pub struct IdOnly;

impl DataProvider for IdOnly {
    fn data(&self, _user: &User) -> Body {
        Body::new()
    }
}

/// Writes `{"role": ...}`
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleOnly;

impl DataProvider for RoleOnly {
    fn data(&self, user: &User) -> Body {
        let mut data = Body::new();
        if let Some(role) = user.role {
            data.insert("role".to_string(), Value::from(role.as_str()));
        }
        data
    }
}

/// Writes every known profile field
#[derive(Debug, Clone, Copy, Default)]
pub struct FullProfile;

impl DataProvider for FullProfile {
    fn data(&self, user: &User) -> Body {
        let mut data = RoleOnly.data(user);
        if let Some(name) = &user.name {
            data.insert("name".to_string(), Value::from(name.as_str()));
        }
        data
    }
}

/// What happened to a list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListEventKind {
    Added,
    Removed,
    Modified,
}

/// A change to a participant list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEvent {
    pub kind: ListEventKind,
    pub id: String,
    pub data: Body,
}

impl ListEvent {
    pub fn added(id: impl Into<String>, data: Body) -> Self {
        Self { kind: ListEventKind::Added, id: id.into(), data }
    }

    pub fn removed(id: impl Into<String>, data: Body) -> Self {
        Self { kind: ListEventKind::Removed, id: id.into(), data }
    }

    pub fn modified(id: impl Into<String>, data: Body) -> Self {
        Self { kind: ListEventKind::Modified, id: id.into(), data }
    }
}

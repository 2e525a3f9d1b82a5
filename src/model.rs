//! Closed vocabularies: roles, resources, actions and the permission pair
//!
//! Text forms are lowercase snake_case. `FromStr` is the only way untyped
//! input gets in, so anything outside these enums is rejected before a
//! check can run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    ContentManager,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::ContentManager, Role::User];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ContentManager => "content_manager",
            Role::User => "user",
        }
    }

    /// Display rank. Never consulted by the access check.
    pub fn rank(self) -> u8 {
        match self {
            Role::User => 0,
            Role::ContentManager => 1,
            Role::Admin => 2,
        }
    }

    /// All roles, lowest rank first
    pub fn by_rank() -> [Role; 3] {
        let mut roles = Self::ALL;
        roles.sort_by_key(|r| r.rank());
        roles
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| GateError::UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Users,
    Content,
    Certificates,
    Analytics,
    Profile,
    Progress,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Users,
        Resource::Content,
        Resource::Certificates,
        Resource::Analytics,
        Resource::Profile,
        Resource::Progress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Content => "content",
            Resource::Certificates => "certificates",
            Resource::Analytics => "analytics",
            Resource::Profile => "profile",
            Resource::Progress => "progress",
        }
    }

    pub(crate) const fn index(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| GateError::UnknownResource(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Publish,
    Issue,
    Revoke,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Publish,
        Action::Issue,
        Action::Revoke,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Publish => "publish",
            Action::Issue => "issue",
            Action::Revoke => "revoke",
        }
    }

    pub(crate) const fn index(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| GateError::UnknownAction(s.to_string()))
    }
}

/// A granted (resource, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Bit position inside a PermissionSet
    pub(crate) const fn bit(self) -> u64 {
        1 << (self.resource.index() * Action::ALL.len() as u32 + self.action.index())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for Permission {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| GateError::MalformedPermission(s.to_string()))?;
        Ok(Permission::new(resource.parse()?, action.parse()?))
    }
}

//! Session context: the caller side of the access check
//!
//! Decisions need a `ConfirmedRole`, and the only way to get one from a
//! session is a hydrated profile. Every other state answers `false`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::check::is_allowed;
use crate::error::Result;
use crate::model::{Action, Resource, Role};

/// A user's profile record as held by the role source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl Profile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), display_name: display_name.into(), role }
    }
}

/// Anything that can answer "what is this user's profile right now"
pub trait ProfileSource {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>>;
}

/// A role read from a loaded profile. Only a hydrated session hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedRole(Role);

impl ConfirmedRole {
    pub(crate) fn from_profile(profile: &Profile) -> Self {
        ConfirmedRole(profile.role)
    }

    pub fn role(self) -> Role {
        self.0
    }

    #[inline]
    pub fn has_permission(self, resource: Resource, action: Action) -> bool {
        is_allowed(self.0, resource, action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Session restoration has not finished; nothing is known yet
    Restoring,
    SignedOut,
    /// Signed in. `profile` is None until hydration completes
    Authenticated { user_id: String, profile: Option<Profile> },
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    state: SessionState,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self { state: SessionState::Restoring }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// End restoration with whatever the identity provider reported
    pub fn finish_restore(&mut self, user_id: Option<&str>) {
        match user_id {
            Some(id) => self.sign_in(id),
            None => self.sign_out(),
        }
    }

    /// Mark a user as authenticated. Their profile still has to load.
    pub fn sign_in(&mut self, user_id: &str) {
        self.state = SessionState::Authenticated { user_id: user_id.to_string(), profile: None };
    }

    pub fn sign_out(&mut self) {
        self.state = SessionState::SignedOut;
    }

    /// Load the current user's profile from `source`.
    ///
    /// The previous profile is dropped first, so a failed or empty load
    /// leaves the session unhydrated rather than holding a stale role.
    pub fn hydrate<S: ProfileSource + ?Sized>(&mut self, source: &S) -> Result<Option<ConfirmedRole>> {
        let SessionState::Authenticated { user_id, profile } = &mut self.state else {
            return Ok(None);
        };
        *profile = None;
        let loaded = source.load_profile(user_id)?;
        match &loaded {
            Some(p) => debug!(user = %user_id, role = %p.role, "profile hydrated"),
            None => debug!(user = %user_id, "no profile found, session stays unhydrated"),
        }
        *profile = loaded;
        Ok(self.confirmed_role())
    }

    /// Re-read the profile, e.g. after an administrative role change
    pub fn reload_profile<S: ProfileSource + ?Sized>(&mut self, source: &S) -> Result<Option<ConfirmedRole>> {
        self.hydrate(source)
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match &self.state {
            SessionState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            SessionState::Restoring | SessionState::Authenticated { profile: None, .. }
        )
    }

    pub fn confirmed_role(&self) -> Option<ConfirmedRole> {
        self.profile().map(ConfirmedRole::from_profile)
    }

    /// Default-deny check against the role held right now
    pub fn has_permission(&self, resource: Resource, action: Action) -> bool {
        match self.confirmed_role() {
            Some(role) => role.has_permission(resource, action),
            None => {
                debug!(%resource, %action, state = ?self.state, "denied: role not confirmed");
                false
            }
        }
    }
}

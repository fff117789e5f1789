//! Session state types

use mockorbit_core::{Identity, Role};
use serde::{Deserialize, Serialize};

/// Coarse lifecycle of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Controller constructed, persisted record not read yet
    Uninitialized,
    /// Reading the persisted record
    Resolving,
    Unauthenticated,
    Authenticated,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Resolving => write!(f, "resolving"),
            LifecycleState::Unauthenticated => write!(f, "unauthenticated"),
            LifecycleState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Live authorization context. Identity, credential and active role only exist together.
#[derive(Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub(crate) identity: Identity,
    pub(crate) credential: String,
    pub(crate) active_role: Role,
}

impl ActiveSession {
    /// Build from a normalized identity, falling back to the primary role when the
    /// preferred role is not granted.
    pub(crate) fn new(identity: Identity, credential: String, preferred: Option<Role>) -> Self {
        let active_role = preferred
            .filter(|role| identity.has_role(*role))
            .unwrap_or(identity.primary_role);

        Self {
            identity,
            credential,
            active_role,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn active_role(&self) -> Role {
        self.active_role
    }
}

// Credentials stay out of logs and panic messages.
impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("identity", &self.identity)
            .field("credential", &"<redacted>")
            .field("active_role", &self.active_role)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionState {
    Uninitialized,
    Resolving,
    Unauthenticated,
    Authenticated(ActiveSession),
}

impl SessionState {
    pub(crate) fn lifecycle(&self) -> LifecycleState {
        match self {
            SessionState::Uninitialized => LifecycleState::Uninitialized,
            SessionState::Resolving => LifecycleState::Resolving,
            SessionState::Unauthenticated => LifecycleState::Unauthenticated,
            SessionState::Authenticated(_) => LifecycleState::Authenticated,
        }
    }

    pub(crate) fn active(&self) -> Option<&ActiveSession> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

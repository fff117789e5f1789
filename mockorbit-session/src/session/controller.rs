//! Session Controller - authenticated identity, credential and active role
//!
//! One controller is constructed at application start and handed to whatever needs it.
//! Every operation runs to completion synchronously, and no operation fails on input it
//! can default around: corrupt persisted state is cleared, ineligible calls are no-ops.

use super::storage::{PersistentStore, StoreKeys};
use super::types::{ActiveSession, LifecycleState, SessionState};
use mockorbit_core::{Identity, Role};
use tracing::{debug, info, warn};

pub struct SessionController<S: PersistentStore> {
    store: S,
    keys: StoreKeys,
    state: SessionState,
}

impl<S: PersistentStore> SessionController<S> {
    /// Create a controller over `store` using the default key names
    pub fn new(store: S) -> Self {
        Self::with_keys(store, StoreKeys::default())
    }

    pub fn with_keys(store: S, keys: StoreKeys) -> Self {
        Self {
            store,
            keys,
            state: SessionState::Uninitialized,
        }
    }

    /// Restore the session from the persisted record. Runs once; later calls are ignored.
    pub fn initialize(&mut self) -> LifecycleState {
        if self.state != SessionState::Uninitialized {
            warn!(
                state = %self.lifecycle_state(),
                "Session controller already initialized, ignoring"
            );
            return self.lifecycle_state();
        }

        self.state = SessionState::Resolving;

        match self.restore() {
            Some(session) => {
                info!(
                    user_id = %session.identity.id,
                    active_role = %session.active_role,
                    "Restored persisted session"
                );
                self.persist(&session);
                self.state = SessionState::Authenticated(session);
            }
            None => {
                self.clear_persisted();
                self.state = SessionState::Unauthenticated;
                debug!("No usable persisted session, starting unauthenticated");
            }
        }

        self.lifecycle_state()
    }

    /// Adopt the result of a successful credential exchange.
    ///
    /// A role persisted by an earlier session stays active if the new identity holds it.
    pub fn login(&mut self, credential: impl Into<String>, identity: Identity) {
        let identity = identity.normalized();
        let previous_role = self.persisted_role();
        let session = ActiveSession::new(identity, credential.into(), previous_role);

        self.persist(&session);
        info!(
            user_id = %session.identity.id,
            active_role = %session.active_role,
            granted_roles = session.identity.granted_roles.len(),
            "Logged in"
        );
        self.state = SessionState::Authenticated(session);
    }

    /// Forget the session, in memory and on disk. Safe to call repeatedly.
    pub fn logout(&mut self) {
        self.clear_persisted();
        if let Some(session) = self.state.active() {
            info!(user_id = %session.identity.id, "Logged out");
        }
        self.state = SessionState::Unauthenticated;
    }

    /// Toggle to the other role if the identity holds it.
    ///
    /// Returns the newly active role, or `None` when nothing changed.
    pub fn switch_role(&mut self) -> Option<Role> {
        let SessionState::Authenticated(session) = &mut self.state else {
            debug!("Role switch ignored: not authenticated");
            return None;
        };

        if !session.identity.can_switch_role() {
            debug!(user_id = %session.identity.id, "Role switch ignored: single role");
            return None;
        }

        let next = session.active_role.other();
        if !session.identity.has_role(next) {
            return None;
        }

        session.active_role = next;
        if let Err(e) = self.store.set(&self.keys.active_role, next.as_str()) {
            e.log();
        }

        info!(user_id = %session.identity.id, active_role = %next, "Switched active role");
        Some(next)
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state.lifecycle()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.active().is_some()
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.state.active()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.state.active().map(|s| &s.identity)
    }

    pub fn credential(&self) -> Option<&str> {
        self.state.active().map(|s| s.credential.as_str())
    }

    pub fn active_role(&self) -> Option<Role> {
        self.state.active().map(|s| s.active_role)
    }

    pub fn granted_roles(&self) -> &[Role] {
        self.state
            .active()
            .map(|s| s.identity.granted_roles.as_slice())
            .unwrap_or(&[])
    }

    pub fn can_switch_role(&self) -> bool {
        self.state
            .active()
            .is_some_and(|s| s.identity.can_switch_role())
    }

    /// `Authorization` header value for outgoing requests
    pub fn authorization_header(&self) -> Option<String> {
        self.credential().map(|token| format!("Bearer {}", token))
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hand the store back, e.g. to a freshly constructed controller after a restart
    pub fn into_store(self) -> S {
        self.store
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                e.log();
                None
            }
        }
    }

    fn persisted_role(&self) -> Option<Role> {
        self.read_key(&self.keys.active_role)
            .and_then(|raw| raw.parse().ok())
    }

    fn restore(&self) -> Option<ActiveSession> {
        let token = self.read_key(&self.keys.token);
        let raw_identity = self.read_key(&self.keys.identity);

        let (Some(token), Some(raw_identity)) = (token, raw_identity) else {
            return None;
        };

        let identity: Identity = match serde_json::from_str(&raw_identity) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Persisted identity is unreadable, clearing session");
                return None;
            }
        };

        Some(ActiveSession::new(
            identity.normalized(),
            token,
            self.persisted_role(),
        ))
    }

    /// Write the whole record as one batch
    fn persist(&mut self, session: &ActiveSession) {
        let identity = match serde_json::to_string(&session.identity) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize identity, session not persisted");
                return;
            }
        };

        let entries = [
            (self.keys.token.as_str(), session.credential.as_str()),
            (self.keys.identity.as_str(), identity.as_str()),
            (self.keys.active_role.as_str(), session.active_role.as_str()),
        ];
        if let Err(e) = self.store.set_all(&entries) {
            e.log();
        }
    }

    fn clear_persisted(&mut self) {
        if let Err(e) = self.store.remove_all(&self.keys.all()) {
            e.log();
        }
    }
}

impl<S: PersistentStore> std::fmt::Debug for SessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("keys", &self.keys)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemoryStore;

    fn dual_role_identity() -> Identity {
        Identity::new("u2", "Both", "b@x.com", Role::Interviewee)
            .with_granted_roles([Role::Interviewer, Role::Interviewee])
    }

    fn ready(store: MemoryStore) -> SessionController<MemoryStore> {
        let mut controller = SessionController::new(store);
        controller.initialize();
        controller
    }

    fn assert_invariants(controller: &SessionController<MemoryStore>) {
        let identity = controller.identity();
        assert_eq!(identity.is_some(), controller.credential().is_some());
        assert_eq!(identity.is_some(), controller.active_role().is_some());
        assert_eq!(
            identity.is_some(),
            controller.lifecycle_state() == LifecycleState::Authenticated
        );
        if let (Some(identity), Some(role)) = (identity, controller.active_role()) {
            assert!(identity.granted_roles.contains(&role));
        }
    }

    #[test]
    fn test_new_controller_is_uninitialized() {
        let controller = SessionController::new(MemoryStore::new());
        assert_eq!(controller.lifecycle_state(), LifecycleState::Uninitialized);
        assert!(controller.identity().is_none());
        assert_invariants(&controller);
    }

    #[test]
    fn test_login_then_logout_clears_everything() {
        let mut controller = ready(MemoryStore::new());
        controller.login("tok", dual_role_identity());
        assert_invariants(&controller);
        assert_eq!(controller.store().len(), 3);

        controller.logout();
        assert_invariants(&controller);
        assert_eq!(controller.lifecycle_state(), LifecycleState::Unauthenticated);
        assert!(controller.credential().is_none());
        assert!(controller.store().is_empty());

        controller.logout();
        assert_eq!(controller.lifecycle_state(), LifecycleState::Unauthenticated);
    }

    #[test]
    fn test_login_keeps_previously_active_role_when_granted() {
        let mut controller = ready(MemoryStore::new());
        controller.login("tok", dual_role_identity());
        assert_eq!(controller.active_role(), Some(Role::Interviewee));
        assert_eq!(controller.switch_role(), Some(Role::Interviewer));

        // Fresh login by the same account picks the stored role back up
        controller.login("tok-2", dual_role_identity());
        assert_eq!(controller.active_role(), Some(Role::Interviewer));
        assert_eq!(controller.credential(), Some("tok-2"));
    }

    #[test]
    fn test_login_ignores_stored_role_not_granted() {
        let mut controller = ready(MemoryStore::new());
        controller.login("tok", dual_role_identity());
        controller.switch_role();
        assert_eq!(controller.active_role(), Some(Role::Interviewer));

        // A different account that only holds the interviewee role
        controller.login(
            "tok-2",
            Identity::new("u1", "A", "a@x.com", Role::Interviewee),
        );
        assert_eq!(controller.active_role(), Some(Role::Interviewee));
        assert_eq!(
            controller.store().get("activeRole").unwrap().as_deref(),
            Some("interviewee")
        );
    }

    #[test]
    fn test_switch_role_toggles_and_persists() {
        let mut controller = ready(MemoryStore::new());
        controller.login("tok", dual_role_identity());

        assert!(controller.can_switch_role());
        assert_eq!(controller.switch_role(), Some(Role::Interviewer));
        assert_eq!(
            controller.store().get("activeRole").unwrap().as_deref(),
            Some("interviewer")
        );
        assert_eq!(controller.switch_role(), Some(Role::Interviewee));
        assert_invariants(&controller);
    }

    #[test]
    fn test_switch_role_noop_when_ineligible() {
        let mut controller = ready(MemoryStore::new());
        assert_eq!(controller.switch_role(), None);
        assert_eq!(controller.lifecycle_state(), LifecycleState::Unauthenticated);

        controller.login("tok", Identity::new("u1", "A", "a@x.com", Role::Interviewer));
        assert!(!controller.can_switch_role());
        assert_eq!(controller.switch_role(), None);
        assert_eq!(controller.active_role(), Some(Role::Interviewer));
    }

    #[test]
    fn test_initialize_runs_once() {
        let mut controller = ready(MemoryStore::new());
        controller.login("tok", dual_role_identity());

        assert_eq!(controller.initialize(), LifecycleState::Authenticated);
        assert_eq!(controller.credential(), Some("tok"));
    }

    #[test]
    fn test_restore_repairs_stale_active_role() {
        let identity = r#"{"id":"u1","name":"A","email":"a@x.com","role":"interviewee"}"#;
        let store = MemoryStore::with_entries([
            ("authToken", "tok"),
            ("authUser", identity),
            ("activeRole", "interviewer"),
        ]);
        let controller = ready(store);

        assert_eq!(controller.active_role(), Some(Role::Interviewee));
        assert_eq!(controller.granted_roles(), &[Role::Interviewee]);
        assert_eq!(
            controller.store().get("activeRole").unwrap().as_deref(),
            Some("interviewee")
        );
    }

    #[test]
    fn test_token_without_identity_is_cleared() {
        let store = MemoryStore::with_entries([("authToken", "tok"), ("activeRole", "interviewer")]);
        let controller = ready(store);

        assert_eq!(controller.lifecycle_state(), LifecycleState::Unauthenticated);
        assert!(controller.store().is_empty());
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let identity = r#"{"id":"u1","name":"A","email":"a@x.com","role":"interviewee"}"#;
        let store = MemoryStore::with_entries([("authToken", ""), ("authUser", identity)]);
        let controller = ready(store);

        assert_eq!(controller.lifecycle_state(), LifecycleState::Unauthenticated);
        assert!(controller.store().is_empty());
    }

    #[test]
    fn test_authorization_header() {
        let mut controller = ready(MemoryStore::new());
        assert_eq!(controller.authorization_header(), None);

        controller.login("tok-abc", dual_role_identity());
        assert_eq!(
            controller.authorization_header().as_deref(),
            Some("Bearer tok-abc")
        );
    }

    #[test]
    fn test_debug_output_redacts_credential() {
        let mut controller = ready(MemoryStore::new());
        controller.login("secret-token", dual_role_identity());

        let rendered = format!("{:?}", controller);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}

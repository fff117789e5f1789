//! Session shell - the embedding loop around the controller and the route guard
//!
//! The shell owns the single [`SessionController`] of the application. After every
//! operation and every location change it feeds the guard the current inputs and performs
//! the navigation the guard asks for.

use crate::guard::{GuardRunner, RouteGuard};
use crate::menu::{menu_for, NavItem};
use crate::session::{LifecycleState, PersistentStore, SessionController};
use mockorbit_core::{AuthResponse, Identity, Role};
use tracing::error;

/// Upper bound on redirects followed for one change; valid routes need at most one.
const MAX_REDIRECT_HOPS: usize = 4;

/// Navigation capability of the host environment
pub trait NavigationHost {
    fn current_path(&self) -> &str;

    fn request_navigation(&mut self, path: &str);
}

/// Host that applies navigation immediately and keeps a history
#[derive(Debug, Clone)]
pub struct MemoryNavigator {
    current: String,
    history: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        let current = initial_path.into();
        Self {
            history: vec![current.clone()],
            current,
        }
    }

    /// Every path visited, starting with the initial one
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl NavigationHost for MemoryNavigator {
    fn current_path(&self) -> &str {
        &self.current
    }

    fn request_navigation(&mut self, path: &str) {
        self.current = path.to_string();
        self.history.push(self.current.clone());
    }
}

pub struct SessionShell<S: PersistentStore, N: NavigationHost> {
    controller: SessionController<S>,
    runner: GuardRunner,
    host: N,
}

impl<S: PersistentStore, N: NavigationHost> SessionShell<S, N> {
    pub fn new(controller: SessionController<S>, guard: RouteGuard, host: N) -> Self {
        Self {
            controller,
            runner: GuardRunner::new(guard),
            host,
        }
    }

    /// Restore the session and run the first guard pass.
    /// Returns the redirects performed.
    pub fn start(&mut self) -> Vec<String> {
        self.controller.initialize();
        self.sync()
    }

    pub fn login(&mut self, credential: impl Into<String>, identity: Identity) -> Vec<String> {
        self.controller.login(credential, identity);
        self.sync()
    }

    pub fn login_with(&mut self, response: AuthResponse) -> Vec<String> {
        let (credential, identity) = response.into_parts();
        self.login(credential, identity)
    }

    pub fn logout(&mut self) -> Vec<String> {
        self.controller.logout();
        self.sync()
    }

    pub fn switch_role(&mut self) -> Vec<String> {
        self.controller.switch_role();
        self.sync()
    }

    /// User-initiated location change
    pub fn navigate(&mut self, path: &str) -> Vec<String> {
        self.host.request_navigation(path);
        self.sync()
    }

    /// Run the guard against the current inputs and follow its requests to the fixpoint.
    pub fn sync(&mut self) -> Vec<String> {
        let mut followed = Vec::new();

        loop {
            let target = self.runner.observe(
                self.controller.lifecycle_state(),
                self.controller.active_role(),
                self.host.current_path(),
            );
            let Some(target) = target else {
                break;
            };

            if followed.len() >= MAX_REDIRECT_HOPS {
                error!(
                    redirects = ?followed,
                    next = %target,
                    "Route guard keeps redirecting, check the route configuration"
                );
                break;
            }

            self.host.request_navigation(&target);
            followed.push(target);
        }

        followed
    }

    pub fn controller(&self) -> &SessionController<S> {
        &self.controller
    }

    pub fn host(&self) -> &N {
        &self.host
    }

    pub fn current_path(&self) -> &str {
        self.host.current_path()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.controller.lifecycle_state()
    }

    pub fn active_role(&self) -> Option<Role> {
        self.controller.active_role()
    }

    /// Navigation entries for the signed-in identity
    pub fn menu(&self) -> Vec<NavItem> {
        menu_for(self.controller.identity(), self.runner.guard().routes())
    }

    /// Tear the shell apart, e.g. to restart with the same store
    pub fn into_parts(self) -> (SessionController<S>, N) {
        (self.controller, self.host)
    }
}

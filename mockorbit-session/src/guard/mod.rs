//! Route Guard
//!
//! Maps (lifecycle state, active role, current path) to at most one required navigation.
//! The rule is pure; [`GuardRunner`] adds the "once per distinct input" bookkeeping the
//! embedding loop needs.
//!
//! Following a redirect always lands on a path the rule accepts for the same state and
//! role, so re-evaluating after navigation never asks for another one.

pub mod runner;

pub use runner::GuardRunner;

use crate::session::LifecycleState;
use mockorbit_core::{is_within, RouteConfig, Role};
use serde::Serialize;

/// Why a redirect was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Protected page visited without a session
    NotAuthenticated,
    /// Login or registration page visited with a session
    AlreadyAuthenticated,
    /// Dashboard of a role other than the active one
    WrongDashboard,
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedirectReason::NotAuthenticated => write!(f, "not authenticated"),
            RedirectReason::AlreadyAuthenticated => write!(f, "already authenticated"),
            RedirectReason::WrongDashboard => write!(f, "wrong dashboard for active role"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session not resolved yet; check again once it is
    Defer,
    /// Current location is consistent with the session
    Allow,
    Redirect { to: String, reason: RedirectReason },
}

impl GuardDecision {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn into_redirect_target(self) -> Option<String> {
        match self {
            GuardDecision::Redirect { to, .. } => Some(to),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    routes: RouteConfig,
}

impl RouteGuard {
    pub fn new(routes: RouteConfig) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteConfig {
        &self.routes
    }

    /// Evaluate the rules in order; the first match wins.
    pub fn decide(
        &self,
        state: LifecycleState,
        active_role: Option<Role>,
        current_path: &str,
    ) -> GuardDecision {
        let path = strip_query(current_path);

        match state {
            LifecycleState::Uninitialized | LifecycleState::Resolving => GuardDecision::Defer,
            LifecycleState::Unauthenticated => {
                if self.is_auth_path(path) || path == self.routes.landing_path {
                    GuardDecision::Allow
                } else {
                    GuardDecision::Redirect {
                        to: self.routes.login_path.clone(),
                        reason: RedirectReason::NotAuthenticated,
                    }
                }
            }
            LifecycleState::Authenticated => {
                // An authenticated controller always reports a role; without one
                // there is no dashboard to send anybody to.
                let Some(role) = active_role else {
                    return GuardDecision::Allow;
                };
                let dashboard = self.routes.dashboard_for(role);

                if self.is_auth_path(path) {
                    GuardDecision::Redirect {
                        to: dashboard,
                        reason: RedirectReason::AlreadyAuthenticated,
                    }
                } else if self.is_dashboard_path(path) && !is_within(path, &dashboard) {
                    // Whole segments only: `/dashboard/interviewerx` is not the
                    // interviewer dashboard and gets corrected too.
                    GuardDecision::Redirect {
                        to: dashboard,
                        reason: RedirectReason::WrongDashboard,
                    }
                } else {
                    GuardDecision::Allow
                }
            }
        }
    }

    /// The navigation the rule requires, if any
    pub fn evaluate(
        &self,
        state: LifecycleState,
        active_role: Option<Role>,
        current_path: &str,
    ) -> Option<String> {
        self.decide(state, active_role, current_path)
            .into_redirect_target()
    }

    pub fn is_auth_path(&self, path: &str) -> bool {
        is_within(strip_query(path), &self.routes.auth_prefix)
    }

    pub fn is_dashboard_path(&self, path: &str) -> bool {
        is_within(strip_query(path), &self.routes.dashboard_root)
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    fn guard() -> RouteGuard {
        RouteGuard::default()
    }

    #[test]
    fn test_defers_while_resolving() {
        assert_eq!(guard().decide(Resolving, None, "/dashboard"), GuardDecision::Defer);
        assert_eq!(guard().decide(Uninitialized, None, "/profile"), GuardDecision::Defer);
    }

    #[test]
    fn test_unauthenticated_rules() {
        let guard = guard();
        assert_eq!(
            guard.evaluate(Unauthenticated, None, "/dashboard/interviewer"),
            Some("/auth/login".to_string())
        );
        assert_eq!(
            guard.evaluate(Unauthenticated, None, "/profile"),
            Some("/auth/login".to_string())
        );
        assert_eq!(guard.evaluate(Unauthenticated, None, "/"), None);
        assert_eq!(guard.evaluate(Unauthenticated, None, "/auth/login"), None);
        assert_eq!(guard.evaluate(Unauthenticated, None, "/auth/register"), None);
        assert_eq!(
            guard.evaluate(Unauthenticated, None, "/authority"),
            Some("/auth/login".to_string())
        );
    }

    #[test]
    fn test_authenticated_leaves_auth_pages() {
        let decision = guard().decide(Authenticated, Some(Role::Interviewee), "/auth/login");
        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: "/dashboard/interviewee".to_string(),
                reason: RedirectReason::AlreadyAuthenticated,
            }
        );
    }

    #[test]
    fn test_wrong_dashboard_is_corrected() {
        let guard = guard();
        let decision = guard.decide(
            Authenticated,
            Some(Role::Interviewer),
            "/dashboard/interviewee/stats",
        );
        assert_eq!(decision.redirect_target(), Some("/dashboard/interviewer"));

        assert_eq!(
            guard.evaluate(Authenticated, Some(Role::Interviewer), "/dashboard"),
            Some("/dashboard/interviewer".to_string())
        );
        assert_eq!(
            guard.evaluate(Authenticated, Some(Role::Interviewer), "/dashboard/interviewerx"),
            Some("/dashboard/interviewer".to_string())
        );
    }

    #[test]
    fn test_authenticated_free_pages() {
        let guard = guard();
        for path in ["/", "/profile", "/schedule", "/dashboard/interviewer/peers"] {
            assert_eq!(
                guard.evaluate(Authenticated, Some(Role::Interviewer), path),
                None,
                "unexpected redirect from {}",
                path
            );
        }
    }

    #[test]
    fn test_query_and_fragment_are_ignored() {
        let guard = guard();
        assert_eq!(
            guard.evaluate(Unauthenticated, None, "/auth/login?next=%2Fprofile"),
            None
        );
        assert_eq!(
            guard.evaluate(Authenticated, Some(Role::Interviewee), "/dashboard/interviewee#top"),
            None
        );
    }

    #[test]
    fn test_every_redirect_target_is_a_fixpoint() {
        let guard = guard();
        let paths = [
            "/",
            "/auth",
            "/auth/login",
            "/auth/register",
            "/dashboard",
            "/dashboard/interviewer",
            "/dashboard/interviewee",
            "/profile",
            "/interview-room/42",
        ];
        let inputs = [
            (Unauthenticated, None),
            (Authenticated, Some(Role::Interviewer)),
            (Authenticated, Some(Role::Interviewee)),
        ];

        for (state, role) in inputs {
            for path in paths {
                if let Some(target) = guard.evaluate(state, role, path) {
                    assert_eq!(
                        guard.evaluate(state, role, &target),
                        None,
                        "redirect from {} to {} is not stable",
                        path,
                        target
                    );
                }
            }
        }
    }

    #[test]
    fn test_custom_routes() {
        let guard = RouteGuard::new(RouteConfig {
            landing_path: "/welcome".to_string(),
            auth_prefix: "/account".to_string(),
            login_path: "/account/sign-in".to_string(),
            dashboard_root: "/home".to_string(),
        });

        assert_eq!(
            guard.evaluate(Unauthenticated, None, "/home/interviewer"),
            Some("/account/sign-in".to_string())
        );
        assert_eq!(guard.evaluate(Unauthenticated, None, "/welcome"), None);
        assert_eq!(
            guard.evaluate(Authenticated, Some(Role::Interviewee), "/account/sign-in"),
            Some("/home/interviewee".to_string())
        );
    }
}

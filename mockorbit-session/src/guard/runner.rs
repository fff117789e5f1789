//! Guard runner - re-runs the rule on every observed change, once per distinct input

use super::{GuardDecision, RouteGuard};
use crate::session::LifecycleState;
use mockorbit_core::Role;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
struct GuardInput {
    state: LifecycleState,
    active_role: Option<Role>,
    path: String,
}

#[derive(Debug, Clone, Default)]
pub struct GuardRunner {
    guard: RouteGuard,
    last_input: Option<GuardInput>,
}

impl GuardRunner {
    pub fn new(guard: RouteGuard) -> Self {
        Self {
            guard,
            last_input: None,
        }
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// Report the current inputs. Returns the navigation to request, or `None` if the
    /// inputs are unchanged since the last call or no navigation is required.
    pub fn observe(
        &mut self,
        state: LifecycleState,
        active_role: Option<Role>,
        current_path: &str,
    ) -> Option<String> {
        let input = GuardInput {
            state,
            active_role,
            path: current_path.to_string(),
        };

        if self.last_input.as_ref() == Some(&input) {
            debug!(path = current_path, "Guard inputs unchanged, skipping");
            return None;
        }
        self.last_input = Some(input);

        match self.guard.decide(state, active_role, current_path) {
            GuardDecision::Redirect { to, reason } => {
                info!(from = current_path, to = %to, %reason, "Guard requested navigation");
                Some(to)
            }
            GuardDecision::Defer => {
                debug!(%state, "Guard deferred until session resolves");
                None
            }
            GuardDecision::Allow => None,
        }
    }

    /// Forget the last inputs so the next observation is evaluated afresh
    pub fn reset(&mut self) {
        self.last_input = None;
    }
}

//! Mock Orbit Session - authentication state and role-consistent navigation
//!
//! This crate holds the one piece of the application with real state-machine semantics:
//!
//! - **Session controller**: tracks the signed-in identity, its credential and which of its
//!   granted roles is active, persisted across restarts
//! - **Route guard**: a pure rule deciding whether the current location is consistent with
//!   the session, and where to go if it is not
//! - **Shell**: the loop that ties both to a navigation host
//!
//! ## Example
//!
//! ```
//! use mockorbit_core::{Identity, Role};
//! use mockorbit_session::{
//!     MemoryNavigator, MemoryStore, RouteGuard, SessionController, SessionShell,
//! };
//!
//! let controller = SessionController::new(MemoryStore::new());
//! let mut shell = SessionShell::new(
//!     controller,
//!     RouteGuard::default(),
//!     MemoryNavigator::new("/dashboard/interviewer"),
//! );
//!
//! assert_eq!(shell.start(), vec!["/auth/login".to_string()]);
//!
//! shell.login("tok-abc", Identity::new("u1", "A", "a@x.com", Role::Interviewee));
//! assert_eq!(shell.current_path(), "/dashboard/interviewee");
//! ```

pub mod guard;
pub mod menu;
pub mod session;
pub mod shell;

pub use guard::{GuardDecision, GuardRunner, RedirectReason, RouteGuard};
pub use menu::{menu_for, NavItem};
pub use session::{
    ActiveSession, FileStore, LifecycleState, MemoryStore, PersistentStore, SessionController,
    StoreKeys,
};
pub use shell::{MemoryNavigator, NavigationHost, SessionShell};

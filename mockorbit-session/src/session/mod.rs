//! Session state machine and its persistence
//!
//! - [`SessionController`]: identity, credential and active role, restored at startup
//! - [`PersistentStore`]: the key-value capability the controller persists through

pub mod controller;
pub mod storage;
pub mod types;

pub use controller::SessionController;
pub use storage::{FileStore, MemoryStore, PersistentStore, StoreKeys};
pub use types::{ActiveSession, LifecycleState};

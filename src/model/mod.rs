// Package model provides the lifecycle vocabulary shared by every orchestration layer.

pub mod identity;
pub mod state;
pub mod timeouts;


// Re-export main types
pub use identity::{ResourceIdentity, ResourceKind, TransitionRequest};
pub use state::{DesiredState, ObservedState, UnrecognizedState};
pub use timeouts::{LifecycleTimeouts, RestartTimings};

//! State poller: request a transition, then wait for the manager to report it.

pub mod poller;
mod retry;


// Re-export main types
pub use poller::StatePoller;
pub(crate) use retry::send_with_retry;

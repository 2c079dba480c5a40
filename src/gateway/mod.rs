//! Control-plane gateway: raw request/response access to the cluster manager.

pub mod gateway;
mod hyper_impl;
pub mod manager;
pub mod trace;


// Re-export main types
pub use gateway::{Gateway, GatewayError, Response};
pub use manager::ManagerGateway;

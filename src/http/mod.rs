// HTTP module: pooled client used by the control-plane gateway.

pub mod client;

pub use client::{create_client, HyperClient};

#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod app;
pub mod audit;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod inventory;
pub mod lifecycle;
pub mod manager;
pub mod metrics;
pub mod model;
pub mod poller;
pub mod relocation;
pub mod shutdown;

//! Application facade: wires configuration, gateway, inventory and workflows.

pub mod app;


pub use app::App;

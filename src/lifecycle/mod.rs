//! Bulk lifecycle: stop-all, start-all and the restart saga built on them.

pub mod driver;


pub use driver::{BulkLifecycleDriver, START_ALL_CONTEXT, STOP_ALL_CONTEXT};

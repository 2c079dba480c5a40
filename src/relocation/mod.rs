//! Component relocation: move a placement between hosts step by step.

pub mod executor;
pub mod plan;


pub use executor::RelocationExecutor;
pub use plan::{RelocationOutcome, RelocationPlan, RelocationStep};

// Shared test support code.
// Provides an in-memory manager, its HTTP front and seeded fixtures.

pub mod audit;
pub mod common;
pub mod server;
pub mod stub;

pub use audit::MemoryAudit;
pub use common::*;
pub use server::{ManagerServer, SeenRequest};
pub use stub::{Call, StubManager};

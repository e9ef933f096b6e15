//! Job record store abstraction.
//!
//! The pipeline orchestrator is the only writer of job records; it reads and
//! writes them through the narrow `JobStore` seam so a document-store adapter
//! can replace the shipped in-memory implementation without touching the
//! core.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use store::JobStore;

//! In-process storage backed by `parking_lot` locks.

mod records;
mod registry;

pub use records::MemoryRecordStore;
pub use registry::MemoryTenantRegistry;

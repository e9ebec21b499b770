//! Core storage traits.
//!
//! - [`TenantRegistry`] - Tenant and site records, queried by hostname, slug or ID
//! - [`RecordStore`] - Storage for one owned entity type, filtered by [`OwnerFilter`]
//!
//! Neither trait knows about the request context. Implicit scoping is
//! layered on top of [`RecordStore`] by [`crate::scope::Scoped`].

mod records;
mod registry;

pub use records::{OwnerFilter, RecordStore};
pub use registry::TenantRegistry;

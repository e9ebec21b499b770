//! Tenants, sites and the per-request binding between them.
//!
//! # Core Types
//!
//! - [`Tenant`] - Top-level organization, resolved from the request hostname
//! - [`Site`] - Sub-property owned by exactly one tenant
//! - [`TenantId`] / [`SiteId`] - Opaque generated identifiers
//! - [`RequestContext`] - Task-local slot holding the bound tenant and site
//!
//! # Examples
//!
//! ```
//! use canopy_persistence::tenant::{Site, Tenant, TenantStatus};
//!
//! let tenant = Tenant::new("acme", "acme.example", "Acme Corp")
//!     .with_status(TenantStatus::PrivateAccess);
//! assert!(tenant.requires_login());
//!
//! let site = Site::new(tenant.id.clone(), "news.acme.example");
//! assert_eq!(site.tenant_id, tenant.id);
//! ```

mod context;
mod id;
mod model;

pub use context::{ContextState, RequestContext};
pub use id::{ROOT_TENANT_SLUG, SiteId, TenantId};
pub use model::{Site, Tenant, TenantStatus};

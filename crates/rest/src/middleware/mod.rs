//! HTTP middleware.
//!
//! - [`tenant`] - Opens the unit of work, resolves the tenant from the host
//!   and narrows the context to a site
//!
//! Both stages run for every route, including the fallback.

pub mod tenant;

pub use tenant::{bind_site, resolve_tenant};

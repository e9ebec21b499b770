//! HTTP request handlers.
//!
//! - [`health`] - Liveness endpoint, served without a tenant
//! - [`tenant`] - Views of the tenant and site bound to the request

pub mod health;
pub mod tenant;

// Re-export handlers for convenience
pub use health::liveness_handler;
pub use tenant::{current_site_handler, current_tenant_handler, fallback_handler, index_handler};

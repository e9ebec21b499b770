//! Hostname-based tenant resolution.
//!
//! - [`normalize_host`] and friends clean the inbound `Host` value
//! - [`TenantResolver`] maps a normalized host to a tenant per [`Environment`](crate::config::Environment)
//!
//! The resolver never touches the request context; binding the result is
//! the job of [`crate::middleware::tenant`].

mod host;
mod resolver;

pub use host::{LOOPBACK_ALIASES, first_label, is_loopback, normalize_host};
pub use resolver::{Resolution, ResolutionError, TenantResolver};

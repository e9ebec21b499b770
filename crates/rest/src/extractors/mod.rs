//! Axum extractors for the request context.
//!
//! - [`CurrentTenant`] - The tenant bound by the resolution middleware
//! - [`CurrentSite`] - The site bound by the site narrowing stage

mod tenant;

pub use tenant::{CurrentSite, CurrentTenant};

//! Route configuration.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to handlers and installs the tenant middleware.

pub mod routes;

pub use routes::create_routes;

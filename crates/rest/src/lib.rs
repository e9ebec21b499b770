//! # canopy-rest - Hostname-based tenant resolution over HTTP
//!
//! This crate puts the Canopy tenant registry in front of an Axum
//! application. Every request runs in its own unit of work: the host is
//! resolved to a tenant, the tenant (and, when one matches, a site) is bound
//! into the [`RequestContext`](canopy_persistence::tenant::RequestContext),
//! and scoped repositories downstream see only that tenant's records.
//!
//! ## Resolution
//!
//! | Mode | `*localhost*` or loopback host | other host |
//! |------|--------------------|------------|
//! | `test` | slug from first label, else root | lenient hostname lookup |
//! | `development` | slug from first label, else root | hostname lookup |
//! | anything else | hostname lookup | hostname lookup |
//!
//! An unknown or disabled host is answered with `404 Tenant not found`.
//! A registry fault degrades to the root tenant instead of failing the
//! request. The liveness path skips resolution entirely.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canopy_persistence::backends::sqlite::SqliteRegistry;
//! use canopy_rest::{ServerConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = SqliteRegistry::open("canopy.db")?;
//!     let config = ServerConfig::default();
//!
//!     let app = create_app_with_config(registry, config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Server configuration and deployment [`Environment`]
//! - [`tenant`] - Host normalization and the [`TenantResolver`](tenant::TenantResolver)
//! - [`middleware`] - Unit-of-work, tenant and site binding middleware
//! - [`extractors`] - Extractors for the bound tenant and site
//! - [`handlers`] - HTTP request handlers
//! - [`routing`] - Route configuration
//! - [`state`] - Application state
//! - [`error`] - Error types and responses

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod state;
pub mod tenant;

// Re-export commonly used types
pub use config::{Environment, ServerConfig};
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use canopy_persistence::core::TenantRegistry;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<R>(registry: R) -> Router
where
    R: TenantRegistry + 'static,
{
    create_app_with_config(registry, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Example
///
/// ```rust
/// use canopy_persistence::backends::memory::MemoryTenantRegistry;
/// use canopy_rest::{Environment, ServerConfig, create_app_with_config};
///
/// let config = ServerConfig {
///     environment: Environment::Development,
///     enable_cors: true,
///     ..Default::default()
/// };
/// let app = create_app_with_config(MemoryTenantRegistry::new(), config);
/// ```
pub fn create_app_with_config<R>(registry: R, config: ServerConfig) -> Router
where
    R: TenantRegistry + 'static,
{
    info!(
        backend = registry.backend_name(),
        environment = %config.environment,
        "Creating HTTP application"
    );

    let state = AppState::new(Arc::new(registry), config.clone());

    let router = routing::create_routes(state);

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ))
        .layer(PropagateRequestIdLayer::x_request_id());

    // Add CORS if enabled
    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` overrides
/// `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "canopy_rest={level},canopy_persistence={level},canopy={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

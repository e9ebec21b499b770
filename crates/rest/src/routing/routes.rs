//! Route table.

use axum::{Router, middleware::from_fn_with_state, routing::get};
use canopy_persistence::core::TenantRegistry;

use crate::handlers;
use crate::middleware::{bind_site, resolve_tenant};
use crate::state::AppState;

/// Creates all routes.
///
/// # Routes
///
/// - `GET [liveness path]` - Liveness probe, no tenant resolution
/// - `GET /` - Landing page of the bound tenant
/// - `GET /tenant` - Bound tenant as JSON
/// - `GET /site` - Bound site as JSON
///
/// Every other path reaches the fallback after tenant resolution.
pub fn create_routes<R>(state: AppState<R>) -> Router
where
    R: TenantRegistry + 'static,
{
    let liveness_path = state.liveness_path().to_string();

    Router::new()
        .route(&liveness_path, get(handlers::liveness_handler))
        .route("/", get(handlers::index_handler))
        .route("/tenant", get(handlers::current_tenant_handler))
        .route("/site", get(handlers::current_site_handler))
        .fallback(handlers::fallback_handler)
        // Layers wrap outward: resolve_tenant runs first.
        .layer(from_fn_with_state(state.clone(), bind_site::<R>))
        .layer(from_fn_with_state(state.clone(), resolve_tenant::<R>))
        .with_state(state)
}

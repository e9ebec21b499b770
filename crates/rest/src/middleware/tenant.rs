//! Tenant resolution middleware.
//!
//! [`resolve_tenant`] must be the outermost tenant-aware layer: it opens a
//! fresh [`RequestContext`] for the request, so nothing bound here outlives
//! the response and concurrent requests never observe each other's tenant.
//! [`bind_site`] runs inside it.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use canopy_persistence::core::TenantRegistry;
use canopy_persistence::tenant::{RequestContext, Site, Tenant};
use tracing::{debug, error, warn};

use crate::error::RestError;
use crate::state::AppState;
use crate::tenant::{Resolution, ResolutionError, normalize_host};

/// Returns the request host from the `Host` header, falling back to the URI
/// authority.
pub fn request_host(request: &Request) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

/// Middleware that resolves the tenant for the request host.
///
/// Use with `axum::middleware::from_fn_with_state`.
///
/// | Outcome | Effect |
/// |---------|--------|
/// | liveness path | continue, nothing bound |
/// | tenant found | bind tenant, continue |
/// | unknown or disabled | 404 "Tenant not found", pipeline stops |
/// | registry fault | bind root tenant, continue |
pub async fn resolve_tenant<R>(
    State(state): State<AppState<R>>,
    request: Request,
    next: Next,
) -> Response
where
    R: TenantRegistry + 'static,
{
    RequestContext::scope(resolve_and_run(state, request, next)).await
}

async fn resolve_and_run<R>(state: AppState<R>, request: Request, next: Next) -> Response
where
    R: TenantRegistry + 'static,
{
    let host = request_host(&request);
    let resolution = state
        .resolver()
        .resolve(&host, state.environment(), request.uri().path())
        .await;

    match resolution {
        Ok(Resolution::Bypassed) => {}
        Ok(Resolution::Bound(tenant)) => {
            if let Err(response) = bind(tenant) {
                return response;
            }
        }
        Err(e @ (ResolutionError::NotFound { .. } | ResolutionError::Disabled { .. })) => {
            debug!(reason = %e, "Rejecting request");
            return RestError::TenantNotFound.into_response();
        }
        Err(e @ ResolutionError::InternalFault { .. }) => {
            error!(error = %e, "Tenant resolution failed; serving root tenant");
            match state.resolver().fallback_root().await {
                Ok(root) => {
                    if let Err(response) = bind(root) {
                        return response;
                    }
                }
                Err(root_err) => {
                    error!(error = %root_err, "Root tenant unavailable; continuing without a tenant");
                }
            }
        }
    }

    next.run(request).await
}

fn bind(tenant: Tenant) -> Result<(), Response> {
    RequestContext::set_tenant(tenant).map_err(|e| RestError::from(e).into_response())
}

/// Middleware that narrows the unit of work to a site of the bound tenant.
///
/// Binds the site whose primary hostname matches the request host, or the
/// tenant's only site. Does nothing when no tenant is bound or no site
/// matches. Must run inside [`resolve_tenant`].
pub async fn bind_site<R>(State(state): State<AppState<R>>, request: Request, next: Next) -> Response
where
    R: TenantRegistry + 'static,
{
    if let Some(tenant) = RequestContext::tenant() {
        let host = normalize_host(&request_host(&request));
        match state.registry().sites_for_tenant(&tenant.id).await {
            Ok(sites) => {
                if let Some(site) = select_site(sites, &host)
                    && let Err(e) = RequestContext::set_site(site)
                {
                    return RestError::from(e).into_response();
                }
            }
            Err(e) => {
                warn!(tenant = %tenant.slug, error = %e, "Site lookup failed; continuing at tenant scope");
            }
        }
    }

    next.run(request).await
}

fn select_site(mut sites: Vec<Site>, host: &str) -> Option<Site> {
    if let Some(pos) = sites.iter().position(|s| s.primary_hostname == host) {
        return Some(sites.swap_remove(pos));
    }
    if sites.len() == 1 { sites.pop() } else { None }
}

//! Handlers exposing the request context.

use axum::{
    Json,
    http::Uri,
    response::{Html, IntoResponse},
};
use quick_xml::escape::escape;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::{CurrentSite, CurrentTenant};

/// Handler for the landing page.
///
/// Tolerates a missing tenant, which happens when the registry is down and
/// the root tenant cannot be loaded either.
///
/// # HTTP Request
///
/// `GET /`
pub async fn index_handler(tenant: Option<CurrentTenant>) -> impl IntoResponse {
    match tenant {
        Some(CurrentTenant(tenant)) if tenant.requires_login() => Html(format!(
            "<h1>{}</h1><p>Sign in to continue.</p>",
            escape(&tenant.title)
        )),
        Some(CurrentTenant(tenant)) => Html(format!("<h1>{}</h1>", escape(&tenant.title))),
        None => Html("<h1>Canopy</h1>".to_string()),
    }
}

/// Handler returning the bound tenant.
///
/// # HTTP Request
///
/// `GET /tenant`
///
/// # Response
///
/// - `200 OK` - Tenant summary as JSON
/// - `404 Not Found` - No tenant bound
pub async fn current_tenant_handler(CurrentTenant(tenant): CurrentTenant) -> Json<Value> {
    debug!(tenant = %tenant.slug, "Processing tenant request");

    Json(json!({
        "id": tenant.id,
        "slug": tenant.slug,
        "hostname": tenant.hostname,
        "title": tenant.title,
        "status": tenant.status,
        "root": tenant.root,
        "requires_login": tenant.requires_login(),
    }))
}

/// Handler returning the bound site.
///
/// # HTTP Request
///
/// `GET /site`
pub async fn current_site_handler(
    CurrentTenant(tenant): CurrentTenant,
    CurrentSite(site): CurrentSite,
) -> Json<Value> {
    Json(json!({
        "id": site.id,
        "tenant": tenant.slug,
        "primary_hostname": site.primary_hostname,
        "base_url": site.base_url(),
    }))
}

/// Fallback for unrouted paths.
///
/// Tenant resolution still runs first, so an unknown host gets the tenant
/// page rather than this response.
pub async fn fallback_handler(uri: Uri) -> RestResult<()> {
    Err(RestError::NotFound {
        message: format!("No route for {}", uri.path()),
    })
}

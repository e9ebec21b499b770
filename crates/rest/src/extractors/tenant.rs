//! Request context extractors.
//!
//! Read the tenant and site bound by the middleware for the current unit of
//! work. Handlers that need a tenant take [`CurrentTenant`]; handlers that
//! also work without one take `Option<CurrentTenant>`.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use canopy_persistence::error::TenantError;
use canopy_persistence::tenant::{RequestContext, Site, Tenant};

use crate::error::RestError;

/// Axum extractor for the bound tenant.
///
/// # Example
///
/// ```rust,ignore
/// use canopy_rest::extractors::CurrentTenant;
///
/// async fn handler(CurrentTenant(tenant): CurrentTenant) -> String {
///     tenant.title
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Tenant);

/// Axum extractor for the bound site.
#[derive(Debug, Clone)]
pub struct CurrentSite(pub Site);

fn require_unit_of_work() -> Result<(), RestError> {
    if RequestContext::is_active() {
        Ok(())
    } else {
        Err(TenantError::NoActiveUnitOfWork.into())
    }
}

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_unit_of_work()?;
        RequestContext::tenant()
            .map(CurrentTenant)
            .ok_or(RestError::TenantNotFound)
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(
        _parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        require_unit_of_work()?;
        Ok(RequestContext::tenant().map(CurrentTenant))
    }
}

impl<S> FromRequestParts<S> for CurrentSite
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_unit_of_work()?;
        RequestContext::site()
            .map(CurrentSite)
            .ok_or_else(|| RestError::NotFound {
                message: "No site for this host".to_string(),
            })
    }
}

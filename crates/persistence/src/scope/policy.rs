//! Tenant and site scope policies.
//!
//! A policy decides, from the [`RequestContext`], which [`OwnerFilter`] a
//! scoped repository applies and whether a record is consistent with the
//! bound owner.

use std::fmt;

use crate::core::OwnerFilter;
use crate::error::{TenantError, ValidationError};
use crate::tenant::{RequestContext, SiteId, TenantId};

use super::owned::{Owned, SiteOwned};

/// Scoping rules for one family of entity types.
pub trait ScopePolicy<E: Owned>: Send + Sync + 'static {
    /// The owner identifier of this scope.
    type Owner: Clone + fmt::Display + Send + Sync;

    /// Name of the owner, used in errors.
    const NAME: &'static str;

    /// Returns the owner bound in the request context.
    fn bound_owner() -> Option<Self::Owner>;

    /// Returns the filter selecting records owned by `owner`.
    fn filter_for(owner: &Self::Owner) -> OwnerFilter;

    /// Returns the filter implied by the request context.
    ///
    /// Unfiltered when nothing is bound.
    fn default_filter() -> OwnerFilter;

    /// Checks that the record's owner references are set.
    fn validate_presence(record: &E) -> Result<(), ValidationError>;

    /// Checks that the record belongs to the bound owner.
    ///
    /// Passes when nothing is bound.
    fn check_consistent(record: &E) -> Result<(), TenantError>;
}

/// Scoping for tenant-owned entity types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantScope;

impl<E: Owned> ScopePolicy<E> for TenantScope {
    type Owner = TenantId;

    const NAME: &'static str = "tenant";

    fn bound_owner() -> Option<TenantId> {
        RequestContext::tenant_id()
    }

    fn filter_for(owner: &TenantId) -> OwnerFilter {
        OwnerFilter::tenant(owner.clone())
    }

    fn default_filter() -> OwnerFilter {
        RequestContext::tenant_id()
            .map(OwnerFilter::tenant)
            .unwrap_or_default()
    }

    fn validate_presence(record: &E) -> Result<(), ValidationError> {
        require_tenant(record)
    }

    fn check_consistent(record: &E) -> Result<(), TenantError> {
        check_tenant(record)
    }
}

/// Scoping for site-owned entity types.
///
/// With a site bound, queries are restricted to that site. With only a
/// tenant bound, they are restricted to the tenant's sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteScope;

impl<E: SiteOwned> ScopePolicy<E> for SiteScope {
    type Owner = SiteId;

    const NAME: &'static str = "site";

    fn bound_owner() -> Option<SiteId> {
        RequestContext::site_id()
    }

    fn filter_for(owner: &SiteId) -> OwnerFilter {
        OwnerFilter::site(owner.clone())
    }

    fn default_filter() -> OwnerFilter {
        OwnerFilter {
            tenant: RequestContext::tenant_id(),
            site: RequestContext::site_id(),
        }
    }

    fn validate_presence(record: &E) -> Result<(), ValidationError> {
        require_tenant(record)?;
        match record.site_id() {
            Some(site) if !site.is_empty() => Ok(()),
            _ => Err(ValidationError::MissingRequiredField {
                field: "site_id".to_string(),
            }),
        }
    }

    fn check_consistent(record: &E) -> Result<(), TenantError> {
        check_tenant(record)?;
        if let Some(bound) = RequestContext::site_id()
            && record.site_id() != Some(&bound)
        {
            return Err(violation(
                record,
                format!("site {}", bound),
                describe("site", record.site_id()),
            ));
        }
        Ok(())
    }
}

fn require_tenant<E: Owned>(record: &E) -> Result<(), ValidationError> {
    match record.tenant_id() {
        Some(tenant) if !tenant.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingRequiredField {
            field: "tenant_id".to_string(),
        }),
    }
}

fn check_tenant<E: Owned>(record: &E) -> Result<(), TenantError> {
    match RequestContext::tenant_id() {
        Some(bound) if record.tenant_id() != Some(&bound) => Err(violation(
            record,
            format!("tenant {}", bound),
            describe("tenant", record.tenant_id()),
        )),
        _ => Ok(()),
    }
}

fn describe<T: fmt::Display>(name: &str, owner: Option<&T>) -> String {
    match owner {
        Some(owner) => format!("{} {}", name, owner),
        None => format!("no {}", name),
    }
}

pub(super) fn violation<E: Owned>(record: &E, expected: String, found: String) -> TenantError {
    TenantError::ScopeViolation {
        kind: E::KIND,
        record_id: record.record_id().to_string(),
        expected,
        found,
    }
}

//! Scoped repository decorator.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{error, trace};

use crate::core::{OwnerFilter, RecordStore, TenantRegistry};
use crate::error::{ResourceError, StorageResult, TenantError};
use crate::tenant::RequestContext;

use super::owned::Owned;
use super::policy::{ScopePolicy, SiteScope, TenantScope, violation};

/// A repository for tenant-owned records.
pub type TenantScoped<E, S> = Scoped<E, S, TenantScope>;

/// A repository for site-owned records.
pub type SiteScoped<E, S> = Scoped<E, S, SiteScope>;

/// Wraps a [`RecordStore`] so every access is restricted to the owner bound
/// in the [`RequestContext`](crate::tenant::RequestContext).
///
/// | Capability | Method |
/// |------------|--------|
/// | default filter | [`all`](Self::all), [`find`](Self::find), [`update`](Self::update), [`delete`](Self::delete) |
/// | bypass, all owners | [`unscoped_all`](Self::unscoped_all), [`unscoped_find`](Self::unscoped_find) |
/// | bypass to named owner | [`owned_by`](Self::owned_by) |
/// | assert bound | [`require_bound`](Self::require_bound) |
/// | assert consistent | [`ensure_consistent`](Self::ensure_consistent) |
///
/// With nothing bound, the default filter matches every owner. Callers that
/// must never run unscoped use [`require_bound`](Self::require_bound).
///
/// A record naming a site must name that site's tenant. The pair is checked
/// against the bound site, or else against the registry attached with
/// [`with_site_registry`](Self::with_site_registry). Without either the
/// write is rejected.
pub struct Scoped<E, S, P> {
    store: Arc<S>,
    sites: Option<Arc<dyn TenantRegistry>>,
    _marker: PhantomData<fn() -> (E, P)>,
}

impl<E, S, P> Clone for Scoped<E, S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sites: self.sites.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, S, P> Scoped<E, S, P>
where
    E: Owned,
    S: RecordStore<E>,
    P: ScopePolicy<E>,
{
    /// Wraps `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sites: None,
            _marker: PhantomData,
        }
    }

    /// Attaches the registry used to look up the tenant of a record's site.
    pub fn with_site_registry(mut self, registry: Arc<dyn TenantRegistry>) -> Self {
        self.sites = Some(registry);
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the filter the request context currently implies.
    pub fn current_filter(&self) -> OwnerFilter {
        let filter = P::default_filter();
        if filter.is_unfiltered() {
            trace!(kind = E::KIND, "No owner bound; query is unscoped");
        }
        filter
    }

    /// Returns every record visible in the current context.
    pub async fn all(&self) -> StorageResult<Vec<E>> {
        self.store.fetch(&self.current_filter()).await
    }

    /// Returns the record with `id` if it is visible in the current context.
    pub async fn find(&self, id: &str) -> StorageResult<Option<E>> {
        self.store.find(id, &self.current_filter()).await
    }

    /// Stores a new record.
    ///
    /// The record's owner must be set and must match the bound owner.
    pub async fn create(&self, record: E) -> StorageResult<E> {
        P::validate_presence(&record)?;
        self.ensure_consistent(&record)?;
        self.check_site_owner(&record).await?;
        self.store.insert(record).await
    }

    /// Replaces a record visible in the current context.
    pub async fn update(&self, record: E) -> StorageResult<E> {
        P::validate_presence(&record)?;
        self.ensure_consistent(&record)?;
        self.check_site_owner(&record).await?;
        self.store.update(record, &self.current_filter()).await
    }

    /// Deletes a record visible in the current context.
    pub async fn delete(&self, id: &str) -> StorageResult<bool> {
        self.store.delete(id, &self.current_filter()).await
    }

    /// Returns the records of every owner, ignoring the request context.
    pub async fn unscoped_all(&self) -> StorageResult<Vec<E>> {
        self.store.fetch(&OwnerFilter::unfiltered()).await
    }

    /// Returns the record with `id` regardless of its owner.
    ///
    /// Run [`ensure_consistent`](Self::ensure_consistent) before mutating a
    /// record loaded this way.
    pub async fn unscoped_find(&self, id: &str) -> StorageResult<Option<E>> {
        self.store.find(id, &OwnerFilter::unfiltered()).await
    }

    /// Returns the records of `owner`, ignoring the request context.
    pub async fn owned_by(&self, owner: &P::Owner) -> StorageResult<Vec<E>> {
        self.store.fetch(&P::filter_for(owner)).await
    }

    /// Returns the bound owner, or fails if nothing is bound.
    pub fn require_bound(&self) -> Result<P::Owner, TenantError> {
        P::bound_owner().ok_or(TenantError::NotBound { scope: P::NAME })
    }

    /// Fails unless the record's tenant owns the record's site.
    async fn check_site_owner(&self, record: &E) -> StorageResult<()> {
        let Some(site_id) = record.site_id() else {
            return Ok(());
        };
        let owner = match RequestContext::site() {
            Some(site) if &site.id == site_id => site.tenant_id,
            _ => {
                let Some(registry) = &self.sites else {
                    let err = TenantError::UnverifiedSite {
                        kind: E::KIND,
                        record_id: record.record_id().to_string(),
                        site_id: site_id.clone(),
                    };
                    error!(kind = E::KIND, record_id = record.record_id(), error = %err, "Scope violation");
                    return Err(err.into());
                };
                registry
                    .find_site(site_id)
                    .await?
                    .ok_or_else(|| ResourceError::not_found("site", site_id.as_str()))?
                    .tenant_id
            }
        };
        if record.tenant_id() != Some(&owner) {
            let err = violation(
                record,
                format!("tenant {} of site {}", owner, site_id),
                match record.tenant_id() {
                    Some(tenant) => format!("tenant {}", tenant),
                    None => "no tenant".to_string(),
                },
            );
            error!(kind = E::KIND, record_id = record.record_id(), error = %err, "Scope violation");
            return Err(err.into());
        }
        Ok(())
    }

    /// Fails if `record` belongs to an owner other than the bound one.
    pub fn ensure_consistent(&self, record: &E) -> Result<(), TenantError> {
        P::check_consistent(record).inspect_err(|e| {
            error!(kind = E::KIND, record_id = record.record_id(), error = %e, "Scope violation");
        })
    }
}

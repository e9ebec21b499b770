//! Request context for the currently bound tenant and site.
//!
//! [`RequestContext`] is a task-local slot: every unit of work (an HTTP
//! request, a background job) runs inside [`RequestContext::scope`] and gets
//! its own, initially empty, context. Concurrent units of work never share a
//! slot, and a pooled worker thread can never observe a value left behind by
//! a previous unit of work because the slot lives and dies with the scope.
//!
//! ```
//! use canopy_persistence::tenant::{RequestContext, Tenant};
//!
//! # tokio_test_block_on(async {
//! let tenant = Tenant::new("acme", "acme.example", "Acme");
//! let id = tenant.id.clone();
//!
//! RequestContext::scope(async move {
//!     assert!(RequestContext::tenant().is_none());
//!     RequestContext::set_tenant(tenant).unwrap();
//!     assert_eq!(RequestContext::tenant_id(), Some(id));
//! })
//! .await;
//!
//! // Outside the scope nothing is bound.
//! assert!(RequestContext::tenant().is_none());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::cell::RefCell;
use std::future::Future;

use tracing::debug;

use super::id::{SiteId, TenantId};
use super::model::{Site, Tenant};
use crate::error::TenantError;

tokio::task_local! {
    static CURRENT: RefCell<ContextState>;
}

/// The tenant and site bound to one unit of work.
///
/// If both are set, `site.tenant_id == tenant.id`.
#[derive(Debug, Clone, Default)]
pub struct ContextState {
    tenant: Option<Tenant>,
    site: Option<Site>,
}

impl ContextState {
    /// Creates a state bound to the given tenant.
    pub fn bound_to(tenant: Tenant) -> Self {
        Self {
            tenant: Some(tenant),
            site: None,
        }
    }

    /// Returns the bound tenant.
    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    /// Returns the bound site.
    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    /// Returns `true` if neither a tenant nor a site is bound.
    pub fn is_empty(&self) -> bool {
        self.tenant.is_none() && self.site.is_none()
    }
}

/// Accessors for the task-local request context.
pub struct RequestContext;

impl RequestContext {
    /// Runs `future` as a fresh unit of work with an empty context.
    ///
    /// The context is dropped when the future completes, panics or is
    /// cancelled.
    pub async fn scope<F: Future>(future: F) -> F::Output {
        CURRENT
            .scope(RefCell::new(ContextState::default()), future)
            .await
    }

    /// Runs `future` as a fresh unit of work already bound to `tenant`.
    ///
    /// Intended for background jobs operating on a known tenant.
    pub async fn with_tenant<F: Future>(tenant: Tenant, future: F) -> F::Output {
        CURRENT
            .scope(RefCell::new(ContextState::bound_to(tenant)), future)
            .await
    }

    /// Runs the closure `f` as a fresh synchronous unit of work.
    pub fn sync_scope<R>(f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(RefCell::new(ContextState::default()), f)
    }

    /// Returns `true` when called inside a unit of work.
    pub fn is_active() -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// Binds `tenant` to the current unit of work.
    ///
    /// A bound site belonging to a different tenant is unbound.
    pub fn set_tenant(tenant: Tenant) -> Result<(), TenantError> {
        Self::modify(|state| {
            if state
                .site
                .as_ref()
                .is_some_and(|site| site.tenant_id != tenant.id)
            {
                state.site = None;
            }
            debug!(tenant = %tenant.slug, "Bound tenant to request context");
            state.tenant = Some(tenant);
            Ok(())
        })
    }

    /// Narrows the current unit of work to `site`.
    ///
    /// Fails if a tenant is bound and the site belongs to another tenant.
    pub fn set_site(site: Site) -> Result<(), TenantError> {
        Self::modify(|state| {
            if let Some(tenant) = &state.tenant
                && tenant.id != site.tenant_id
            {
                return Err(TenantError::ContextMismatch {
                    site_id: site.id.clone(),
                    site_tenant: site.tenant_id.clone(),
                    bound_tenant: tenant.id.clone(),
                });
            }
            debug!(site = %site.id, "Bound site to request context");
            state.site = Some(site);
            Ok(())
        })
    }

    /// Returns the bound tenant.
    pub fn tenant() -> Option<Tenant> {
        Self::read(|state| state.tenant.clone())
    }

    /// Returns the bound site.
    pub fn site() -> Option<Site> {
        Self::read(|state| state.site.clone())
    }

    /// Returns the ID of the bound tenant, or of the bound site's tenant.
    pub fn tenant_id() -> Option<TenantId> {
        Self::read(|state| {
            state
                .tenant
                .as_ref()
                .map(|t| t.id.clone())
                .or_else(|| state.site.as_ref().map(|s| s.tenant_id.clone()))
        })
    }

    /// Returns the ID of the bound site.
    pub fn site_id() -> Option<SiteId> {
        Self::read(|state| state.site.as_ref().map(|s| s.id.clone()))
    }

    /// Returns a copy of the whole context.
    pub fn snapshot() -> ContextState {
        Self::read(ContextState::clone)
    }

    /// Clears the context of the current unit of work.
    ///
    /// Does nothing outside a unit of work.
    pub fn reset() {
        let _ = CURRENT.try_with(|cell| *cell.borrow_mut() = ContextState::default());
    }

    fn read<T: Default>(f: impl FnOnce(&ContextState) -> T) -> T {
        CURRENT.try_with(|cell| f(&cell.borrow())).unwrap_or_default()
    }

    fn modify(
        f: impl FnOnce(&mut ContextState) -> Result<(), TenantError>,
    ) -> Result<(), TenantError> {
        CURRENT
            .try_with(|cell| f(&mut cell.borrow_mut()))
            .map_err(|_| TenantError::NoActiveUnitOfWork)?
    }
}

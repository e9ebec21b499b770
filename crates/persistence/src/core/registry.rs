//! Tenant registry trait.
//!
//! The [`TenantRegistry`] is the read-mostly set of tenant and site records.
//! The tenant resolver queries it on every request; admin operations use it
//! to change status, titles and settings.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ResourceError, StorageResult};
use crate::tenant::{Site, SiteId, Tenant, TenantId};

/// Storage for tenant and site records.
///
/// Hostnames and slugs are unique and compared lower-case. Implementations
/// must run [`Tenant::validate`] / [`Site::validate`] before every write and
/// persist writes synchronously: a returned `Ok` means the record is stored.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Returns a human-readable name for this registry backend.
    fn backend_name(&self) -> &'static str;

    /// Looks up a tenant by hostname, returning `None` when absent.
    async fn find_by_hostname(&self, hostname: &str) -> StorageResult<Option<Tenant>>;

    /// Looks up a tenant by hostname, failing with
    /// [`ResourceError::NotFound`] when absent.
    async fn find_by_hostname_strict(&self, hostname: &str) -> StorageResult<Tenant> {
        self.find_by_hostname(hostname)
            .await?
            .ok_or_else(|| ResourceError::not_found("tenant", hostname).into())
    }

    /// Looks up a tenant by slug.
    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Tenant>>;

    /// Looks up a tenant by ID.
    async fn find_by_id(&self, id: &TenantId) -> StorageResult<Option<Tenant>>;

    /// Returns the root tenant, if one has been provisioned.
    async fn root_tenant(&self) -> StorageResult<Option<Tenant>>;

    /// Lists every tenant, ordered by slug.
    async fn list_tenants(&self) -> StorageResult<Vec<Tenant>>;

    /// Stores a new tenant.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation` - If the tenant is invalid
    /// * `StorageError::Resource(AlreadyExists)` - If the slug or hostname is
    ///   taken, or a second root tenant is created
    async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant>;

    /// Replaces a stored tenant's mutable attributes.
    ///
    /// The returned record carries the new `updated_at`.
    async fn update_tenant(&self, tenant: &Tenant) -> StorageResult<Tenant>;

    /// Stores a new site. The owning tenant must exist.
    async fn create_site(&self, site: Site) -> StorageResult<Site>;

    /// Looks up a site by ID.
    async fn find_site(&self, id: &SiteId) -> StorageResult<Option<Site>>;

    /// Lists the sites owned by a tenant.
    async fn sites_for_tenant(&self, tenant_id: &TenantId) -> StorageResult<Vec<Site>>;

    /// Replaces a stored site's mutable attributes.
    ///
    /// A site can never move to a different tenant.
    async fn update_site(&self, site: &Site) -> StorageResult<Site>;

    /// Writes one tenant setting and persists the whole document.
    ///
    /// On failure `tenant` is left unchanged and the error is returned.
    async fn set_tenant_setting(
        &self,
        tenant: &mut Tenant,
        path: &str,
        value: Value,
    ) -> StorageResult<()> {
        let mut candidate = tenant.clone();
        candidate.settings = tenant.settings.with_value(path, value)?;
        *tenant = self.update_tenant(&candidate).await?;
        Ok(())
    }

    /// Writes one site setting and persists the whole document.
    ///
    /// On failure `site` is left unchanged and the error is returned.
    async fn set_site_setting(&self, site: &mut Site, path: &str, value: Value) -> StorageResult<()> {
        let mut candidate = site.clone();
        candidate.settings = site.settings.with_value(path, value)?;
        *site = self.update_site(&candidate).await?;
        Ok(())
    }
}

//! In-memory tenant registry.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::core::TenantRegistry;
use crate::error::{ResourceError, StorageResult, TenantError};
use crate::tenant::{Site, SiteId, Tenant, TenantId};

#[derive(Debug, Default)]
struct RegistryState {
    tenants: BTreeMap<TenantId, Tenant>,
    sites: BTreeMap<SiteId, Site>,
}

impl RegistryState {
    /// Checks slug, hostname and root uniqueness against every tenant but `tenant` itself.
    fn check_unique(&self, tenant: &Tenant) -> Result<(), ResourceError> {
        for other in self.tenants.values().filter(|t| t.id != tenant.id) {
            if other.slug == tenant.slug {
                return Err(ResourceError::already_exists("tenant", &tenant.slug));
            }
            if other.hostname == tenant.hostname {
                return Err(ResourceError::already_exists("tenant", &tenant.hostname));
            }
            if other.root && tenant.root {
                return Err(ResourceError::already_exists("root tenant", &other.slug));
            }
        }
        Ok(())
    }
}

/// A [`TenantRegistry`] held in process memory.
///
/// Useful for tests and single-process deployments seeded at startup.
#[derive(Debug, Default)]
pub struct MemoryTenantRegistry {
    state: RwLock<RegistryState>,
}

impl MemoryTenantRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantRegistry for MemoryTenantRegistry {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_hostname(&self, hostname: &str) -> StorageResult<Option<Tenant>> {
        let hostname = hostname.to_lowercase();
        let state = self.state.read();
        Ok(state
            .tenants
            .values()
            .find(|t| t.hostname == hostname)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Tenant>> {
        let slug = slug.to_lowercase();
        let state = self.state.read();
        Ok(state.tenants.values().find(|t| t.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: &TenantId) -> StorageResult<Option<Tenant>> {
        Ok(self.state.read().tenants.get(id).cloned())
    }

    async fn root_tenant(&self) -> StorageResult<Option<Tenant>> {
        let state = self.state.read();
        Ok(state.tenants.values().find(|t| t.root).cloned())
    }

    async fn list_tenants(&self) -> StorageResult<Vec<Tenant>> {
        let mut tenants: Vec<Tenant> = self.state.read().tenants.values().cloned().collect();
        tenants.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(tenants)
    }

    async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant> {
        tenant.validate()?;
        let mut state = self.state.write();
        if state.tenants.contains_key(&tenant.id) {
            return Err(ResourceError::already_exists("tenant", tenant.id.as_str()).into());
        }
        state.check_unique(&tenant)?;
        state.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant(&self, tenant: &Tenant) -> StorageResult<Tenant> {
        tenant.validate()?;
        let mut state = self.state.write();
        let created_at = state
            .tenants
            .get(&tenant.id)
            .map(|t| t.created_at)
            .ok_or_else(|| ResourceError::not_found("tenant", tenant.id.as_str()))?;
        state.check_unique(tenant)?;

        let mut stored = tenant.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        state.tenants.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn create_site(&self, site: Site) -> StorageResult<Site> {
        site.validate()?;
        let mut state = self.state.write();
        if !state.tenants.contains_key(&site.tenant_id) {
            return Err(ResourceError::not_found("tenant", site.tenant_id.as_str()).into());
        }
        if state.sites.contains_key(&site.id) {
            return Err(ResourceError::already_exists("site", site.id.as_str()).into());
        }
        state.sites.insert(site.id.clone(), site.clone());
        Ok(site)
    }

    async fn find_site(&self, id: &SiteId) -> StorageResult<Option<Site>> {
        Ok(self.state.read().sites.get(id).cloned())
    }

    async fn sites_for_tenant(&self, tenant_id: &TenantId) -> StorageResult<Vec<Site>> {
        let state = self.state.read();
        Ok(state
            .sites
            .values()
            .filter(|s| &s.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn update_site(&self, site: &Site) -> StorageResult<Site> {
        site.validate()?;
        let mut state = self.state.write();
        let existing = state
            .sites
            .get(&site.id)
            .ok_or_else(|| ResourceError::not_found("site", site.id.as_str()))?;
        if existing.tenant_id != site.tenant_id {
            return Err(TenantError::OwnerChanged {
                kind: "site",
                record_id: site.id.to_string(),
            }
            .into());
        }

        let mut stored = site.clone();
        stored.created_at = existing.created_at;
        stored.updated_at = Utc::now();
        state.sites.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }
}

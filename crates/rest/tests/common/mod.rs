//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::http::{HeaderValue, header};
use axum_test::{TestResponse, TestServer};
use canopy_persistence::backends::memory::MemoryTenantRegistry;
use canopy_persistence::core::TenantRegistry;
use canopy_persistence::error::{BackendError, StorageError, StorageResult};
use canopy_persistence::tenant::{Site, SiteId, Tenant, TenantId, TenantStatus};
use canopy_rest::{Environment, ServerConfig, create_app_with_config};

/// Registry wrapper whose lookups can be switched to fail.
#[derive(Clone, Default)]
pub struct FaultyRegistry {
    inner: Arc<MemoryTenantRegistry>,
    faults: Arc<Faults>,
}

#[derive(Default)]
struct Faults {
    /// Hostname lookups fail with a connection-level error.
    unavailable: AtomicBool,
    /// Hostname lookups fail with a query error.
    query: AtomicBool,
    /// Root and slug lookups fail as well.
    root_down: AtomicBool,
}

impl FaultyRegistry {
    pub fn inner(&self) -> &MemoryTenantRegistry {
        &self.inner
    }

    pub fn set_unavailable(&self, on: bool) {
        self.faults.unavailable.store(on, Ordering::SeqCst);
    }

    pub fn set_query_failing(&self, on: bool) {
        self.faults.query.store(on, Ordering::SeqCst);
    }

    pub fn set_root_down(&self, on: bool) {
        self.faults.root_down.store(on, Ordering::SeqCst);
    }

    fn unavailable() -> StorageError {
        BackendError::Unavailable {
            backend_name: "faulty".to_string(),
            message: "database is locked".to_string(),
        }
        .into()
    }

    fn check_hostname(&self) -> StorageResult<()> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        if self.faults.query.load(Ordering::SeqCst) {
            return Err(BackendError::QueryError {
                message: "no such column: hostname".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn check_root(&self) -> StorageResult<()> {
        if self.faults.root_down.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl TenantRegistry for FaultyRegistry {
    fn backend_name(&self) -> &'static str {
        "faulty"
    }

    async fn find_by_hostname(&self, hostname: &str) -> StorageResult<Option<Tenant>> {
        self.check_hostname()?;
        self.inner.find_by_hostname(hostname).await
    }

    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Tenant>> {
        self.check_root()?;
        self.inner.find_by_slug(slug).await
    }

    async fn find_by_id(&self, id: &TenantId) -> StorageResult<Option<Tenant>> {
        self.inner.find_by_id(id).await
    }

    async fn root_tenant(&self) -> StorageResult<Option<Tenant>> {
        self.check_root()?;
        self.inner.root_tenant().await
    }

    async fn list_tenants(&self) -> StorageResult<Vec<Tenant>> {
        self.inner.list_tenants().await
    }

    async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant> {
        self.inner.create_tenant(tenant).await
    }

    async fn update_tenant(&self, tenant: &Tenant) -> StorageResult<Tenant> {
        self.inner.update_tenant(tenant).await
    }

    async fn create_site(&self, site: Site) -> StorageResult<Site> {
        self.inner.create_site(site).await
    }

    async fn find_site(&self, id: &SiteId) -> StorageResult<Option<Site>> {
        self.inner.find_site(id).await
    }

    async fn sites_for_tenant(&self, tenant_id: &TenantId) -> StorageResult<Vec<Site>> {
        self.inner.sites_for_tenant(tenant_id).await
    }

    async fn update_site(&self, site: &Site) -> StorageResult<Site> {
        self.inner.update_site(site).await
    }
}

/// Creates a registry holding a root tenant and one tenant per status.
pub async fn seeded_registry() -> FaultyRegistry {
    let registry = FaultyRegistry::default();
    for tenant in [
        Tenant::root("canopy.example", "Canopy"),
        Tenant::new("acme", "acme.example", "Acme"),
        Tenant::new("private", "private.example", "Private")
            .with_status(TenantStatus::PrivateAccess),
        Tenant::new("gone", "gone.example", "Gone").with_status(TenantStatus::Disabled),
    ] {
        registry.inner().create_tenant(tenant).await.unwrap();
    }
    registry
}

/// Builds a test server over `registry` in the given mode.
pub fn server(registry: FaultyRegistry, environment: Environment) -> TestServer {
    let config = ServerConfig {
        environment,
        ..ServerConfig::for_testing()
    };
    TestServer::new(create_app_with_config(registry, config)).unwrap()
}

/// Issues `GET path` with the given `Host` header.
pub async fn get(server: &TestServer, host: &'static str, path: &str) -> TestResponse {
    server
        .get(path)
        .add_header(header::HOST, HeaderValue::from_static(host))
        .await
}

/// Returns the slug reported by `GET /tenant`.
pub async fn tenant_slug(server: &TestServer, host: &'static str) -> String {
    let response = get(server, host, "/tenant").await;
    response.assert_status_ok();
    response.json::<serde_json::Value>()["slug"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Asserts the fixed tenant-not-found page.
pub fn assert_tenant_not_found(response: &TestResponse) {
    response.assert_status_not_found();
    assert_eq!(response.text(), "Tenant not found");
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
}

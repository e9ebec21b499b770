//! Hostname-based tenant resolution.
//!
//! Provides the [`TenantResolver`], which maps an inbound host to a tenant
//! according to the deployment [`Environment`].

use std::sync::Arc;

use canopy_persistence::core::TenantRegistry;
use canopy_persistence::error::{ResourceError, StorageError};
use canopy_persistence::tenant::Tenant;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::Environment;

use super::host::{first_label, is_loopback, normalize_host};

/// Successful outcome of [`TenantResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The path is exempt from resolution; nothing is bound.
    Bypassed,
    /// The host resolved to this tenant.
    Bound(Tenant),
}

/// Why a host did not resolve to a tenant.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No tenant matches the host.
    #[error("no tenant for host {host}")]
    NotFound {
        /// The normalized host.
        host: String,
    },

    /// The matching tenant is disabled.
    #[error("tenant {slug} for host {host} is disabled")]
    Disabled {
        /// The normalized host.
        host: String,
        /// Slug of the disabled tenant.
        slug: String,
    },

    /// The registry failed in an unexpected way.
    #[error("tenant resolution for host {host} failed: {source}")]
    InternalFault {
        /// The normalized host.
        host: String,
        /// The underlying registry error.
        #[source]
        source: StorageError,
    },
}

impl ResolutionError {
    /// Returns `true` for outcomes that reject the request.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ResolutionError::NotFound { .. } | ResolutionError::Disabled { .. }
        )
    }
}

/// Resolves request hosts to tenants.
///
/// | Mode | `*localhost*` or loopback host | other host |
/// |------|--------------------|------------|
/// | test | localhost rule | non-strict lookup |
/// | development | localhost rule | default rule |
/// | production | default rule | default rule |
///
/// The localhost rule never rejects: loopback aliases and unknown slugs
/// resolve to the root tenant. The default rule rejects unknown hosts and
/// disabled tenants.
pub struct TenantResolver<R> {
    registry: Arc<R>,
    liveness_path: String,
    root_slug: String,
    root: RwLock<Option<Tenant>>,
}

impl<R> std::fmt::Debug for TenantResolver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantResolver")
            .field("liveness_path", &self.liveness_path)
            .field("root_slug", &self.root_slug)
            .finish_non_exhaustive()
    }
}

impl<R: TenantRegistry> TenantResolver<R> {
    /// Creates a resolver over `registry`.
    pub fn new(
        registry: Arc<R>,
        liveness_path: impl Into<String>,
        root_slug: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            liveness_path: liveness_path.into(),
            root_slug: root_slug.into(),
            root: RwLock::new(None),
        }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolves `host` for a request to `path`.
    pub async fn resolve(
        &self,
        host: &str,
        environment: Environment,
        path: &str,
    ) -> Result<Resolution, ResolutionError> {
        if path == self.liveness_path {
            return Ok(Resolution::Bypassed);
        }

        let host = normalize_host(host);
        let local = host.contains("localhost") || is_loopback(&host);
        let tenant = match environment {
            Environment::Test | Environment::Development if local => {
                self.localhost_rule(&host).await?
            }
            Environment::Test => self.lenient_rule(&host).await?,
            Environment::Development | Environment::Production => {
                self.default_rule(&host).await?
            }
        };
        Ok(Resolution::Bound(tenant))
    }

    /// Loads the root tenant and refreshes the cached copy.
    pub async fn load_root(&self) -> Result<Tenant, StorageError> {
        let root = match self.registry.root_tenant().await? {
            Some(root) => root,
            None => self
                .registry
                .find_by_slug(&self.root_slug)
                .await?
                .ok_or_else(|| ResourceError::NotFound {
                    kind: "root tenant".to_string(),
                    key: self.root_slug.clone(),
                })?,
        };
        *self.root.write().await = Some(root.clone());
        Ok(root)
    }

    /// Returns the root tenant for degraded operation.
    ///
    /// Prefers the cached copy so that a failing registry can still be
    /// served as the root tenant. Loads it when nothing is cached yet.
    pub async fn fallback_root(&self) -> Result<Tenant, StorageError> {
        if let Some(root) = self.root.read().await.clone() {
            return Ok(root);
        }
        self.load_root().await
    }

    async fn localhost_rule(&self, host: &str) -> Result<Tenant, ResolutionError> {
        if !is_loopback(host) {
            let slug = first_label(host);
            match self.registry.find_by_slug(slug).await {
                Ok(Some(tenant)) => return Ok(tenant),
                Ok(None) => debug!(host, slug, "No tenant for local slug; using root tenant"),
                Err(source) => return Err(internal(host, source)),
            }
        }
        self.load_root().await.map_err(|source| internal(host, source))
    }

    async fn lenient_rule(&self, host: &str) -> Result<Tenant, ResolutionError> {
        match self.registry.find_by_hostname(host).await {
            Ok(Some(tenant)) => enabled(host, tenant),
            Ok(None) => Err(ResolutionError::NotFound {
                host: host.to_string(),
            }),
            Err(source) => Err(internal(host, source)),
        }
    }

    async fn default_rule(&self, host: &str) -> Result<Tenant, ResolutionError> {
        match self.registry.find_by_hostname_strict(host).await {
            Ok(tenant) => enabled(host, tenant),
            Err(e) if e.is_not_found() => Err(ResolutionError::NotFound {
                host: host.to_string(),
            }),
            Err(e) if e.is_lookup_fault() => {
                warn!(host, error = %e, "Tenant lookup failed; treating host as unknown");
                Err(ResolutionError::NotFound {
                    host: host.to_string(),
                })
            }
            Err(source) => Err(internal(host, source)),
        }
    }
}

fn enabled(host: &str, tenant: Tenant) -> Result<Tenant, ResolutionError> {
    if tenant.is_disabled() {
        return Err(ResolutionError::Disabled {
            host: host.to_string(),
            slug: tenant.slug,
        });
    }
    Ok(tenant)
}

fn internal(host: &str, source: StorageError) -> ResolutionError {
    ResolutionError::InternalFault {
        host: host.to_string(),
        source,
    }
}

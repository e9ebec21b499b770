//! Application state.
//!
//! This module defines the shared application state that is available to all
//! request handlers and middleware: the tenant registry, the resolver built
//! over it, and the server configuration.

use std::sync::Arc;

use canopy_persistence::core::TenantRegistry;

use crate::config::{Environment, ServerConfig};
use crate::tenant::TenantResolver;

/// Shared application state.
///
/// # Type Parameters
///
/// * `R` - The registry backend type (must implement [`TenantRegistry`])
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use canopy_persistence::backends::memory::MemoryTenantRegistry;
/// use canopy_rest::{AppState, ServerConfig};
///
/// let state = AppState::new(Arc::new(MemoryTenantRegistry::new()), ServerConfig::default());
/// assert_eq!(state.liveness_path(), "/up");
/// ```
pub struct AppState<R> {
    /// The tenant registry.
    registry: Arc<R>,

    /// Resolver shared by every request.
    resolver: Arc<TenantResolver<R>>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since R is wrapped in Arc and doesn't need to be Clone
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            resolver: Arc::clone(&self.resolver),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R: TenantRegistry> AppState<R> {
    /// Creates a new AppState with the given registry and configuration.
    pub fn new(registry: Arc<R>, config: ServerConfig) -> Self {
        let resolver = TenantResolver::new(
            Arc::clone(&registry),
            config.liveness_path.clone(),
            config.root_tenant_slug.clone(),
        );
        Self {
            registry,
            resolver: Arc::new(resolver),
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the tenant resolver.
    pub fn resolver(&self) -> &TenantResolver<R> {
        &self.resolver
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the deployment mode.
    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    /// Returns the path served without tenant resolution.
    pub fn liveness_path(&self) -> &str {
        &self.config.liveness_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_persistence::backends::memory::MemoryTenantRegistry;

    #[test]
    fn test_app_state_config_access() {
        let config = ServerConfig {
            environment: Environment::Development,
            liveness_path: "/healthz".to_string(),
            ..Default::default()
        };
        let state = AppState::new(Arc::new(MemoryTenantRegistry::new()), config);

        assert_eq!(state.registry().backend_name(), "memory");
        assert_eq!(state.environment(), Environment::Development);
        assert_eq!(state.liveness_path(), "/healthz");
    }

    #[test]
    fn test_app_state_clone_shares_resolver() {
        let state = AppState::new(
            Arc::new(MemoryTenantRegistry::new()),
            ServerConfig::default(),
        );
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.resolver, &cloned.resolver));
        assert!(Arc::ptr_eq(&state.registry, &cloned.registry));
    }
}

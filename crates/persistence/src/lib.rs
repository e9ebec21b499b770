//! Canopy Persistence Layer
//!
//! This crate provides the tenant and site registry for a multi-tenant web
//! platform, together with the request context and the default scoping
//! applied to every tenant- or site-owned record.
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant and site models, IDs, and the per-unit-of-work [`RequestContext`](tenant::RequestContext)
//! - [`settings`] - Nested JSON settings documents with dot-path access
//! - [`core`] - The [`TenantRegistry`](core::TenantRegistry) and [`RecordStore`](core::RecordStore) traits
//! - [`scope`] - Scoped repositories that filter by the bound tenant or site
//! - [`backends`] - In-memory and SQLite implementations
//! - [`error`] - Error types for all operations
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite registry with in-memory and file modes
//!
//! # Quick Start
//!
//! ```
//! use canopy_persistence::backends::memory::MemoryTenantRegistry;
//! use canopy_persistence::core::TenantRegistry;
//! use canopy_persistence::settings::HasSettings;
//! use canopy_persistence::tenant::{RequestContext, Tenant};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let registry = MemoryTenantRegistry::new();
//! let mut acme = registry
//!     .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
//!     .await
//!     .unwrap();
//!
//! registry
//!     .set_tenant_setting(&mut acme, "theme.color", json!("green"))
//!     .await
//!     .unwrap();
//! assert_eq!(acme.setting("theme.color", "blue"), json!("green"));
//!
//! RequestContext::with_tenant(acme, async {
//!     assert_eq!(RequestContext::tenant().unwrap().slug, "acme");
//! })
//! .await;
//! assert!(!RequestContext::is_active());
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod scope;
pub mod settings;
pub mod tenant;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use settings::{HasSettings, SettingsDocument};
pub use tenant::{RequestContext, Site, SiteId, Tenant, TenantId, TenantStatus};

// Re-export core traits
pub use core::{OwnerFilter, RecordStore, TenantRegistry};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

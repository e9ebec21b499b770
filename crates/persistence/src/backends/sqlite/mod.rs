//! SQLite tenant registry.
//!
//! Supports in-memory databases (for tests) and file databases (for
//! development and small deployments).
//!
//! # Example
//!
//! ```no_run
//! use canopy_persistence::backends::sqlite::SqliteRegistry;
//! use canopy_persistence::core::TenantRegistry;
//! use canopy_persistence::tenant::Tenant;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SqliteRegistry::open("./data/tenants.db")?;
//! registry
//!     .create_tenant(Tenant::root("canopy.example", "Canopy"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tenants (
//!     id TEXT PRIMARY KEY,
//!     slug TEXT NOT NULL UNIQUE,
//!     hostname TEXT NOT NULL UNIQUE,
//!     title TEXT NOT NULL,
//!     description TEXT,
//!     status TEXT NOT NULL,
//!     settings TEXT NOT NULL,   -- JSON object
//!     is_root INTEGER NOT NULL, -- at most one row with 1
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//!
//! CREATE TABLE sites (
//!     id TEXT PRIMARY KEY,
//!     tenant_id TEXT NOT NULL REFERENCES tenants(id),
//!     primary_hostname TEXT NOT NULL,
//!     settings TEXT NOT NULL,
//!     created_at TEXT NOT NULL,
//!     updated_at TEXT NOT NULL
//! );
//! ```

mod backend;
mod registry;
mod schema;

pub use backend::{SqliteRegistry, SqliteRegistryConfig};
pub use schema::SCHEMA_VERSION;

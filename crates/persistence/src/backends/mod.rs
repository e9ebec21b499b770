//! Storage backend implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | always | Process-local registry and record stores, for tests and seeding |
//! | SQLite | `sqlite` | Embedded tenant registry, in-memory or file based |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use canopy_persistence::backends::sqlite::SqliteRegistry;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory database
//! let registry = SqliteRegistry::in_memory()?;
//!
//! // Or a file database
//! let registry = SqliteRegistry::open("./data/tenants.db")?;
//! # Ok(())
//! # }
//! ```

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

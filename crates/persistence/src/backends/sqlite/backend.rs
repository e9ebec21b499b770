//! SQLite connection pool and configuration.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BackendError, StorageError, StorageResult};

use super::schema;

pub(super) const BACKEND_NAME: &str = "sqlite";

/// SQLite-backed tenant registry.
pub struct SqliteRegistry {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteRegistryConfig,
    is_memory: bool,
}

impl Debug for SqliteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRegistry")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteRegistryConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enable WAL mode for file databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,
}

fn default_max_connections() -> u32 {
    8
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteRegistryConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
        }
    }
}

impl SqliteRegistry {
    /// Creates a registry over a private in-memory database.
    ///
    /// The schema is initialized.
    pub fn in_memory() -> StorageResult<Self> {
        // Pooled connections share one named in-memory database.
        let uri = format!("file:canopy-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
        let manager = SqliteConnectionManager::file(uri)
            .with_flags(OpenFlags::default() | OpenFlags::SQLITE_OPEN_URI);
        let registry = Self::build(manager, SqliteRegistryConfig::default(), true)?;
        registry.init_schema()?;
        Ok(registry)
    }

    /// Opens or creates a file database and initializes the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteRegistryConfig::default())
    }

    /// Opens a file database with custom configuration.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteRegistryConfig,
    ) -> StorageResult<Self> {
        debug!(path = %path.as_ref().display(), "Opening SQLite registry");
        let manager = SqliteConnectionManager::file(path.as_ref());
        let registry = Self::build(manager, config, false)?;
        registry.init_schema()?;
        Ok(registry)
    }

    fn build(
        manager: SqliteConnectionManager,
        config: SqliteRegistryConfig,
        is_memory: bool,
    ) -> StorageResult<Self> {
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let wal = config.enable_wal && !is_memory;
        let manager = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            if wal {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            Ok(())
        });

        let mut builder = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms));
        if is_memory {
            // The database lives only while a connection is open.
            builder = builder
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = builder
            .build(manager)
            .map_err(|e| connection_failed(e.to_string()))?;

        Ok(Self {
            pool,
            config,
            is_memory,
        })
    }

    /// Creates or migrates the schema. Idempotent.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn)
    }

    /// Gets a connection from the pool.
    pub(crate) fn get_connection(
        &self,
    ) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| connection_failed(e.to_string()))
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &SqliteRegistryConfig {
        &self.config
    }
}

fn connection_failed(message: String) -> StorageError {
    StorageError::Backend(BackendError::ConnectionFailed {
        backend_name: BACKEND_NAME.to_string(),
        message,
    })
}

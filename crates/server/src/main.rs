//! Canopy server
//!
//! Serves a multi-tenant web application, resolving each request's tenant
//! from its hostname.

use canopy_persistence::core::TenantRegistry;
use canopy_persistence::tenant::Tenant;
use canopy_rest::{ServerConfig, create_app_with_config, init_logging};
use clap::Parser;
use tracing::{info, warn};

#[cfg(feature = "sqlite")]
use canopy_persistence::backends::sqlite::SqliteRegistry;

/// Opens the SQLite registry named by the server configuration.
#[cfg(feature = "sqlite")]
fn open_sqlite_registry(config: &ServerConfig) -> anyhow::Result<SqliteRegistry> {
    let db_path = config.database_path();
    info!(database = %db_path, "Opening SQLite registry");

    let registry = if db_path == ":memory:" {
        SqliteRegistry::in_memory()?
    } else {
        SqliteRegistry::open(db_path)?
    };
    Ok(registry)
}

/// Creates the root tenant when a root hostname is configured and the
/// registry has no root yet.
async fn ensure_root_tenant<R: TenantRegistry>(
    registry: &R,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let Some(hostname) = &config.root_hostname else {
        return Ok(());
    };
    if registry.root_tenant().await?.is_some() {
        return Ok(());
    }
    if registry.find_by_slug(&config.root_tenant_slug).await?.is_some() {
        warn!(
            slug = %config.root_tenant_slug,
            "A tenant with the root slug exists but is not flagged as root; leaving it alone"
        );
        return Ok(());
    }

    let root = Tenant::new(config.root_tenant_slug.as_str(), hostname.as_str(), "Root").as_root();
    let root = registry.create_tenant(root).await?;
    info!(slug = %root.slug, hostname = %root.hostname, "Created root tenant");
    Ok(())
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        environment = %config.environment,
        liveness_path = %config.liveness_path,
        "Starting Canopy"
    );

    start(config).await
}

/// Starts the server over the SQLite registry.
#[cfg(feature = "sqlite")]
async fn start(config: ServerConfig) -> anyhow::Result<()> {
    let registry = open_sqlite_registry(&config)?;
    ensure_root_tenant(&registry, &config).await?;
    let app = create_app_with_config(registry, config.clone());
    serve(app, &config).await
}

/// Starts the server over an in-memory registry when no database backend
/// is compiled in.
#[cfg(not(feature = "sqlite"))]
async fn start(config: ServerConfig) -> anyhow::Result<()> {
    use canopy_persistence::backends::memory::MemoryTenantRegistry;

    warn!("Built without the 'sqlite' feature; tenants are kept in memory only");
    let registry = MemoryTenantRegistry::new();
    ensure_root_tenant(&registry, &config).await?;
    let app = create_app_with_config(registry, config.clone());
    serve(app, &config).await
}

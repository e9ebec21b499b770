//! Server configuration.
//!
//! This module provides configuration types for the server, supporting both
//! programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CANOPY_SERVER_PORT` | 8080 | Server port |
//! | `CANOPY_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `CANOPY_LOG_LEVEL` | info | Log level |
//! | `CANOPY_ENV` | production | Deployment mode (`test`, `development`, anything else is standard) |
//! | `CANOPY_LIVENESS_PATH` | /up | Path served without tenant resolution |
//! | `CANOPY_ROOT_TENANT_SLUG` | root | Slug of the fallback tenant |
//! | `CANOPY_ROOT_HOSTNAME` | | Hostname used to create the root tenant on startup if missing |
//! | `CANOPY_DATABASE_URL` | canopy.db | SQLite path, `:memory:` allowed |
//! | `CANOPY_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `CANOPY_ENABLE_CORS` | false | Enable CORS |
//! | `CANOPY_CORS_ORIGINS` | * | Allowed origins |
//!
//! # Example
//!
//! ```rust
//! use canopy_rest::{Environment, ServerConfig};
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     environment: Environment::Development,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use clap::Parser;

/// Paths routed to application handlers.
const RESERVED_PATHS: &[&str] = &["/", "/tenant", "/site"];

/// Deployment mode. Changes how hostnames are resolved to tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Test mode: `*localhost*` and loopback hosts use the localhost rule,
    /// other hosts a non-strict hostname lookup.
    Test,
    /// Development mode: `*localhost*` and loopback hosts use the localhost
    /// rule, other hosts the default rule.
    Development,
    /// Standard mode: every host uses the default rule.
    #[default]
    Production,
}

impl Environment {
    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    /// Unrecognized names select the standard mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "test" => Environment::Test,
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        })
    }
}

/// Server configuration.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "canopy")]
#[command(about = "Multi-tenant web platform server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "CANOPY_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "CANOPY_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "CANOPY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Deployment mode (test, development, production).
    #[arg(long = "env", env = "CANOPY_ENV", default_value = "production")]
    pub environment: Environment,

    /// Path answered without resolving a tenant.
    #[arg(long, env = "CANOPY_LIVENESS_PATH", default_value = "/up")]
    pub liveness_path: String,

    /// Slug of the root tenant, used when the registry has no root flag set.
    #[arg(long, env = "CANOPY_ROOT_TENANT_SLUG", default_value = "root")]
    pub root_tenant_slug: String,

    /// Hostname for the root tenant created at startup when none exists.
    #[arg(long, env = "CANOPY_ROOT_HOSTNAME")]
    pub root_hostname: Option<String>,

    /// Database path.
    #[arg(long, env = "CANOPY_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "CANOPY_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "CANOPY_ENABLE_CORS", default_value = "false")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "CANOPY_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            environment: Environment::Production,
            liveness_path: "/up".to_string(),
            root_tenant_slug: "root".to_string(),
            root_hostname: None,
            database_url: None,
            request_timeout: 30,
            enable_cors: false,
            cors_origins: "*".to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// Falls back to defaults if the environment cannot be parsed.
    pub fn from_env() -> Self {
        Self::try_parse_from(["canopy"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the database path, defaulting to `canopy.db`.
    pub fn database_path(&self) -> &str {
        self.database_url.as_deref().unwrap_or("canopy.db")
    }

    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push("Host cannot be empty".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if !self.liveness_path.starts_with('/') {
            errors.push(format!(
                "Liveness path '{}' must start with '/'",
                self.liveness_path
            ));
        } else if RESERVED_PATHS.contains(&self.liveness_path.as_str()) {
            errors.push(format!(
                "Liveness path '{}' collides with an application route",
                self.liveness_path
            ));
        }

        let slug = &self.root_tenant_slug;
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            errors.push(format!("Root tenant slug '{}' is not a valid slug", slug));
        }

        if let Some(hostname) = &self.root_hostname
            && (hostname.is_empty() || hostname.contains(':') || hostname.contains('/'))
        {
            errors.push(format!("Root hostname '{}' must be a bare hostname", hostname));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses test mode, an ephemeral port and an in-memory database.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            log_level: "debug".to_string(),
            environment: Environment::Test,
            database_url: Some(":memory:".to_string()),
            request_timeout: 5,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.liveness_path, "/up");
        assert_eq!(config.database_path(), "canopy.db");
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            port: 3000,
            host: "0.0.0.0".to_string(),
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert_eq!(
            "Development".parse::<Environment>().unwrap(),
            Environment::Development
        );
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn test_parse_from_args() {
        let config = ServerConfig::try_parse_from([
            "canopy",
            "--env",
            "development",
            "--liveness-path",
            "/healthz",
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.liveness_path, "/healthz");
    }

    #[test]
    fn test_validate_valid() {
        assert!(ServerConfig::default().validate().is_ok());
        assert!(ServerConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = ServerConfig {
            request_timeout: 0,
            liveness_path: "up".to_string(),
            root_tenant_slug: "Root Tenant".to_string(),
            root_hostname: Some("root.example:8080".to_string()),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("timeout")));
        assert!(errors.iter().any(|e| e.contains("Liveness")));
    }

    #[test]
    fn test_validate_rejects_reserved_liveness_path() {
        let config = ServerConfig {
            liveness_path: "/tenant".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_for_testing() {
        let config = ServerConfig::for_testing();
        assert_eq!(config.port, 0);
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.database_path(), ":memory:");
    }
}

//! Tenant and site records.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::id::{ROOT_TENANT_SLUG, SiteId, TenantId};
use crate::error::ValidationError;
use crate::settings::{HasSettings, SettingsDocument};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("valid slug regex"));

/// Lifecycle status of a tenant.
///
/// Tenants are never physically deleted while data references them; they
/// are disabled instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Publicly reachable.
    #[default]
    Enabled,
    /// Unreachable; resolution treats the tenant as missing.
    Disabled,
    /// Reachable, but a later stage requires the visitor to log in.
    PrivateAccess,
}

impl TenantStatus {
    /// Returns the status as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Enabled => "enabled",
            TenantStatus::Disabled => "disabled",
            TenantStatus::PrivateAccess => "private_access",
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(TenantStatus::Enabled),
            "disabled" => Ok(TenantStatus::Disabled),
            "private_access" => Ok(TenantStatus::PrivateAccess),
            other => Err(ValidationError::invalid(
                "status",
                format!("unknown tenant status '{}'", other),
            )),
        }
    }
}

/// A top-level isolated organization, resolved from the request hostname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Generated identifier.
    pub id: TenantId,
    /// Unique, lower-case slug.
    pub slug: String,
    /// Unique, lower-case hostname used for request resolution.
    pub hostname: String,
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// Tenant-level settings.
    #[serde(default)]
    pub settings: SettingsDocument,
    /// Marks the single root tenant.
    pub root: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates an enabled tenant with a generated ID.
    ///
    /// Slug and hostname are normalized to lower case.
    pub fn new(slug: impl Into<String>, hostname: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::generate(),
            slug: slug.into().trim().to_lowercase(),
            hostname: hostname.into().trim().to_lowercase(),
            title: title.into(),
            description: None,
            status: TenantStatus::Enabled,
            settings: SettingsDocument::default(),
            root: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the root tenant for the given hostname.
    pub fn root(hostname: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(ROOT_TENANT_SLUG, hostname, title).as_root()
    }

    /// Marks this tenant as the root tenant.
    pub fn as_root(mut self) -> Self {
        self.root = true;
        self
    }

    /// Sets the lifecycle status.
    pub fn with_status(mut self, status: TenantStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the settings document.
    pub fn with_settings(mut self, settings: impl Into<SettingsDocument>) -> Self {
        self.settings = settings.into();
        self
    }

    /// Returns `true` if the tenant is the root tenant.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Returns `true` if the tenant is disabled.
    pub fn is_disabled(&self) -> bool {
        self.status == TenantStatus::Disabled
    }

    /// Returns `true` if visitors must log in before seeing content.
    pub fn requires_login(&self) -> bool {
        self.status == TenantStatus::PrivateAccess
    }

    /// Validates the record before it is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::missing("id"));
        }
        if !SLUG_PATTERN.is_match(&self.slug) {
            return Err(ValidationError::invalid(
                "slug",
                format!("'{}' must be lower-case alphanumeric with hyphens", self.slug),
            ));
        }
        validate_hostname("hostname", &self.hostname)?;
        if self.title.trim().is_empty() {
            return Err(ValidationError::missing("title"));
        }
        self.settings.validate()
    }
}

impl HasSettings for Tenant {
    fn settings(&self) -> &SettingsDocument {
        &self.settings
    }
}

/// A sub-property owned by exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Generated identifier.
    pub id: SiteId,
    /// Owning tenant. Immutable after creation.
    pub tenant_id: TenantId,
    /// Hostname used for outbound links.
    pub primary_hostname: String,
    /// Site-level settings.
    #[serde(default)]
    pub settings: SettingsDocument,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Site {
    /// Creates a site for the given tenant with a generated ID.
    pub fn new(tenant_id: TenantId, primary_hostname: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SiteId::generate(),
            tenant_id,
            primary_hostname: primary_hostname.into().trim().to_lowercase(),
            settings: SettingsDocument::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the settings document.
    pub fn with_settings(mut self, settings: impl Into<SettingsDocument>) -> Self {
        self.settings = settings.into();
        self
    }

    /// Returns the absolute base URL for links pointing at this site.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.primary_hostname)
    }

    /// Returns an absolute URL for `path` on this site.
    ///
    /// ```
    /// use canopy_persistence::tenant::{Site, TenantId};
    ///
    /// let site = Site::new(TenantId::new("t1"), "news.example.org");
    /// assert_eq!(site.url_for("/posts/1"), "https://news.example.org/posts/1");
    /// assert_eq!(site.url_for("about"), "https://news.example.org/about");
    /// ```
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Validates the record before it is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::missing("id"));
        }
        if self.tenant_id.is_empty() {
            return Err(ValidationError::missing("tenant_id"));
        }
        validate_hostname("primary_hostname", &self.primary_hostname)?;
        self.settings.validate()
    }
}

impl HasSettings for Site {
    fn settings(&self) -> &SettingsDocument {
        &self.settings
    }
}

fn validate_hostname(field: &str, hostname: &str) -> Result<(), ValidationError> {
    if hostname.is_empty() {
        return Err(ValidationError::missing(field));
    }
    if hostname.contains("://") || hostname.contains(':') || hostname.contains('/') {
        return Err(ValidationError::invalid(
            field,
            format!("'{}' must be a bare hostname without scheme, port or path", hostname),
        ));
    }
    if hostname.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid(field, "must not contain whitespace"));
    }
    // Lookups lower-case the request host.
    if hostname.chars().any(char::is_uppercase) {
        return Err(ValidationError::invalid(
            field,
            format!("'{}' must be lower-case", hostname),
        ));
    }
    Ok(())
}

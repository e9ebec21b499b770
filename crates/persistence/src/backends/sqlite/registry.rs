//! TenantRegistry implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use crate::core::TenantRegistry;
use crate::error::{BackendError, ResourceError, StorageError, StorageResult, TenantError};
use crate::settings::SettingsDocument;
use crate::tenant::{Site, SiteId, Tenant, TenantId};

use super::backend::BACKEND_NAME;
use super::SqliteRegistry;

const TENANT_COLUMNS: &str =
    "id, slug, hostname, title, description, status, settings, is_root, created_at, updated_at";

const SITE_COLUMNS: &str = "id, tenant_id, primary_hostname, settings, created_at, updated_at";

/// Lock, I/O and file-level failures make the database unavailable; the
/// rest are statement errors.
fn query_error(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::CannotOpen
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::NotADatabase
                    | ErrorCode::DiskFull
                    | ErrorCode::OutOfMemory
                    | ErrorCode::FileLockingProtocolFailed
            ) =>
        {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })
        }
        _ => StorageError::Backend(BackendError::QueryError {
            message: e.to_string(),
        }),
    }
}

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

/// Maps unique-constraint failures to `AlreadyExists`.
fn write_error(kind: &str, key: &str, e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            ResourceError::already_exists(kind, key).into()
        }
        _ => query_error(e),
    }
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("invalid timestamp '{}': {}", value, e)))
}

fn parse_settings(value: &str) -> StorageResult<SettingsDocument> {
    serde_json::from_str(value)
        .map_err(|e| serialization_error(format!("invalid settings document: {}", e)))
}

fn encode_settings(settings: &SettingsDocument) -> StorageResult<String> {
    serde_json::to_string(settings)
        .map_err(|e| serialization_error(format!("failed to encode settings: {}", e)))
}

struct TenantRow {
    id: String,
    slug: String,
    hostname: String,
    title: String,
    description: Option<String>,
    status: String,
    settings: String,
    is_root: bool,
    created_at: String,
    updated_at: String,
}

impl TenantRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            slug: row.get(1)?,
            hostname: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status: row.get(5)?,
            settings: row.get(6)?,
            is_root: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_tenant(self) -> StorageResult<Tenant> {
        Ok(Tenant {
            id: TenantId::new(self.id),
            slug: self.slug,
            hostname: self.hostname,
            title: self.title,
            description: self.description,
            status: self
                .status
                .parse()
                .map_err(|e| serialization_error(format!("{}", e)))?,
            settings: parse_settings(&self.settings)?,
            root: self.is_root,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct SiteRow {
    id: String,
    tenant_id: String,
    primary_hostname: String,
    settings: String,
    created_at: String,
    updated_at: String,
}

impl SiteRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            primary_hostname: row.get(2)?,
            settings: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_site(self) -> StorageResult<Site> {
        Ok(Site {
            id: SiteId::new(self.id),
            tenant_id: TenantId::new(self.tenant_id),
            primary_hostname: self.primary_hostname,
            settings: parse_settings(&self.settings)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

impl SqliteRegistry {
    fn query_tenant(&self, clause: &str, key: &str) -> StorageResult<Option<Tenant>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {} FROM tenants WHERE {}", TENANT_COLUMNS, clause);
        let row = conn
            .query_row(&sql, params![key], TenantRow::read)
            .optional()
            .map_err(query_error)?;
        row.map(TenantRow::into_tenant).transpose()
    }

    fn query_site(&self, id: &str) -> StorageResult<Option<Site>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS);
        let row = conn
            .query_row(&sql, params![id], SiteRow::read)
            .optional()
            .map_err(query_error)?;
        row.map(SiteRow::into_site).transpose()
    }
}

#[async_trait]
impl TenantRegistry for SqliteRegistry {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn find_by_hostname(&self, hostname: &str) -> StorageResult<Option<Tenant>> {
        self.query_tenant("hostname = ?1", &hostname.to_lowercase())
    }

    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Tenant>> {
        self.query_tenant("slug = ?1", &slug.to_lowercase())
    }

    async fn find_by_id(&self, id: &TenantId) -> StorageResult<Option<Tenant>> {
        self.query_tenant("id = ?1", id.as_str())
    }

    async fn root_tenant(&self) -> StorageResult<Option<Tenant>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {} FROM tenants WHERE is_root = 1", TENANT_COLUMNS);
        let row = conn
            .query_row(&sql, [], TenantRow::read)
            .optional()
            .map_err(query_error)?;
        row.map(TenantRow::into_tenant).transpose()
    }

    async fn list_tenants(&self) -> StorageResult<Vec<Tenant>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {} FROM tenants ORDER BY slug", TENANT_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map([], TenantRow::read)
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        rows.into_iter().map(TenantRow::into_tenant).collect()
    }

    async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant> {
        tenant.validate()?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO tenants
                (id, slug, hostname, title, description, status, settings, is_root, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                tenant.id.as_str(),
                tenant.slug,
                tenant.hostname,
                tenant.title,
                tenant.description,
                tenant.status.as_str(),
                encode_settings(&tenant.settings)?,
                tenant.root,
                tenant.created_at.to_rfc3339(),
                tenant.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| write_error("tenant", &tenant.slug, e))?;
        Ok(tenant)
    }

    async fn update_tenant(&self, tenant: &Tenant) -> StorageResult<Tenant> {
        tenant.validate()?;
        let changed = {
            let conn = self.get_connection()?;
            conn.execute(
                "UPDATE tenants
                 SET slug = ?2, hostname = ?3, title = ?4, description = ?5, status = ?6,
                     settings = ?7, is_root = ?8, updated_at = ?9
                 WHERE id = ?1",
                params![
                    tenant.id.as_str(),
                    tenant.slug,
                    tenant.hostname,
                    tenant.title,
                    tenant.description,
                    tenant.status.as_str(),
                    encode_settings(&tenant.settings)?,
                    tenant.root,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| write_error("tenant", &tenant.slug, e))?
        };
        if changed == 0 {
            return Err(ResourceError::not_found("tenant", tenant.id.as_str()).into());
        }
        self.find_by_id(&tenant.id)
            .await?
            .ok_or_else(|| ResourceError::not_found("tenant", tenant.id.as_str()).into())
    }

    async fn create_site(&self, site: Site) -> StorageResult<Site> {
        site.validate()?;
        if self.find_by_id(&site.tenant_id).await?.is_none() {
            return Err(ResourceError::not_found("tenant", site.tenant_id.as_str()).into());
        }
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO sites (id, tenant_id, primary_hostname, settings, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                site.id.as_str(),
                site.tenant_id.as_str(),
                site.primary_hostname,
                encode_settings(&site.settings)?,
                site.created_at.to_rfc3339(),
                site.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| write_error("site", site.id.as_str(), e))?;
        Ok(site)
    }

    async fn find_site(&self, id: &SiteId) -> StorageResult<Option<Site>> {
        self.query_site(id.as_str())
    }

    async fn sites_for_tenant(&self, tenant_id: &TenantId) -> StorageResult<Vec<Site>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {} FROM sites WHERE tenant_id = ?1 ORDER BY created_at, id",
            SITE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params![tenant_id.as_str()], SiteRow::read)
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        rows.into_iter().map(SiteRow::into_site).collect()
    }

    async fn update_site(&self, site: &Site) -> StorageResult<Site> {
        site.validate()?;
        let existing = self
            .query_site(site.id.as_str())?
            .ok_or_else(|| ResourceError::not_found("site", site.id.as_str()))?;
        if existing.tenant_id != site.tenant_id {
            return Err(TenantError::OwnerChanged {
                kind: "site",
                record_id: site.id.to_string(),
            }
            .into());
        }

        {
            let conn = self.get_connection()?;
            conn.execute(
                "UPDATE sites SET primary_hostname = ?2, settings = ?3, updated_at = ?4 WHERE id = ?1",
                params![
                    site.id.as_str(),
                    site.primary_hostname,
                    encode_settings(&site.settings)?,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| write_error("site", site.id.as_str(), e))?;
        }
        self.query_site(site.id.as_str())?
            .ok_or_else(|| ResourceError::not_found("site", site.id.as_str()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::HasSettings;
    use crate::tenant::TenantStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_tenant_roundtrip() {
        let registry = SqliteRegistry::in_memory().unwrap();
        let acme = Tenant::new("acme", "acme.example", "Acme")
            .with_description("Widgets")
            .with_status(TenantStatus::PrivateAccess)
            .with_settings(json!({ "theme": { "color": "green" } }));
        registry.create_tenant(acme.clone()).await.unwrap();

        let found = registry
            .find_by_hostname("ACME.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, acme.id);
        assert_eq!(found.description.as_deref(), Some("Widgets"));
        assert!(found.requires_login());
        assert_eq!(found.setting("theme.color", "blue"), json!("green"));
        assert!(!found.is_root());
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let registry = SqliteRegistry::in_memory().unwrap();
        registry
            .create_tenant(Tenant::root("canopy.example", "Canopy"))
            .await
            .unwrap();
        registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();

        for dup in [
            Tenant::new("acme", "other.example", "Dup slug"),
            Tenant::new("other", "acme.example", "Dup host"),
            Tenant::new("second", "second.example", "Second root").as_root(),
        ] {
            let err = registry.create_tenant(dup).await.unwrap_err();
            assert!(
                matches!(err, StorageError::Resource(ResourceError::AlreadyExists { .. })),
                "unexpected error: {err}"
            );
        }

        let root = registry.root_tenant().await.unwrap().unwrap();
        assert_eq!(root.slug, "root");
        assert_eq!(registry.list_tenants().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_tenant_is_not_found() {
        let registry = SqliteRegistry::in_memory().unwrap();
        let ghost = Tenant::new("ghost", "ghost.example", "Ghost");
        assert!(registry.update_tenant(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_settings_is_a_lookup_fault() {
        let registry = SqliteRegistry::in_memory().unwrap();
        let acme = Tenant::new("acme", "acme.example", "Acme");
        registry.create_tenant(acme).await.unwrap();
        registry
            .get_connection()
            .unwrap()
            .execute("UPDATE tenants SET settings = 'not json'", [])
            .unwrap();

        let err = registry.find_by_slug("acme").await.unwrap_err();
        assert!(err.is_lookup_fault());
    }

    #[tokio::test]
    async fn test_locked_database_is_unavailable() {
        use crate::backends::sqlite::SqliteRegistryConfig;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canopy.db");
        let config = SqliteRegistryConfig {
            busy_timeout_ms: 50,
            enable_wal: false,
            ..Default::default()
        };
        let registry = SqliteRegistry::with_config(&path, config).unwrap();
        registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();

        let locker = rusqlite::Connection::open(&path).unwrap();
        locker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

        let err = registry.find_by_hostname("acme.example").await.unwrap_err();
        assert!(
            matches!(err, StorageError::Backend(BackendError::Unavailable { .. })),
            "unexpected error: {err}"
        );
        assert!(!err.is_lookup_fault());

        locker.execute_batch("COMMIT;").unwrap();
        assert!(registry.find_by_hostname("acme.example").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_statement_error_is_a_lookup_fault() {
        let registry = SqliteRegistry::in_memory().unwrap();
        let err = registry
            .query_tenant("no_such_column = ?1", "x")
            .unwrap_err();
        assert!(
            matches!(err, StorageError::Backend(BackendError::QueryError { .. })),
            "unexpected error: {err}"
        );
        assert!(err.is_lookup_fault());
    }

    #[tokio::test]
    async fn test_sites_and_settings() {
        let registry = SqliteRegistry::in_memory().unwrap();
        let acme = Tenant::new("acme", "acme.example", "Acme");
        registry.create_tenant(acme.clone()).await.unwrap();

        let mut site = registry
            .create_site(Site::new(acme.id.clone(), "News.Acme.Example"))
            .await
            .unwrap();
        assert_eq!(site.base_url(), "https://news.acme.example");

        registry
            .set_site_setting(&mut site, "comments.enabled", json!(false))
            .await
            .unwrap();
        let sites = registry.sites_for_tenant(&acme.id).await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].setting("comments.enabled", true), json!(false));

        let orphan = registry
            .create_site(Site::new(TenantId::new("missing"), "x.example"))
            .await;
        assert!(orphan.unwrap_err().is_not_found());

        let mut moved = site.clone();
        moved.tenant_id = TenantId::new("other");
        assert!(matches!(
            registry.update_site(&moved).await.unwrap_err(),
            StorageError::Tenant(TenantError::OwnerChanged { .. })
        ));
    }
}

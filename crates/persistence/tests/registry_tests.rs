//! Tenant registry integration tests.
//!
//! Every behavior is checked against both the in-memory and the SQLite
//! registry.

use serde_json::json;

use canopy_persistence::backends::memory::MemoryTenantRegistry;
use canopy_persistence::core::TenantRegistry;
use canopy_persistence::error::{ResourceError, StorageError, ValidationError};
use canopy_persistence::settings::HasSettings;
use canopy_persistence::tenant::{Site, Tenant, TenantStatus};

#[cfg(feature = "sqlite")]
use canopy_persistence::backends::sqlite::SqliteRegistry;

fn registries() -> Vec<Box<dyn TenantRegistry>> {
    let mut registries: Vec<Box<dyn TenantRegistry>> = vec![Box::new(MemoryTenantRegistry::new())];
    #[cfg(feature = "sqlite")]
    registries.push(Box::new(
        SqliteRegistry::in_memory().expect("Failed to create SQLite registry"),
    ));
    registries
}

// ============================================================================
// Lookup Tests
// ============================================================================

#[tokio::test]
async fn test_lookup_by_hostname_slug_and_id() {
    for registry in registries() {
        let acme = registry
            .create_tenant(Tenant::new("Acme", "WWW.Acme.Example", "Acme Corp"))
            .await
            .unwrap();
        assert_eq!(acme.slug, "acme");
        assert_eq!(acme.hostname, "www.acme.example");

        let by_host = registry.find_by_hostname("www.ACME.example").await.unwrap();
        assert_eq!(by_host.as_ref().map(|t| &t.id), Some(&acme.id), "{}", registry.backend_name());

        let by_slug = registry.find_by_slug("ACME").await.unwrap().unwrap();
        assert_eq!(by_slug.id, acme.id);

        let by_id = registry.find_by_id(&acme.id).await.unwrap().unwrap();
        assert_eq!(by_id.title, "Acme Corp");
    }
}

#[tokio::test]
async fn test_unknown_hostname() {
    for registry in registries() {
        assert!(registry.find_by_hostname("nobody.example").await.unwrap().is_none());

        let err = registry
            .find_by_hostname_strict("nobody.example")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.is_lookup_fault());
    }
}

#[tokio::test]
async fn test_root_tenant() {
    for registry in registries() {
        assert!(registry.root_tenant().await.unwrap().is_none());

        registry
            .create_tenant(Tenant::root("canopy.example", "Canopy"))
            .await
            .unwrap();
        registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();

        let root = registry.root_tenant().await.unwrap().unwrap();
        assert!(root.is_root());
        assert_eq!(root.slug, "root");

        let slugs: Vec<String> = registry
            .list_tenants()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.slug)
            .collect();
        assert_eq!(slugs, vec!["acme", "root"]);
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_tenants_are_rejected() {
    for registry in registries() {
        let cases = [
            Tenant::new("-bad", "bad.example", "Bad"),
            Tenant::new("bad slug", "bad.example", "Bad"),
            Tenant::new("bad", "https://bad.example", "Bad"),
            Tenant::new("bad", "bad.example:8080", "Bad"),
            Tenant::new("bad", "bad.example/path", "Bad"),
            Tenant::new("bad", "", "Bad"),
            Tenant::new("bad", "bad.example", "  "),
        ];
        for tenant in cases {
            let err = registry.create_tenant(tenant.clone()).await.unwrap_err();
            assert!(
                matches!(err, StorageError::Validation(_)),
                "{:?} accepted by {}",
                tenant,
                registry.backend_name()
            );
        }
        assert!(registry.list_tenants().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_mixed_case_hostnames_are_rejected() {
    for registry in registries() {
        let acme = registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();

        let mut renamed = acme.clone();
        renamed.hostname = "News.Acme.Example".to_string();
        let err = registry.update_tenant(&renamed).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let mut created = Tenant::new("globex", "globex.example", "Globex");
        created.hostname = "Globex.Example".to_string();
        let err = registry.create_tenant(created).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let mut site = Site::new(acme.id.clone(), "blog.acme.example");
        site.primary_hostname = "Blog.Acme.Example".to_string();
        let err = registry.create_site(site).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        // The stored hostname is untouched and still matches any casing.
        let found = registry
            .find_by_hostname("ACME.Example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, acme.id);
        assert_eq!(found.hostname, "acme.example");
    }
}

#[tokio::test]
async fn test_duplicates_are_rejected() {
    for registry in registries() {
        registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();
        let err = registry
            .create_tenant(Tenant::new("acme", "acme.other", "Acme again"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Resource(ResourceError::AlreadyExists { .. })
        ));
    }
}

// ============================================================================
// Status and Settings Tests
// ============================================================================

#[tokio::test]
async fn test_status_changes_persist() {
    for registry in registries() {
        let acme = registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();
        assert!(!acme.is_disabled());
        assert!(!acme.requires_login());

        let private = registry
            .update_tenant(&acme.clone().with_status(TenantStatus::PrivateAccess))
            .await
            .unwrap();
        assert!(private.requires_login());
        assert!(private.updated_at >= acme.updated_at);

        let disabled = registry
            .update_tenant(&private.with_status(TenantStatus::Disabled))
            .await
            .unwrap();
        assert!(disabled.is_disabled());

        let reloaded = registry.find_by_hostname("acme.example").await.unwrap().unwrap();
        assert_eq!(reloaded.status, TenantStatus::Disabled);
    }
}

#[tokio::test]
async fn test_nested_settings() {
    for registry in registries() {
        let mut acme = registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();

        assert_eq!(acme.setting("a.b.c", 7), json!(7));

        registry
            .set_tenant_setting(&mut acme, "a.b.c", json!(5))
            .await
            .unwrap();
        registry
            .set_tenant_setting(&mut acme, "a.flag", json!(false))
            .await
            .unwrap();

        let reloaded = registry.find_by_id(&acme.id).await.unwrap().unwrap();
        assert_eq!(reloaded.setting("a.b.c", 7), json!(5));
        assert_eq!(reloaded.setting("a.flag", true), json!(false));
        assert_eq!(reloaded.setting("a.b.c.d", "fallback"), json!("fallback"));
        assert_eq!(reloaded.settings, acme.settings);
    }
}

#[tokio::test]
async fn test_oversized_setting_leaves_record_unchanged() {
    for registry in registries() {
        let mut acme = registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();
        let before = acme.clone();

        let err = registry
            .set_tenant_setting(&mut acme, "blob", json!("x".repeat(70 * 1024)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::SettingsTooLarge { .. })
        ));
        assert_eq!(acme, before);
    }
}

// ============================================================================
// Site Tests
// ============================================================================

#[tokio::test]
async fn test_sites_belong_to_one_tenant() {
    for registry in registries() {
        let acme = registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();
        let globex = registry
            .create_tenant(Tenant::new("globex", "globex.example", "Globex"))
            .await
            .unwrap();

        let blog = registry
            .create_site(Site::new(acme.id.clone(), "blog.acme.example"))
            .await
            .unwrap();
        registry
            .create_site(Site::new(acme.id.clone(), "shop.acme.example"))
            .await
            .unwrap();
        registry
            .create_site(Site::new(globex.id.clone(), "globex.example"))
            .await
            .unwrap();

        assert_eq!(registry.sites_for_tenant(&acme.id).await.unwrap().len(), 2);
        assert_eq!(registry.sites_for_tenant(&globex.id).await.unwrap().len(), 1);

        let found = registry.find_site(&blog.id).await.unwrap().unwrap();
        assert_eq!(found.tenant_id, acme.id);
        assert_eq!(found.url_for("/feed.xml"), "https://blog.acme.example/feed.xml");
    }
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tenants.db");

    {
        let registry = SqliteRegistry::open(&path).unwrap();
        let mut acme = registry
            .create_tenant(Tenant::new("acme", "acme.example", "Acme"))
            .await
            .unwrap();
        registry
            .set_tenant_setting(&mut acme, "theme", json!("dark"))
            .await
            .unwrap();
    }

    let registry = SqliteRegistry::open(&path).unwrap();
    let acme = registry.find_by_slug("acme").await.unwrap().unwrap();
    assert_eq!(acme.setting("theme", "light"), json!("dark"));
}

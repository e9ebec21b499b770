//! Owner-filtered record storage.
//!
//! A [`RecordStore`] persists one tenant- or site-owned entity type and
//! applies whatever [`OwnerFilter`] it is handed. It never consults the
//! request context itself; that is the job of the scoping layer in
//! [`crate::scope`], which every repository is composed with.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::scope::Owned;
use crate::tenant::{SiteId, TenantId};

/// Restricts a query to one owner.
///
/// An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerFilter {
    /// Only records owned by this tenant.
    pub tenant: Option<TenantId>,
    /// Only records owned by this site.
    pub site: Option<SiteId>,
}

impl OwnerFilter {
    /// A filter matching records of every owner.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// A filter matching records owned by `tenant`.
    pub fn tenant(tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
            site: None,
        }
    }

    /// A filter matching records owned by `site`.
    pub fn site(site: SiteId) -> Self {
        Self {
            tenant: None,
            site: Some(site),
        }
    }

    /// Returns `true` if the filter matches every record.
    pub fn is_unfiltered(&self) -> bool {
        self.tenant.is_none() && self.site.is_none()
    }

    /// Returns `true` if `record` passes the filter.
    pub fn matches<E: Owned>(&self, record: &E) -> bool {
        let tenant_ok = self
            .tenant
            .as_ref()
            .is_none_or(|t| record.tenant_id() == Some(t));
        let site_ok = self
            .site
            .as_ref()
            .is_none_or(|s| record.site_id() == Some(s));
        tenant_ok && site_ok
    }
}

/// Storage for one owned entity type.
#[async_trait]
pub trait RecordStore<E: Owned>: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(AlreadyExists)` - If the ID is taken
    async fn insert(&self, record: E) -> StorageResult<E>;

    /// Replaces a stored record that passes `filter`.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If no record with this ID passes `filter`
    /// * `StorageError::Tenant(OwnerChanged)` - If the owner differs from the stored one
    async fn update(&self, record: E, filter: &OwnerFilter) -> StorageResult<E>;

    /// Returns every record passing `filter`.
    async fn fetch(&self, filter: &OwnerFilter) -> StorageResult<Vec<E>>;

    /// Returns the record with `id` if it passes `filter`.
    async fn find(&self, id: &str, filter: &OwnerFilter) -> StorageResult<Option<E>>;

    /// Deletes the record with `id` if it passes `filter`.
    ///
    /// Returns `true` if a record was removed.
    async fn delete(&self, id: &str, filter: &OwnerFilter) -> StorageResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Owned;

    #[derive(Clone)]
    struct Note {
        id: String,
        tenant: Option<TenantId>,
        site: Option<SiteId>,
    }

    impl Owned for Note {
        const KIND: &'static str = "note";

        fn record_id(&self) -> &str {
            &self.id
        }

        fn tenant_id(&self) -> Option<&TenantId> {
            self.tenant.as_ref()
        }

        fn site_id(&self) -> Option<&SiteId> {
            self.site.as_ref()
        }
    }

    fn note(tenant: &str, site: &str) -> Note {
        Note {
            id: "n1".to_string(),
            tenant: Some(TenantId::new(tenant)),
            site: Some(SiteId::new(site)),
        }
    }

    #[test]
    fn test_unfiltered_matches_everything() {
        let filter = OwnerFilter::unfiltered();
        assert!(filter.is_unfiltered());
        assert!(filter.matches(&note("t1", "s1")));
        assert!(filter.matches(&Note {
            id: "n2".to_string(),
            tenant: None,
            site: None
        }));
    }

    #[test]
    fn test_tenant_filter() {
        let filter = OwnerFilter::tenant(TenantId::new("t1"));
        assert!(filter.matches(&note("t1", "s1")));
        assert!(!filter.matches(&note("t2", "s1")));
    }

    #[test]
    fn test_site_filter() {
        let filter = OwnerFilter::site(SiteId::new("s1"));
        assert!(filter.matches(&note("t1", "s1")));
        assert!(!filter.matches(&note("t1", "s2")));
    }
}

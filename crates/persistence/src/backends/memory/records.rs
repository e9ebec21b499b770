//! In-memory record store.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::{OwnerFilter, RecordStore};
use crate::error::{ResourceError, StorageResult, TenantError};
use crate::scope::Owned;

/// A [`RecordStore`] for one entity type, held in process memory.
///
/// Records are keyed and returned in ID order.
pub struct MemoryRecordStore<E> {
    records: RwLock<BTreeMap<String, E>>,
}

impl<E> MemoryRecordStore<E> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the number of stored records, across all owners.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<E> Default for MemoryRecordStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for MemoryRecordStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecordStore")
            .field("len", &self.len())
            .finish()
    }
}

#[async_trait]
impl<E: Owned> RecordStore<E> for MemoryRecordStore<E> {
    async fn insert(&self, record: E) -> StorageResult<E> {
        let mut records = self.records.write();
        let id = record.record_id().to_string();
        if records.contains_key(&id) {
            return Err(ResourceError::already_exists(E::KIND, id).into());
        }
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: E, filter: &OwnerFilter) -> StorageResult<E> {
        let mut records = self.records.write();
        let id = record.record_id().to_string();
        let existing = records
            .get(&id)
            .filter(|r| filter.matches(*r))
            .ok_or_else(|| ResourceError::not_found(E::KIND, id.clone()))?;
        if existing.tenant_id() != record.tenant_id() || existing.site_id() != record.site_id() {
            return Err(TenantError::OwnerChanged {
                kind: E::KIND,
                record_id: id,
            }
            .into());
        }
        records.insert(id, record.clone());
        Ok(record)
    }

    async fn fetch(&self, filter: &OwnerFilter) -> StorageResult<Vec<E>> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| filter.matches(*r))
            .cloned()
            .collect())
    }

    async fn find(&self, id: &str, filter: &OwnerFilter) -> StorageResult<Option<E>> {
        let records = self.records.read();
        Ok(records.get(id).filter(|r| filter.matches(*r)).cloned())
    }

    async fn delete(&self, id: &str, filter: &OwnerFilter) -> StorageResult<bool> {
        let mut records = self.records.write();
        if records.get(id).is_some_and(|r| filter.matches(r)) {
            records.remove(id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::tenant::TenantId;

    #[derive(Clone, Debug, PartialEq)]
    struct Page {
        id: String,
        tenant: Option<TenantId>,
        body: String,
    }

    impl Owned for Page {
        const KIND: &'static str = "page";

        fn record_id(&self) -> &str {
            &self.id
        }

        fn tenant_id(&self) -> Option<&TenantId> {
            self.tenant.as_ref()
        }
    }

    fn page(id: &str, tenant: &str) -> Page {
        Page {
            id: id.to_string(),
            tenant: Some(TenantId::new(tenant)),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_ids() {
        let store = MemoryRecordStore::<Page>::new();
        store.insert(page("p1", "t1")).await.unwrap();
        let err = store.insert(page("p1", "t2")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Resource(ResourceError::AlreadyExists { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_reads() {
        let store = MemoryRecordStore::<Page>::new();
        store.insert(page("p1", "t1")).await.unwrap();
        store.insert(page("p2", "t2")).await.unwrap();

        let t1 = OwnerFilter::tenant(TenantId::new("t1"));
        assert_eq!(store.fetch(&t1).await.unwrap(), vec![page("p1", "t1")]);
        assert!(store.find("p2", &t1).await.unwrap().is_none());
        assert!(store.find("p2", &OwnerFilter::unfiltered()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_outside_filter_is_not_found() {
        let store = MemoryRecordStore::<Page>::new();
        store.insert(page("p1", "t1")).await.unwrap();

        let t2 = OwnerFilter::tenant(TenantId::new("t2"));
        let err = store.update(page("p1", "t1"), &t2).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_cannot_change_owner() {
        let store = MemoryRecordStore::<Page>::new();
        store.insert(page("p1", "t1")).await.unwrap();

        let err = store
            .update(page("p1", "t2"), &OwnerFilter::unfiltered())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::OwnerChanged { .. })
        ));

        let mut edited = page("p1", "t1");
        edited.body = "hello".to_string();
        store.update(edited, &OwnerFilter::unfiltered()).await.unwrap();
        let stored = store.find("p1", &OwnerFilter::unfiltered()).await.unwrap().unwrap();
        assert_eq!(stored.body, "hello");
    }

    #[tokio::test]
    async fn test_delete_respects_filter() {
        let store = MemoryRecordStore::<Page>::new();
        store.insert(page("p1", "t1")).await.unwrap();

        let t2 = OwnerFilter::tenant(TenantId::new("t2"));
        assert!(!store.delete("p1", &t2).await.unwrap());
        assert!(store.delete("p1", &OwnerFilter::unfiltered()).await.unwrap());
        assert!(store.is_empty());
    }
}

//! Ownership traits for scoped entity types.

use crate::settings::HasSettings;
use crate::tenant::{SiteId, TenantId};

/// An entity type owned by a tenant.
///
/// The owner accessors return `Option` so that a record built without an
/// owner can be represented and rejected on creation. Once stored, a
/// record's owner never changes.
pub trait Owned: Clone + Send + Sync + 'static {
    /// Short name of the entity type, used in errors and logs.
    const KIND: &'static str;

    /// Returns the record's unique ID.
    fn record_id(&self) -> &str;

    /// Returns the owning tenant.
    fn tenant_id(&self) -> Option<&TenantId>;

    /// Returns the owning site, for site-owned entity types.
    fn site_id(&self) -> Option<&SiteId> {
        None
    }
}

/// An entity type owned by a site (and, through the site, by a tenant).
///
/// Site-owned records carry a settings document for entity-local
/// configuration, read with [`HasSettings::setting`].
pub trait SiteOwned: Owned + HasSettings {}

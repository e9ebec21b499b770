//! Default scoping of tenant- and site-owned records.
//!
//! Every repository for an owned entity type is a [`Scoped`] decorator over a
//! [`RecordStore`](crate::core::RecordStore). Reads and writes are implicitly
//! restricted to the owner bound in the
//! [`RequestContext`](crate::tenant::RequestContext), with explicit escapes
//! for cross-tenant work.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use canopy_persistence::backends::memory::MemoryRecordStore;
//! use canopy_persistence::scope::{Owned, TenantScoped};
//! use canopy_persistence::tenant::{RequestContext, Tenant, TenantId};
//!
//! #[derive(Clone)]
//! struct Invoice {
//!     id: String,
//!     tenant_id: Option<TenantId>,
//! }
//!
//! impl Owned for Invoice {
//!     const KIND: &'static str = "invoice";
//!     fn record_id(&self) -> &str { &self.id }
//!     fn tenant_id(&self) -> Option<&TenantId> { self.tenant_id.as_ref() }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let acme = Tenant::new("acme", "acme.example", "Acme");
//! let globex = Tenant::new("globex", "globex.example", "Globex");
//!
//! let invoices: TenantScoped<Invoice, _> =
//!     TenantScoped::new(Arc::new(MemoryRecordStore::<Invoice>::new()));
//! for (id, owner) in [("i1", &acme), ("i2", &globex)] {
//!     let invoice = Invoice { id: id.into(), tenant_id: Some(owner.id.clone()) };
//!     // Nothing is bound yet, so any owner is accepted.
//!     invoices.create(invoice).await.unwrap();
//! }
//!
//! RequestContext::with_tenant(acme, async {
//!     assert_eq!(invoices.all().await.unwrap().len(), 1);
//!     assert_eq!(invoices.unscoped_all().await.unwrap().len(), 2);
//! })
//! .await;
//! # });
//! ```

mod owned;
mod policy;
mod scoped;

pub use owned::{Owned, SiteOwned};
pub use policy::{ScopePolicy, SiteScope, TenantScope};
pub use scoped::{Scoped, SiteScoped, TenantScoped};

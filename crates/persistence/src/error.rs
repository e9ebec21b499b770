//! Error types for the persistence layer.
//!
//! Errors are grouped by category: record state, tenant isolation,
//! validation and backend failures. [`StorageError`] is the umbrella type
//! returned by every registry, record store and scoping operation.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::{SiteId, TenantId};

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Record state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Tenant isolation errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns `true` for failures raised by the lookup itself: a strict
    /// lookup that found nothing, or a query the backend could not run.
    ///
    /// Connection failures, pool exhaustion and internal backend errors are
    /// not lookup faults; they indicate the registry itself is unhealthy.
    pub fn is_lookup_fault(&self) -> bool {
        matches!(
            self,
            StorageError::Resource(ResourceError::NotFound { .. })
                | StorageError::Backend(BackendError::QueryError { .. })
                | StorageError::Backend(BackendError::SerializationError { .. })
        )
    }

    /// Returns `true` if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested record was not found.
    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    /// A record with the same unique key already exists.
    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: String, key: String },
}

impl ResourceError {
    pub(crate) fn not_found(kind: &str, key: impl Into<String>) -> Self {
        ResourceError::NotFound {
            kind: kind.to_string(),
            key: key.into(),
        }
    }

    pub(crate) fn already_exists(kind: &str, key: impl Into<String>) -> Self {
        ResourceError::AlreadyExists {
            kind: kind.to_string(),
            key: key.into(),
        }
    }
}

/// Errors related to tenant and site isolation.
///
/// Every variant is a programming error or a cross-tenant write in the
/// making. None of them may be swallowed.
#[derive(Error, Debug)]
pub enum TenantError {
    /// A scoped operation required a bound owner but none was bound.
    #[error("no {scope} bound in the request context")]
    NotBound { scope: &'static str },

    /// A record's owner differs from the owner bound in the request context.
    #[error(
        "scope violation: {kind} {record_id} belongs to {found}, but {expected} is bound"
    )]
    ScopeViolation {
        kind: &'static str,
        record_id: String,
        expected: String,
        found: String,
    },

    /// A site was bound whose tenant differs from the bound tenant.
    #[error("site {site_id} belongs to tenant {site_tenant}, but tenant {bound_tenant} is bound")]
    ContextMismatch {
        site_id: SiteId,
        site_tenant: TenantId,
        bound_tenant: TenantId,
    },

    /// A site-owned record was written for a site that could not be checked
    /// against its tenant.
    #[error("site {site_id} of {kind} {record_id} cannot be verified: no site bound and no registry attached")]
    UnverifiedSite {
        kind: &'static str,
        record_id: String,
        site_id: SiteId,
    },

    /// An update attempted to move a record to a different owner.
    #[error("owner of {kind} {record_id} is immutable")]
    OwnerChanged {
        kind: &'static str,
        record_id: String,
    },

    /// The request context was written outside of a unit of work.
    #[error("request context used outside of a unit of work")]
    NoActiveUnitOfWork,
}

/// Errors related to record validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field has an invalid value.
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// A settings path is empty or contains an empty segment.
    #[error("invalid settings path: {path:?}")]
    InvalidSettingsPath { path: String },

    /// A settings document exceeds the allowed size.
    #[error("settings document is {size} bytes, maximum is {max}")]
    SettingsTooLarge { size: usize, max: usize },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        ValidationError::MissingRequiredField {
            field: field.to_string(),
        }
    }
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_lookup_fault() {
        let err = StorageError::from(ResourceError::not_found("tenant", "acme.example"));
        assert!(err.is_lookup_fault());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "tenant not found: acme.example");
    }

    #[test]
    fn test_query_error_is_lookup_fault() {
        let err = StorageError::from(BackendError::QueryError {
            message: "no such column".to_string(),
        });
        assert!(err.is_lookup_fault());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unavailable_is_not_lookup_fault() {
        let err = StorageError::from(BackendError::Unavailable {
            backend_name: "sqlite".to_string(),
            message: "disk I/O error".to_string(),
        });
        assert!(!err.is_lookup_fault());

        let err = StorageError::from(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: "timed out".to_string(),
        });
        assert!(!err.is_lookup_fault());
    }

    #[test]
    fn test_scope_violation_display() {
        let err = TenantError::ScopeViolation {
            kind: "article",
            record_id: "a-1".to_string(),
            expected: "tenant t-b".to_string(),
            found: "tenant t-a".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("article a-1"));
        assert!(msg.contains("tenant t-a"));
        assert!(msg.contains("tenant t-b"));
    }
}

//! Error types for the HTTP layer.
//!
//! # Error Mapping
//!
//! Storage errors from the persistence layer are mapped to HTTP status codes:
//!
//! | Storage Error | HTTP Status |
//! |--------------|-------------|
//! | Resource NotFound | 404 |
//! | Resource AlreadyExists | 409 |
//! | Validation | 400 |
//! | Tenant (scoping) | 500 |
//! | Backend | 500 |
//!
//! Scoping violations are programming errors and surface as a generic
//! server error. An unresolved host is answered with the fixed
//! [`TENANT_NOT_FOUND_BODY`] page instead of a JSON body.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use canopy_persistence::error::{ResourceError, StorageError};
use std::fmt;
use tracing::error;

/// Body of the response for an unknown or disabled tenant.
pub const TENANT_NOT_FOUND_BODY: &str = "Tenant not found";

/// The primary error type for HTTP operations.
#[derive(Debug)]
pub enum RestError {
    /// Record not found (HTTP 404).
    NotFound {
        /// Error message.
        message: String,
    },

    /// The request host resolved to no reachable tenant (HTTP 404, plain page).
    TenantNotFound,

    /// Unique key already taken (HTTP 409).
    Conflict {
        /// Error message.
        message: String,
    },

    /// Bad request - validation error (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } | RestError::TenantNotFound => StatusCode::NOT_FOUND,
            RestError::Conflict { .. } => StatusCode::CONFLICT,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::NotFound { message } => write!(f, "Not found: {}", message),
            RestError::TenantNotFound => f.write_str(TENANT_NOT_FOUND_BODY),
            RestError::Conflict { message } => write!(f, "Conflict: {}", message),
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            RestError::TenantNotFound => {
                return (
                    status,
                    [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                    TENANT_NOT_FOUND_BODY,
                )
                    .into_response();
            }
            RestError::InternalError { message } => {
                error!(error = %message, "Request failed");
                // Details stay in the log.
                "Internal server error".to_string()
            }
            RestError::NotFound { message }
            | RestError::Conflict { message }
            | RestError::BadRequest { message } => message,
        };

        let body = serde_json::json!({
            "error": {
                "status": status.as_u16(),
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(ResourceError::NotFound { .. }) => RestError::NotFound {
                message: err.to_string(),
            },
            StorageError::Resource(ResourceError::AlreadyExists { .. }) => RestError::Conflict {
                message: err.to_string(),
            },
            StorageError::Validation(e) => RestError::BadRequest {
                message: e.to_string(),
            },
            StorageError::Tenant(_) | StorageError::Backend(_) => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<canopy_persistence::error::TenantError> for RestError {
    fn from(err: canopy_persistence::error::TenantError) -> Self {
        StorageError::from(err).into()
    }
}

/// Result type alias for HTTP operations.
pub type RestResult<T> = Result<T, RestError>;

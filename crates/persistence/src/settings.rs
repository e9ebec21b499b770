//! Dot-path settings documents.
//!
//! Tenants, sites and site-owned records carry a semi-structured settings
//! blob. [`SettingsDocument`] reads and writes it by dot-delimited path:
//!
//! ```
//! use canopy_persistence::settings::SettingsDocument;
//! use serde_json::json;
//!
//! let doc = SettingsDocument::default();
//! assert_eq!(doc.get_or("mail.footer.enabled", true), json!(true));
//!
//! let doc = doc.with_value("mail.footer.enabled", false).unwrap();
//! assert_eq!(doc.get_or("mail.footer.enabled", true), json!(false));
//! assert_eq!(doc.get("mail.footer"), Some(&json!({ "enabled": false })));
//! ```
//!
//! Writing never mutates a document in place. [`SettingsDocument::with_value`]
//! returns a deep copy, which the owning record then persists as a whole
//! (see [`TenantRegistry::set_tenant_setting`]).
//!
//! [`TenantRegistry::set_tenant_setting`]: crate::core::TenantRegistry::set_tenant_setting

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Maximum serialized size of a settings document, in bytes.
pub const MAX_SETTINGS_BYTES: usize = 64 * 1024;

/// A nested key/value document addressed by dot-delimited paths.
///
/// The root is always a JSON object. An unset (`null`) base value is read as
/// an empty document, so accessors never fail on a missing blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct SettingsDocument(Map<String, Value>);

impl SettingsDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns the value at `path`, if present.
    ///
    /// Traversal stops with `None` when a segment is missing or a
    /// non-object value is reached before the path is exhausted. An explicit
    /// `null` is treated as absent. `false` and `0` are ordinary values.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        if current.is_null() { None } else { Some(current) }
    }

    /// Returns the value at `path`, or `default` when it is absent.
    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).cloned().unwrap_or_else(|| default.into())
    }

    /// Returns a copy of this document with `value` written at `path`.
    ///
    /// Missing intermediate segments are created as empty objects. An
    /// intermediate segment holding a non-object value is replaced by an
    /// object.
    pub fn with_value(
        &self,
        path: &str,
        value: impl Into<Value>,
    ) -> Result<SettingsDocument, ValidationError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ValidationError::InvalidSettingsPath {
                path: path.to_string(),
            });
        }

        let mut copy = self.0.clone();
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ValidationError::InvalidSettingsPath {
                path: path.to_string(),
            })?;

        let mut cursor = &mut copy;
        for segment in parents {
            let slot = cursor
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            cursor = slot
                .as_object_mut()
                .ok_or_else(|| ValidationError::InvalidSettingsPath {
                    path: path.to_string(),
                })?;
        }
        cursor.insert(last.to_string(), value.into());

        Ok(SettingsDocument(copy))
    }

    /// Checks the serialized size of the document.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let size = serde_json::to_vec(&self.0).map(|v| v.len()).unwrap_or(0);
        if size > MAX_SETTINGS_BYTES {
            return Err(ValidationError::SettingsTooLarge {
                size,
                max: MAX_SETTINGS_BYTES,
            });
        }
        Ok(())
    }

    /// Returns `true` if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Value> for SettingsDocument {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => SettingsDocument(map),
            // A null or scalar base is read as an empty document.
            _ => SettingsDocument::new(),
        }
    }
}

impl From<SettingsDocument> for Value {
    fn from(doc: SettingsDocument) -> Self {
        Value::Object(doc.0)
    }
}

/// Records that carry a settings document.
pub trait HasSettings {
    /// Returns the settings document.
    fn settings(&self) -> &SettingsDocument;

    /// Reads a setting by dot-path, falling back to `default`.
    fn setting(&self, path: &str, default: impl Into<Value>) -> Value
    where
        Self: Sized,
    {
        self.settings().get_or(path, default)
    }
}

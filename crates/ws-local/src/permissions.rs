//! Permission sidecar files.
//!
//! Each document's permissions live in `<permissions dir>/<doc-id>.json` as a
//! JSON array of `{email, role, type}` records.

use std::fs;
use std::path::PathBuf;

use ws_core::{MetadataMap, Permission, WorkspaceError};

use crate::locks::RwLockTable;
use crate::metadata::write_atomic;

/// Metadata key under which older documents embedded their permissions.
pub(crate) const LEGACY_PERMISSIONS_KEY: &str = "permissions_json";

/// Decode permissions embedded in document metadata by older versions.
///
/// Undecodable data is logged and treated as no permissions.
pub(crate) fn legacy_permissions(metadata: &MetadataMap) -> Vec<Permission> {
    let Some(value) = metadata.get(LEGACY_PERMISSIONS_KEY) else {
        return Vec::new();
    };
    let decoded = match value {
        serde_json::Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    };
    decoded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring undecodable embedded permissions");
        Vec::new()
    })
}

/// Sidecar permission files keyed by document id.
pub(crate) struct PermissionStore {
    dir: PathBuf,
    locks: RwLockTable<String>,
}

impl PermissionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            locks: RwLockTable::new(),
        }
    }

    fn path(&self, doc_id: &str) -> PathBuf {
        self.dir.join(format!("{doc_id}.json"))
    }

    /// Stored permissions, or `None` if the document has no sidecar file.
    pub fn load(&self, doc_id: &str) -> Result<Option<Vec<Permission>>, WorkspaceError> {
        let path = self.path(doc_id);
        let text = self.locks.read(&doc_id.to_owned(), || {
            match fs::read_to_string(&path) {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(WorkspaceError::io(e, Some(path.clone()))),
            }
        })?;
        let Some(text) = text else {
            return Ok(None);
        };
        serde_json::from_str(&text).map(Some).map_err(|e| {
            WorkspaceError::malformed("permission file")
                .with_resource("document", doc_id)
                .with_path(&path)
                .with_source(e)
        })
    }

    /// Replace a document's permissions.
    pub fn save(&self, doc_id: &str, permissions: &[Permission]) -> Result<(), WorkspaceError> {
        let path = self.path(doc_id);
        let json = serde_json::to_vec_pretty(permissions).map_err(|e| {
            WorkspaceError::malformed("permission list")
                .with_resource("document", doc_id)
                .with_source(e)
        })?;
        self.locks
            .write(&doc_id.to_owned(), || write_atomic(&path, &json))?;
        tracing::debug!(id = %doc_id, count = permissions.len(), "Saved permissions");
        Ok(())
    }

    /// Remove a document's sidecar file. A missing file is not an error.
    pub fn delete(&self, doc_id: &str) -> Result<(), WorkspaceError> {
        let path = self.path(doc_id);
        self.locks
            .write(&doc_id.to_owned(), || match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(WorkspaceError::io(e, Some(path.clone()))),
            })
    }
}

//! Search indexing seam.
//!
//! The indexer converts stored documents into [`SearchDocument`] records and
//! pushes them to a [`SearchIndex`]. The search backend itself lives elsewhere.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::WorkspaceError;
use crate::types::Location;

/// Document record as understood by the search backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    /// Search object identifier (same as the document id).
    pub object_id: String,
    /// Document identifier.
    pub doc_id: String,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Document type (e.g., "RFC", "PRD").
    pub doc_type: String,
    /// Human-facing document number (e.g., "TF-123").
    pub doc_number: String,
    /// Product area.
    pub product: String,
    /// Workflow status.
    pub status: String,
    /// Short summary.
    pub summary: String,
    /// Owner emails.
    pub owners: Vec<String>,
    /// Contributor emails.
    pub contributors: Vec<String>,
    /// Approver emails.
    pub approvers: Vec<String>,
    /// Creation time (unix seconds).
    pub created_time: i64,
    /// Modification time (unix seconds).
    pub modified_time: i64,
    /// Metadata not mapped to a dedicated field.
    pub custom_fields: HashMap<String, serde_json::Value>,
}

/// Destination for indexed documents.
pub trait SearchIndex: Send + Sync {
    /// Index (insert or replace) a document in the index for `location`.
    fn index(&self, document: &SearchDocument, location: Location) -> Result<(), WorkspaceError>;
}

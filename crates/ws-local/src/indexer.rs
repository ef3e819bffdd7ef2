//! Republishes stored documents to a search index.

use std::path::Path;

use ws_core::{Document, Location, SearchDocument, SearchIndex, WorkspaceError};

use crate::metadata::document_entries;
use crate::{LocalAdapter, to_document};

/// Metadata keys mapped to dedicated [`SearchDocument`] fields.
const MAPPED_KEYS: [&str; 8] = [
    "docType",
    "docNumber",
    "product",
    "status",
    "summary",
    "owners",
    "contributors",
    "approvers",
];

/// Outcome of an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Documents pushed to the index.
    pub indexed: usize,
    /// Documents that could not be read or indexed.
    pub skipped: usize,
}

impl std::ops::AddAssign for IndexStats {
    fn add_assign(&mut self, other: Self) {
        self.indexed += other.indexed;
        self.skipped += other.skipped;
    }
}

/// Walks the published and draft roots and pushes every document to a [`SearchIndex`].
pub struct DocumentIndexer<'a> {
    adapter: &'a LocalAdapter,
    index: &'a dyn SearchIndex,
}

impl<'a> DocumentIndexer<'a> {
    pub fn new(adapter: &'a LocalAdapter, index: &'a dyn SearchIndex) -> Self {
        Self { adapter, index }
    }

    /// Index every document, published root first.
    ///
    /// Both `<id>.md` files and `<id>/metadata.json` directories are indexed.
    /// Unreadable documents and index failures are counted as skipped; only a
    /// root directory that exists but cannot be listed fails the run.
    pub fn index_all(&self) -> Result<IndexStats, WorkspaceError> {
        tracing::info!(
            base_path = %self.adapter.config().base_path.display(),
            "Starting document indexing"
        );
        let mut total = IndexStats::default();
        for location in Location::ALL {
            total += self.index_root(location)?;
        }
        tracing::info!(
            indexed = total.indexed,
            skipped = total.skipped,
            "Document indexing completed"
        );
        Ok(total)
    }

    fn index_root(&self, location: Location) -> Result<IndexStats, WorkspaceError> {
        let root = self.adapter.root(location);
        if !root.exists() {
            tracing::warn!(path = %root.display(), "Directory does not exist, skipping");
            return Ok(IndexStats::default());
        }

        let mut stats = IndexStats::default();
        for path in document_entries(root)? {
            match self.index_file(&path, location) {
                Ok(()) => stats.indexed += 1,
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        location = %location,
                        error = %e,
                        "Failed to index document"
                    );
                    stats.skipped += 1;
                }
            }
        }

        tracing::info!(
            path = %root.display(),
            location = %location,
            indexed = stats.indexed,
            skipped = stats.skipped,
            "Directory indexing completed"
        );
        Ok(stats)
    }

    fn index_file(&self, path: &Path, location: Location) -> Result<(), WorkspaceError> {
        let (meta, content) = self.adapter.store.get_with_content(path)?;
        let permissions = self.adapter.readable_permissions(&meta);
        let doc = to_document(meta, content, location, permissions);
        self.index.index(&to_search_document(doc), location)
    }
}

/// Convert a stored document into a search record.
pub(crate) fn to_search_document(doc: Document) -> SearchDocument {
    let text = |key: &str| {
        doc.metadata
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_owned()
    };
    let list = |key: &str| doc.metadata.get(key).map(string_list).unwrap_or_default();

    let mut owners = list("owners");
    if owners.is_empty() && !doc.owner.is_empty() {
        owners.push(doc.owner.clone());
    }

    let custom_fields = doc
        .metadata
        .iter()
        .filter(|(key, _)| !MAPPED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    SearchDocument {
        object_id: doc.id.clone(),
        doc_type: text("docType"),
        doc_number: text("docNumber"),
        product: text("product"),
        status: text("status"),
        summary: text("summary"),
        contributors: list("contributors"),
        approvers: list("approvers"),
        owners,
        custom_fields,
        created_time: doc.created_time.timestamp(),
        modified_time: doc.modified_time.timestamp(),
        doc_id: doc.id,
        title: doc.name,
        content: doc.content,
    }
}

/// Strings of an array value, or of an array stored as JSON text.
fn string_list(value: &serde_json::Value) -> Vec<String> {
    let decoded;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::String(text) => {
            decoded = serde_json::from_str::<Vec<serde_json::Value>>(text).unwrap_or_default();
            &decoded
        }
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_owned))
        .collect()
}

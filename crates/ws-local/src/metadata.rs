//! Document file store.
//!
//! The only code that reads or writes document files. A document is stored in
//! one of two layouts:
//!
//! ```text
//! <root>/<id>.md                 frontmatter followed by the body
//! <root>/<id>/metadata.json      JSON metadata object
//! <root>/<id>/content.md         body
//! ```
//!
//! Each file operation holds the lock for its path; writes are staged in a
//! temporary file next to the target and renamed over it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ws_core::{ErrorKind, MetadataMap, WorkspaceError};

use crate::frontmatter::{self, DocumentMetadata};
use crate::locks::RwLockTable;

/// File extension of document files.
pub(crate) const DOCUMENT_EXTENSION: &str = "md";

/// Metadata file of a directory document.
pub(crate) const METADATA_FILE: &str = "metadata.json";

/// Body file of a directory document.
pub(crate) const CONTENT_FILE: &str = "content.md";

/// `metadata.json` keys mapped to [`DocumentMetadata`] fields.
const DIRECTORY_KEYS: [&str; 12] = [
    "id",
    "googleFileID",
    "title",
    "name",
    "parent_folder_id",
    "owner",
    "thumbnail_url",
    "trashed",
    "createdTime",
    "modifiedTime",
    "created_time",
    "modified_time",
];

/// How a document is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// A single `<id>.md` file with frontmatter.
    File,
    /// A `<id>/` directory holding `metadata.json` and `content.md`.
    Directory,
}

impl Layout {
    /// Layout of the document stored at `path`.
    pub fn of(path: &Path) -> Self {
        if path.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }

    /// Whether a custom metadata key survives a write in this layout.
    pub fn stores_key(self, key: &str) -> bool {
        match self {
            Self::File => frontmatter::is_storable_key(key),
            Self::Directory => !key.is_empty() && !DIRECTORY_KEYS.contains(&key),
        }
    }
}

/// Write `bytes` to `path` via a temporary file in the same directory.
///
/// The temporary file is removed if anything fails before the rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WorkspaceError> {
    let dir = path
        .parent()
        .ok_or_else(|| WorkspaceError::invalid_input("path", "has no parent directory"))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(dir)
        .map_err(|e| WorkspaceError::io(e, Some(dir.to_path_buf())))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| WorkspaceError::io(e, Some(tmp.path().to_path_buf())))?;
    tmp.persist(path)
        .map_err(|e| WorkspaceError::io(e.error, Some(path.to_path_buf())))?;
    Ok(())
}

/// Reads and writes documents under per-path locks.
pub(crate) struct MetadataStore {
    locks: RwLockTable<PathBuf>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self {
            locks: RwLockTable::new(),
        }
    }

    /// Read only the metadata of a document.
    pub fn get(&self, path: &Path) -> Result<DocumentMetadata, WorkspaceError> {
        self.get_with_content(path).map(|(meta, _)| meta)
    }

    /// Read metadata and body of a document in either layout.
    pub fn get_with_content(
        &self,
        path: &Path,
    ) -> Result<(DocumentMetadata, String), WorkspaceError> {
        self.locks.read(&path.to_path_buf(), || match Layout::of(path) {
            Layout::File => {
                let text = read_file(path)?;
                frontmatter::parse(&text)
                    .map_err(|e| WorkspaceError::from(e).with_path(path))
            }
            Layout::Directory => {
                let metadata_path = path.join(METADATA_FILE);
                let meta = parse_metadata_json(path, &read_file(&metadata_path)?)
                    .map_err(|e| e.with_path(&metadata_path))?;
                let content = read_file(&path.join(CONTENT_FILE))?;
                Ok((meta, content))
            }
        })
    }

    /// Replace a document, keeping the layout it already has.
    pub fn set(
        &self,
        path: &Path,
        meta: &DocumentMetadata,
        content: &str,
    ) -> Result<(), WorkspaceError> {
        self.set_as(path, Layout::of(path), meta, content)
    }

    /// Write a document in the given layout, creating its directory if needed.
    pub fn set_as(
        &self,
        path: &Path,
        layout: Layout,
        meta: &DocumentMetadata,
        content: &str,
    ) -> Result<(), WorkspaceError> {
        self.locks.write(&path.to_path_buf(), || match layout {
            Layout::File => write_atomic(path, frontmatter::serialize(meta, content).as_bytes()),
            Layout::Directory => {
                fs::create_dir_all(path)
                    .map_err(|e| WorkspaceError::io(e, Some(path.to_path_buf())))?;
                write_atomic(&path.join(METADATA_FILE), &metadata_json(meta)?)?;
                write_atomic(&path.join(CONTENT_FILE), content.as_bytes())
            }
        })?;
        tracing::debug!(path = %path.display(), id = %meta.id, ?layout, "Wrote document");
        Ok(())
    }

    /// Delete a document in either layout. A missing document is not an error.
    pub fn delete(&self, path: &Path) -> Result<(), WorkspaceError> {
        self.locks.write(&path.to_path_buf(), || {
            let removed = match Layout::of(path) {
                Layout::File => fs::remove_file(path),
                Layout::Directory => fs::remove_dir_all(path),
            };
            match removed {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Deleted document");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(WorkspaceError::io(e, Some(path.to_path_buf()))),
            }
        })
    }

    /// Whether a document exists at `path` in either layout.
    pub fn exists(&self, path: &Path) -> bool {
        self.locks.read(&path.to_path_buf(), || is_document(path))
    }

    /// Metadata of every document directly inside `dir`.
    ///
    /// Non-document entries and documents that fail to parse are skipped. A
    /// missing directory yields an empty list.
    pub fn list(&self, dir: &Path) -> Result<Vec<(PathBuf, DocumentMetadata)>, WorkspaceError> {
        let mut documents = Vec::new();
        for path in document_entries(dir)? {
            match self.get(&path) {
                Ok(meta) => documents.push((path, meta)),
                // Removed between readdir and read.
                Err(e) if e.is(ErrorKind::NotFound) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable document"
                    );
                }
            }
        }
        Ok(documents)
    }
}

/// Paths of the documents directly inside `dir`, in either layout.
///
/// A missing directory yields an empty list.
pub(crate) fn document_entries(dir: &Path) -> Result<Vec<PathBuf>, WorkspaceError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(WorkspaceError::io(e, Some(dir.to_path_buf()))),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| WorkspaceError::io(e, Some(dir.to_path_buf())))?
            .path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_none_or(|name| name.starts_with('.'));
        if hidden {
            continue;
        }
        let document_file = path
            .extension()
            .is_some_and(|ext| ext == DOCUMENT_EXTENSION);
        if (document_file && path.is_file()) || (path.is_dir() && is_document(&path)) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_document(path: &Path) -> bool {
    path.is_file() || path.join(METADATA_FILE).is_file()
}

fn read_file(path: &Path) -> Result<String, WorkspaceError> {
    fs::read_to_string(path).map_err(|e| WorkspaceError::io(e, Some(path.to_path_buf())))
}

/// Decode `metadata.json` of the directory document at `dir`.
///
/// `googleFileID` stands in for a missing `id`, then the directory name. `title`
/// wins over `name`, and the first of `owners` stands in for a missing `owner`.
fn parse_metadata_json(dir: &Path, text: &str) -> Result<DocumentMetadata, WorkspaceError> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)
        .map_err(|e| WorkspaceError::malformed("metadata.json").with_source(e))?;
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| object.get(*key).and_then(|v| v.as_str()))
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };
    let time = |keys: &[&str]| {
        text(keys)
            .and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default()
    };

    let id = text(&["id", "googleFileID"])
        .or_else(|| {
            dir.file_name()
                .and_then(|name| name.to_str())
                .map(str::to_owned)
        })
        .unwrap_or_default();
    let owner = text(&["owner"]).or_else(|| {
        object
            .get("owners")
            .and_then(|v| v.as_array())
            .and_then(|owners| owners.first())
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    });
    let metadata: MetadataMap = object
        .iter()
        .filter(|(key, _)| !DIRECTORY_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(DocumentMetadata {
        id,
        name: text(&["title", "name"]).unwrap_or_default(),
        parent_folder_id: text(&["parent_folder_id"]).unwrap_or_default(),
        created_time: time(&["createdTime", "created_time"]),
        modified_time: time(&["modifiedTime", "modified_time"]),
        owner: owner.unwrap_or_default(),
        thumbnail_url: text(&["thumbnail_url"]).unwrap_or_default(),
        trashed: object
            .get("trashed")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
        metadata,
    })
}

/// Encode `metadata.json` for a directory document.
///
/// `googleFileID` and `title` mirror `id` and `name` for readers that expect
/// them. Custom keys that collide with mapped keys are skipped.
fn metadata_json(meta: &DocumentMetadata) -> Result<Vec<u8>, WorkspaceError> {
    let mut object = serde_json::Map::new();
    for (key, value) in &meta.metadata {
        if !Layout::Directory.stores_key(key) {
            tracing::warn!(
                key = %key,
                id = %meta.id,
                "Skipping metadata key that cannot be stored in metadata.json"
            );
            continue;
        }
        object.insert(key.clone(), value.clone());
    }
    let text = serde_json::Value::String;
    object.insert("id".to_owned(), text(meta.id.clone()));
    object.insert("googleFileID".to_owned(), text(meta.id.clone()));
    object.insert("title".to_owned(), text(meta.name.clone()));
    object.insert("name".to_owned(), text(meta.name.clone()));
    object.insert(
        "parent_folder_id".to_owned(),
        text(meta.parent_folder_id.clone()),
    );
    object.insert("owner".to_owned(), text(meta.owner.clone()));
    object.insert(
        "createdTime".to_owned(),
        text(frontmatter::format_time(meta.created_time)),
    );
    object.insert(
        "modifiedTime".to_owned(),
        text(frontmatter::format_time(meta.modified_time)),
    );
    object.insert("trashed".to_owned(), serde_json::Value::Bool(meta.trashed));
    if !meta.thumbnail_url.is_empty() {
        object.insert("thumbnail_url".to_owned(), text(meta.thumbnail_url.clone()));
    }

    serde_json::to_vec_pretty(&object).map_err(|e| {
        WorkspaceError::malformed("document metadata")
            .with_resource("document", &meta.id)
            .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn metadata(id: &str) -> DocumentMetadata {
        let now = Utc::now();
        DocumentMetadata {
            id: id.to_owned(),
            name: format!("Doc {id}"),
            parent_folder_id: "docs".to_owned(),
            created_time: now,
            modified_time: now,
            ..Default::default()
        }
    }

    #[test]
    fn test_set_then_get_with_content() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("a.md");
        let store = MetadataStore::new();
        let meta = metadata("a");

        store.set(&path, &meta, "Hello").unwrap();
        let (loaded, content) = store.get_with_content(&path).unwrap();

        assert_eq!(loaded, meta);
        assert_eq!(content, "Hello");
    }

    #[test]
    fn test_set_overwrites_whole_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("a.md");
        let store = MetadataStore::new();

        store.set(&path, &metadata("a"), "first version").unwrap();
        store.set(&path, &metadata("a"), "second").unwrap();

        let (_, content) = store.get_with_content(&path).unwrap();
        assert_eq!(content, "second");
    }

    #[test]
    fn test_set_leaves_no_temp_files() {
        let temp_dir = create_test_dir();
        let store = MetadataStore::new();

        store
            .set(&temp_dir.path().join("a.md"), &metadata("a"), "x")
            .unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.md".to_owned()]);
    }

    #[test]
    fn test_get_missing_file_is_not_found() {
        let temp_dir = create_test_dir();
        let store = MetadataStore::new();

        let err = store.get(&temp_dir.path().join("missing.md")).unwrap_err();

        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_get_malformed_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("bad.md");
        fs::write(&path, "no frontmatter here").unwrap();
        let store = MetadataStore::new();

        let err = store.get(&path).unwrap_err();

        assert!(err.is(ErrorKind::Malformed));
        assert_eq!(err.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("a.md");
        let store = MetadataStore::new();
        store.set(&path, &metadata("a"), "").unwrap();

        store.delete(&path).unwrap();
        store.delete(&path).unwrap();

        assert!(!store.exists(&path));
    }

    #[test]
    fn test_list_skips_other_files_and_parse_failures() {
        let temp_dir = create_test_dir();
        let store = MetadataStore::new();
        store
            .set(&temp_dir.path().join("a.md"), &metadata("a"), "")
            .unwrap();
        store
            .set(&temp_dir.path().join("b.md"), &metadata("b"), "")
            .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "---\nid: x\n---\n").unwrap();
        fs::write(temp_dir.path().join("broken.md"), "---\nid: x\n").unwrap();
        fs::create_dir(temp_dir.path().join("sub.md")).unwrap();

        let mut ids: Vec<_> = store
            .list(temp_dir.path())
            .unwrap()
            .into_iter()
            .map(|(_, meta)| meta.id)
            .collect();
        ids.sort();

        assert_eq!(ids, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let store = MetadataStore::new();

        let docs = store.list(Path::new("/nonexistent/ws-docs")).unwrap();

        assert!(docs.is_empty());
    }

    #[test]
    fn test_write_atomic_creates_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("f.json");

        write_atomic(&path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_write_atomic_missing_dir_fails() {
        let temp_dir = create_test_dir();

        let result = write_atomic(&temp_dir.path().join("nope/f.json"), b"{}");

        assert!(result.is_err());
    }

    #[test]
    fn test_directory_layout_fallbacks() {
        let temp_dir = create_test_dir();
        let dir = temp_dir.path().join("imported1");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join(METADATA_FILE),
            r#"{"name": "Old name", "owners": ["carol@example.com"], "trashed": true,
                "createdTime": "2024-03-01T10:00:00Z", "reviewers": ["dan@example.com"]}"#,
        )
        .unwrap();
        fs::write(dir.join(CONTENT_FILE), "body").unwrap();
        let store = MetadataStore::new();

        let (meta, content) = store.get_with_content(&dir).unwrap();

        assert_eq!(meta.id, "imported1");
        assert_eq!(meta.name, "Old name");
        assert_eq!(meta.owner, "carol@example.com");
        assert!(meta.trashed);
        assert_eq!(meta.created_time.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(meta.metadata["reviewers"], serde_json::json!(["dan@example.com"]));
        assert_eq!(content, "body");
        assert!(store.exists(&dir));
    }

    #[test]
    fn test_directory_layout_set_preserves_layout() {
        let temp_dir = create_test_dir();
        let dir = temp_dir.path().join("a");
        let store = MetadataStore::new();
        let mut meta = metadata("a");
        meta.metadata
            .insert("approvers".to_owned(), serde_json::json!(["b@example.com"]));
        meta.metadata
            .insert("title".to_owned(), serde_json::json!("shadow"));

        store.set_as(&dir, Layout::Directory, &meta, "v1").unwrap();
        store.set(&dir, &meta, "v2").unwrap();
        let (loaded, content) = store.get_with_content(&dir).unwrap();

        assert_eq!(Layout::of(&dir), Layout::Directory);
        assert_eq!(content, "v2");
        assert_eq!(loaded.id, "a");
        assert_eq!(loaded.name, "Doc a");
        assert_eq!(loaded.created_time, meta.created_time);
        assert_eq!(loaded.metadata.len(), 1);
        assert_eq!(loaded.metadata["approvers"], serde_json::json!(["b@example.com"]));
        let text = fs::read_to_string(dir.join(METADATA_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["googleFileID"], "a");
        assert_eq!(json["title"], "Doc a");
        assert!(!temp_dir.path().join("a.md").exists());
    }

    #[test]
    fn test_list_and_delete_directory_documents() {
        let temp_dir = create_test_dir();
        let store = MetadataStore::new();
        store
            .set(&temp_dir.path().join("a.md"), &metadata("a"), "")
            .unwrap();
        let dir = temp_dir.path().join("b");
        store
            .set_as(&dir, Layout::Directory, &metadata("b"), "")
            .unwrap();
        fs::create_dir(temp_dir.path().join("assets")).unwrap();

        let mut ids: Vec<_> = store
            .list(temp_dir.path())
            .unwrap()
            .into_iter()
            .map(|(_, meta)| meta.id)
            .collect();
        ids.sort();
        store.delete(&dir).unwrap();

        assert_eq!(ids, vec!["a".to_owned(), "b".to_owned()]);
        assert!(!dir.exists());
        assert!(!store.exists(&dir));
    }

    #[test]
    fn test_stores_key_per_layout() {
        assert!(Layout::File.stores_key("status"));
        assert!(!Layout::File.stores_key("owner"));
        assert!(!Layout::File.stores_key("a:b"));
        assert!(Layout::Directory.stores_key("a:b"));
        assert!(!Layout::Directory.stores_key("title"));
        assert!(!Layout::Directory.stores_key("owner"));
    }
}

//! Local filesystem workspace backend.
//!
//! This crate provides [`LocalAdapter`], a [`DocumentStorage`] implementation that
//! keeps everything as plain files under one base directory:
//!
//! ```text
//! <base>/docs/<id>.md            published documents (frontmatter + content)
//! <base>/docs/<id>/metadata.json published documents in directory layout
//! <base>/docs/<id>/content.md
//! <base>/drafts/<id>.md          draft documents, in either layout
//! <base>/folders/<id>.json       folder records
//! <base>/permissions/<id>.json   per-document permission lists
//! <base>/users.json              user directory
//! <base>/tokens.json             API tokens
//! ```
//!
//! On top of the adapter, [`LocalProvider`] exposes the Drive-style
//! [`Provider`](ws_core::Provider) contract and [`DocumentIndexer`] republishes
//! documents to a search index.
//!
//! All operations block on file I/O and cannot be cancelled once started.
//!
//! # Example
//!
//! ```ignore
//! use ws_core::{DocumentCreate, DocumentStorage};
//! use ws_local::{LocalAdapter, LocalConfig};
//!
//! let adapter = LocalAdapter::new(LocalConfig::new("/var/lib/ws"))?;
//! let doc = adapter.create_document(DocumentCreate {
//!     name: "RFC-1".to_owned(),
//!     parent_folder_id: "drafts".to_owned(),
//!     content: "Hello {{x}}".to_owned(),
//!     ..Default::default()
//! })?;
//! ```

mod auth;
mod documents;
mod folders;
mod frontmatter;
mod indexer;
mod locks;
mod metadata;
mod notification;
mod people;
mod permissions;
mod provider;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::RngExt;

use ws_core::{
    AuthService, Document, DocumentStorage, Location, MARKDOWN_MIME_TYPE, NotificationService,
    PeopleService, Permission, StorageProvider, WorkspaceError,
};

pub use auth::LocalAuthService;
pub use frontmatter::FrontmatterError;
pub use indexer::{DocumentIndexer, IndexStats};
pub use notification::LogNotificationService;
pub use people::LocalPeopleService;
pub use provider::{LocalProvider, permission_id};

use frontmatter::DocumentMetadata;
use locks::MutexTable;
use metadata::{DOCUMENT_EXTENSION, MetadataStore};
use permissions::{LEGACY_PERMISSIONS_KEY, PermissionStore, legacy_permissions};

/// Resolved filesystem locations of a local workspace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalConfig {
    /// Root directory of the workspace.
    pub base_path: PathBuf,
    /// Published documents.
    pub docs_path: PathBuf,
    /// Draft documents.
    pub drafts_path: PathBuf,
    /// Folder records.
    pub folders_path: PathBuf,
    /// Permission sidecar files.
    pub permissions_path: PathBuf,
    /// User directory file.
    pub users_path: PathBuf,
    /// Token file.
    pub tokens_path: PathBuf,
}

impl LocalConfig {
    /// Default layout under `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        Self {
            docs_path: base_path.join("docs"),
            drafts_path: base_path.join("drafts"),
            folders_path: base_path.join("folders"),
            permissions_path: base_path.join("permissions"),
            users_path: base_path.join("users.json"),
            tokens_path: base_path.join("tokens.json"),
            base_path,
        }
    }
}

/// Local filesystem workspace.
pub struct LocalAdapter {
    config: LocalConfig,
    store: MetadataStore,
    permissions: PermissionStore,
    /// Held across multi-step mutations of one document.
    doc_locks: MutexTable<String>,
    people: LocalPeopleService,
    auth: LocalAuthService,
    notifications: LogNotificationService,
}

impl LocalAdapter {
    /// Open a workspace, creating its directories if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty base path, or an I/O error if a
    /// directory cannot be created.
    pub fn new(config: LocalConfig) -> Result<Self, WorkspaceError> {
        if config.base_path.as_os_str().is_empty() {
            return Err(WorkspaceError::invalid_input("base_path", "cannot be empty"));
        }
        for dir in [
            &config.docs_path,
            &config.drafts_path,
            &config.folders_path,
            &config.permissions_path,
        ] {
            fs::create_dir_all(dir).map_err(|e| WorkspaceError::io(e, Some(dir.clone())))?;
        }
        tracing::debug!(base_path = %config.base_path.display(), "Opened local workspace");

        Ok(Self {
            permissions: PermissionStore::new(config.permissions_path.clone()),
            people: LocalPeopleService::new(config.users_path.clone()),
            auth: LocalAuthService::new(config.tokens_path.clone(), config.users_path.clone()),
            notifications: LogNotificationService,
            store: MetadataStore::new(),
            doc_locks: MutexTable::new(),
            config,
        })
    }

    /// Workspace configuration.
    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    /// Directory holding documents of a location.
    pub fn root(&self, location: Location) -> &Path {
        match location {
            Location::Published => &self.config.docs_path,
            Location::Draft => &self.config.drafts_path,
        }
    }

    /// Path of a document in `location`: its directory if one holds a
    /// `metadata.json`, otherwise the `<id>.md` file.
    fn document_path(&self, id: &str, location: Location) -> PathBuf {
        let dir = self.root(location).join(id);
        if self.store.exists(&dir) {
            dir
        } else {
            self.document_file_path(id, location)
        }
    }

    fn document_file_path(&self, id: &str, location: Location) -> PathBuf {
        self.root(location)
            .join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    /// Locate a document, published root first.
    fn find_document(&self, id: &str) -> Result<(PathBuf, Location), WorkspaceError> {
        validate_id(id)?;
        Location::ALL
            .into_iter()
            .map(|location| (self.document_path(id, location), location))
            .find(|(path, _)| self.store.exists(path))
            .ok_or_else(|| WorkspaceError::not_found("document", id))
    }

    /// Load a document with content and permissions.
    fn load_document(&self, id: &str) -> Result<Document, WorkspaceError> {
        let (path, location) = self.find_document(id)?;
        let (meta, content) = self
            .store
            .get_with_content(&path)
            .map_err(|e| not_found_as_document(e, id))?;
        let permissions = self.readable_permissions(&meta);
        Ok(to_document(meta, content, location, permissions))
    }

    /// Permissions from the sidecar file, falling back to embedded metadata.
    fn permissions_of(&self, meta: &DocumentMetadata) -> Result<Vec<Permission>, WorkspaceError> {
        match self.permissions.load(&meta.id)? {
            Some(permissions) => Ok(permissions),
            None => Ok(legacy_permissions(&meta.metadata)),
        }
    }

    /// [`permissions_of`](Self::permissions_of) for read paths.
    ///
    /// An unreadable sidecar file is logged and the embedded permissions are
    /// used instead. Permission writes still fail on it.
    fn readable_permissions(&self, meta: &DocumentMetadata) -> Vec<Permission> {
        self.permissions_of(meta).unwrap_or_else(|e| {
            tracing::warn!(id = %meta.id, error = %e, "Ignoring unreadable permission file");
            legacy_permissions(&meta.metadata)
        })
    }

    /// Read-modify-write a document's permissions under its lock.
    ///
    /// Embedded permissions of older documents are moved to the sidecar file.
    pub(crate) fn modify_permissions<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Vec<Permission>) -> Result<T, WorkspaceError>,
    ) -> Result<T, WorkspaceError> {
        validate_id(id)?;
        self.doc_locks.with(&id.to_owned(), || {
            let (path, _) = self.find_document(id)?;
            let (mut meta, content) = self
                .store
                .get_with_content(&path)
                .map_err(|e| not_found_as_document(e, id))?;
            let mut permissions = self.permissions_of(&meta)?;
            let result = f(&mut permissions)?;
            self.permissions.save(id, &permissions)?;

            if meta.metadata.remove(LEGACY_PERMISSIONS_KEY).is_some() {
                meta.modified_time = next_modified_time(meta.modified_time);
                self.store.set(&path, &meta, &content)?;
                tracing::info!(id = %id, "Moved embedded permissions to sidecar file");
            }
            Ok(result)
        })
    }

    fn folder_path(&self, id: &str) -> PathBuf {
        self.config.folders_path.join(format!("{id}.json"))
    }
}

impl StorageProvider for LocalAdapter {
    fn document_storage(&self) -> &dyn DocumentStorage {
        self
    }

    fn people_service(&self) -> &dyn PeopleService {
        &self.people
    }

    fn notification_service(&self) -> &dyn NotificationService {
        &self.notifications
    }

    fn auth_service(&self) -> &dyn AuthService {
        &self.auth
    }
}

/// New random 128-bit identifier, hex encoded.
fn generate_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Reject identifiers that cannot safely become file names.
fn validate_id(id: &str) -> Result<(), WorkspaceError> {
    if id.is_empty() {
        return Err(WorkspaceError::invalid_input("id", "cannot be empty"));
    }
    if id.contains(['/', '\\']) || id.contains("..") || id.contains('\0') {
        return Err(WorkspaceError::invalid_input("id", "contains path characters")
            .with_resource("document", id));
    }
    Ok(())
}

/// Successor of `previous` for `modified_time`: now, but never earlier than 1µs later.
fn next_modified_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous + chrono::Duration::microseconds(1))
}

/// A file that vanished between lookup and read is a missing document.
fn not_found_as_document(err: WorkspaceError, id: &str) -> WorkspaceError {
    if err.is(ws_core::ErrorKind::NotFound) {
        WorkspaceError::not_found("document", id)
    } else {
        err.with_resource("document", id)
    }
}

fn to_document(
    meta: DocumentMetadata,
    content: String,
    location: Location,
    permissions: Vec<Permission>,
) -> Document {
    let mut metadata = meta.metadata;
    metadata.remove(LEGACY_PERMISSIONS_KEY);
    Document {
        id: meta.id,
        name: meta.name,
        content,
        mime_type: MARKDOWN_MIME_TYPE.to_owned(),
        parent_folder_id: meta.parent_folder_id,
        location,
        created_time: meta.created_time,
        modified_time: meta.modified_time,
        owner: meta.owner,
        permissions,
        thumbnail_url: meta.thumbnail_url,
        metadata,
        trashed: meta.trashed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ws_core::ErrorKind;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_local_adapter_is_send_sync() {
        assert_send_sync::<LocalAdapter>();
    }

    #[test]
    fn test_config_defaults() {
        let config = LocalConfig::new("/ws");

        assert_eq!(config.docs_path, PathBuf::from("/ws/docs"));
        assert_eq!(config.drafts_path, PathBuf::from("/ws/drafts"));
        assert_eq!(config.folders_path, PathBuf::from("/ws/folders"));
        assert_eq!(config.permissions_path, PathBuf::from("/ws/permissions"));
        assert_eq!(config.users_path, PathBuf::from("/ws/users.json"));
        assert_eq!(config.tokens_path, PathBuf::from("/ws/tokens.json"));
    }

    #[test]
    fn test_new_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();

        LocalAdapter::new(LocalConfig::new(temp_dir.path())).unwrap();

        for dir in ["docs", "drafts", "folders", "permissions"] {
            assert!(temp_dir.path().join(dir).is_dir(), "{dir} missing");
        }
    }

    #[test]
    fn test_new_rejects_empty_base_path() {
        let err = LocalAdapter::new(LocalConfig::new("")).err().unwrap();

        assert!(err.is(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();

        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_id());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("abc123").is_ok());
        for bad in ["", "a/b", "..", "a\\b", "x..y"] {
            let err = validate_id(bad).unwrap_err();
            assert!(err.is(ErrorKind::InvalidInput), "{bad:?}");
        }
    }

    #[test]
    fn test_next_modified_time_strictly_increases() {
        let future = Utc::now() + chrono::Duration::hours(1);

        let next = next_modified_time(future);

        assert!(next > future);
    }

    #[test]
    fn test_next_modified_time_uses_now() {
        let past = Utc::now() - chrono::Duration::hours(1);
        let before = Utc::now();

        let next = next_modified_time(past);

        assert!(next >= before);
    }
}

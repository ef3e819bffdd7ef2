//! Backend-agnostic workspace contract.
//!
//! This crate defines what a document workspace backend must provide, without
//! tying callers to where files live:
//!
//! - [`DocumentStorage`] for documents, folders and revisions
//! - [`PeopleService`], [`NotificationService`] and [`AuthService`] collaborators,
//!   bundled by [`StorageProvider`]
//! - [`Provider`], a Drive/Docs/People-style file contract consumed by API handlers
//! - [`SearchIndex`], the seam the indexer pushes documents through
//! - [`WorkspaceError`], the single error type every backend reports
//!
//! # Example
//!
//! ```ignore
//! use ws_core::{DocumentCreate, DocumentStorage};
//!
//! let doc = storage.create_document(DocumentCreate {
//!     name: "RFC-001".to_owned(),
//!     parent_folder_id: "docs".to_owned(),
//!     content: "# Hello".to_owned(),
//!     ..Default::default()
//! })?;
//! let loaded = storage.get_document(&doc.id)?;
//! ```

mod error;
mod provider;
mod search;
mod storage;
mod types;

pub use error::{ErrorKind, ErrorStatus, WorkspaceError};
pub use provider::{
    DocBody, DocRequest, DocUpdateResponse, EmailAddress, FOLDER_MIME_TYPE, File, FilePermission,
    FileRevision, FileUser, Group, PeopleSearchOptions, Person, PersonName, Photo, Provider,
    SHORTCUT_MIME_TYPE, ShortcutDetails,
};
pub use search::{SearchDocument, SearchIndex};
pub use storage::{
    AuthService, DocumentStorage, NotificationService, PeopleService, StorageProvider,
};
pub use types::{
    AuthInfo, Document, DocumentCreate, DocumentUpdate, Folder, ListOptions, Location,
    MARKDOWN_MIME_TYPE, MetadataMap, Permission, Revision, User, UserInfo,
};

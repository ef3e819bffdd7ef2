//! Storage and collaborator traits.
//!
//! [`DocumentStorage`] is the business-level contract every backend implements.
//! [`StorageProvider`] bundles it with the people, notification and auth
//! collaborators a backend ships with.
//!
//! All operations are synchronous and uncancellable: a call blocks on I/O
//! and runs to completion once started.

use std::collections::HashMap;

use crate::error::WorkspaceError;
use crate::types::{
    AuthInfo, Document, DocumentCreate, DocumentUpdate, Folder, ListOptions, Revision, User,
    UserInfo,
};

/// Document and folder operations.
pub trait DocumentStorage: Send + Sync {
    /// Retrieve a document with its content, wherever it is stored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no document has this id.
    fn get_document(&self, id: &str) -> Result<Document, WorkspaceError>;

    /// Create a document with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty name, `NotFound` for a missing template.
    fn create_document(&self, doc: DocumentCreate) -> Result<Document, WorkspaceError>;

    /// Apply a partial update and return the refreshed document.
    fn update_document(
        &self,
        id: &str,
        updates: DocumentUpdate,
    ) -> Result<Document, WorkspaceError>;

    /// Delete a document. A document that is already gone is not an error.
    fn delete_document(&self, id: &str) -> Result<(), WorkspaceError>;

    /// List documents in a folder (without content).
    fn list_documents(
        &self,
        folder_id: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Document>, WorkspaceError>;

    /// Read a document's content.
    fn get_document_content(&self, id: &str) -> Result<String, WorkspaceError> {
        self.get_document(id).map(|doc| doc.content)
    }

    /// Replace a document's content.
    fn update_document_content(&self, id: &str, content: &str) -> Result<(), WorkspaceError> {
        self.update_document(
            id,
            DocumentUpdate {
                content: Some(content.to_owned()),
                ..Default::default()
            },
        )
        .map(|_| ())
    }

    /// Replace every `{{key}}` placeholder with its value.
    fn replace_text_in_document(
        &self,
        id: &str,
        replacements: &HashMap<String, String>,
    ) -> Result<(), WorkspaceError>;

    /// Copy a document under a new id into `dest_folder_id`.
    fn copy_document(
        &self,
        source_id: &str,
        dest_folder_id: &str,
        name: &str,
    ) -> Result<Document, WorkspaceError>;

    /// Move a document to another folder.
    fn move_document(&self, id: &str, dest_folder_id: &str) -> Result<(), WorkspaceError> {
        self.update_document(
            id,
            DocumentUpdate {
                parent_folder_id: Some(dest_folder_id.to_owned()),
                ..Default::default()
            },
        )
        .map(|_| ())
    }

    /// Create a folder.
    fn create_folder(&self, name: &str, parent_id: &str) -> Result<Folder, WorkspaceError>;

    /// Retrieve a folder.
    fn get_folder(&self, id: &str) -> Result<Folder, WorkspaceError>;

    /// List direct children of a folder.
    fn list_folders(&self, parent_id: &str) -> Result<Vec<Folder>, WorkspaceError>;

    /// Find a direct child folder by name. `Ok(None)` if there is none.
    fn get_subfolder(&self, parent_id: &str, name: &str)
    -> Result<Option<Folder>, WorkspaceError>;

    /// List revisions of a document.
    fn list_revisions(&self, id: &str) -> Result<Vec<Revision>, WorkspaceError>;

    /// Retrieve a specific revision.
    fn get_revision(&self, id: &str, revision_id: &str) -> Result<Revision, WorkspaceError>;

    /// Retrieve the latest revision.
    fn get_latest_revision(&self, id: &str) -> Result<Revision, WorkspaceError>;
}

/// User directory lookups.
pub trait PeopleService: Send + Sync {
    /// Look up a user by email.
    fn get_user(&self, email: &str) -> Result<User, WorkspaceError>;

    /// Users whose email or name contains `query` (case-insensitive).
    fn search_users(&self, query: &str) -> Result<Vec<User>, WorkspaceError>;

    /// Photo URL of a user.
    fn get_user_photo(&self, email: &str) -> Result<String, WorkspaceError> {
        self.get_user(email).map(|user| user.photo_url)
    }
}

/// Outgoing mail.
pub trait NotificationService: Send + Sync {
    /// Send a plain text email.
    fn send_email(
        &self,
        to: &[String],
        from: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), WorkspaceError>;

    /// Send an HTML email.
    fn send_html_email(
        &self,
        to: &[String],
        from: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), WorkspaceError>;
}

/// Token validation.
pub trait AuthService: Send + Sync {
    /// Validate a token. Unknown or expired tokens are reported as invalid, not as errors.
    fn validate_token(&self, token: &str) -> Result<AuthInfo, WorkspaceError>;

    /// Resolve the user behind a valid token.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for invalid tokens.
    fn get_user_info(&self, token: &str) -> Result<UserInfo, WorkspaceError>;
}

/// A backend with all of its services.
pub trait StorageProvider: Send + Sync {
    /// Document storage.
    fn document_storage(&self) -> &dyn DocumentStorage;

    /// User directory.
    fn people_service(&self) -> &dyn PeopleService;

    /// Mail delivery.
    fn notification_service(&self) -> &dyn NotificationService;

    /// Token validation.
    fn auth_service(&self) -> &dyn AuthService;
}

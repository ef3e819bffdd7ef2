//! External file-provider contract.
//!
//! API handlers talk to a Drive/Docs/People-style provider. Backends present
//! their documents, folders and permissions through [`Provider`] so handlers
//! depend on one interface regardless of where files actually live.

use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;

/// MIME type of folder files.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type of shortcut files.
pub const SHORTCUT_MIME_TYPE: &str = "application/vnd.google-apps.shortcut";

/// File object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// File ID.
    pub id: String,
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Creation time (RFC 3339).
    pub created_time: String,
    /// Modification time (RFC 3339).
    pub modified_time: String,
    /// Parent folder IDs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    /// Owners.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<FileUser>,
    /// Thumbnail link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    /// Shortcut target (shortcut files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut_details: Option<ShortcutDetails>,
}

/// User reference on a file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUser {
    /// Email address.
    pub email_address: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
}

/// Shortcut target details.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutDetails {
    /// Target file ID.
    pub target_id: String,
    /// Target MIME type.
    pub target_mime_type: String,
}

/// Permission on a file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePermission {
    /// Permission ID.
    pub id: String,
    /// Grantee type ("user", "group", "domain").
    #[serde(rename = "type")]
    pub kind: String,
    /// Grantee email.
    pub email_address: String,
    /// Role ("owner", "writer", "commenter", "reader").
    pub role: String,
}

/// File revision.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRevision {
    /// Revision ID.
    pub id: String,
    /// Modification time (RFC 3339).
    pub modified_time: String,
    /// Whether the revision is pinned.
    pub keep_forever: bool,
    /// Who made the revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modifying_user: Option<FileUser>,
}

/// Person in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Resource name (e.g., "people/alice@example.com").
    pub resource_name: String,
    /// Entity tag.
    pub etag: String,
    /// Names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<PersonName>,
    /// Email addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<EmailAddress>,
    /// Photos.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
}

/// Person name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    /// Display name.
    pub display_name: String,
    /// Given name.
    #[serde(default)]
    pub given_name: String,
    /// Family name.
    #[serde(default)]
    pub family_name: String,
}

/// Email address entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct EmailAddress {
    /// Address.
    pub value: String,
    /// Address type (e.g., "work").
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Photo entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Photo {
    /// Photo URL.
    pub url: String,
}

/// Directory search options.
#[derive(Debug, Clone, Default)]
pub struct PeopleSearchOptions {
    /// Free-text query matched against names and emails.
    pub query: String,
    /// Maximum number of results (0 = unlimited).
    pub max_results: usize,
}

/// Group in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Group {
    /// Group email.
    pub email: String,
    /// Group name.
    pub name: String,
}

/// Document body as seen by the Docs-style API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocBody {
    /// Document ID.
    pub document_id: String,
    /// Document title.
    pub title: String,
    /// Plain text body.
    pub body: String,
}

/// Docs-style batch update request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocRequest {
    /// Replace every occurrence of `find` with `replace`.
    ReplaceAllText {
        /// Text to find.
        find: String,
        /// Replacement.
        replace: String,
        /// Case-sensitive match.
        match_case: bool,
    },
    /// Insert text at a character index.
    InsertText {
        /// Character index.
        index: usize,
        /// Text to insert.
        text: String,
    },
    /// Delete a character range.
    DeleteContentRange {
        /// Start index (inclusive).
        start: usize,
        /// End index (exclusive).
        end: usize,
    },
    /// Apply named style to a range.
    UpdateTextStyle {
        /// Start index (inclusive).
        start: usize,
        /// End index (exclusive).
        end: usize,
        /// Style name.
        style: String,
    },
}

impl DocRequest {
    /// Request name for error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReplaceAllText { .. } => "replaceAllText",
            Self::InsertText { .. } => "insertText",
            Self::DeleteContentRange { .. } => "deleteContentRange",
            Self::UpdateTextStyle { .. } => "updateTextStyle",
        }
    }
}

/// Result of a Docs-style batch update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocUpdateResponse {
    /// Document ID.
    pub document_id: String,
    /// Number of occurrences changed per request.
    pub occurrences_changed: Vec<usize>,
}

/// Drive/Docs/People-style provider used by API handlers.
pub trait Provider: Send + Sync {
    /// Get a file (document or folder).
    fn get_file(&self, file_id: &str) -> Result<File, WorkspaceError>;

    /// Copy a file into a folder under a new name.
    fn copy_file(&self, src_id: &str, dest_folder_id: &str, name: &str)
    -> Result<File, WorkspaceError>;

    /// Move a file to another folder.
    fn move_file(&self, file_id: &str, dest_folder_id: &str) -> Result<File, WorkspaceError>;

    /// Delete a file.
    fn delete_file(&self, file_id: &str) -> Result<(), WorkspaceError>;

    /// Rename a file.
    fn rename_file(&self, file_id: &str, new_name: &str) -> Result<(), WorkspaceError>;

    /// Grant `role` to `email`, replacing any existing role for that email.
    fn share_file(&self, file_id: &str, email: &str, role: &str) -> Result<(), WorkspaceError>;

    /// Grant `role` to a whole domain.
    fn share_file_with_domain(
        &self,
        file_id: &str,
        domain: &str,
        role: &str,
    ) -> Result<(), WorkspaceError>;

    /// List permissions on a file.
    fn list_permissions(&self, file_id: &str) -> Result<Vec<FilePermission>, WorkspaceError>;

    /// Remove a permission by id.
    fn delete_permission(&self, file_id: &str, permission_id: &str)
    -> Result<(), WorkspaceError>;

    /// Create a file from a template on behalf of a user.
    fn create_file_as_user(
        &self,
        template_id: &str,
        dest_folder_id: &str,
        name: &str,
        user_email: &str,
    ) -> Result<File, WorkspaceError>;

    /// Search people by email.
    fn search_people(&self, email: &str) -> Result<Vec<Person>, WorkspaceError>;

    /// Free-text directory search.
    fn search_directory(&self, opts: &PeopleSearchOptions) -> Result<Vec<Person>, WorkspaceError>;

    /// Id of the child folder named `name` under `parent_id`.
    fn get_subfolder(&self, parent_id: &str, name: &str) -> Result<String, WorkspaceError>;

    /// Create a folder.
    fn create_folder(&self, name: &str, parent_id: &str) -> Result<File, WorkspaceError>;

    /// Create a shortcut to `target_id` inside `parent_id`.
    fn create_shortcut(&self, target_id: &str, parent_id: &str) -> Result<File, WorkspaceError>;

    /// Read a document body.
    fn get_doc(&self, file_id: &str) -> Result<DocBody, WorkspaceError>;

    /// Apply Docs-style batch updates.
    fn update_doc(
        &self,
        file_id: &str,
        requests: &[DocRequest],
    ) -> Result<DocUpdateResponse, WorkspaceError>;

    /// Latest revision of a file.
    fn get_latest_revision(&self, file_id: &str) -> Result<FileRevision, WorkspaceError>;

    /// Pin a revision.
    fn keep_revision_forever(
        &self,
        file_id: &str,
        revision_id: &str,
    ) -> Result<FileRevision, WorkspaceError>;

    /// Set or clear the pin on a revision.
    fn update_keep_revision_forever(
        &self,
        file_id: &str,
        revision_id: &str,
        keep_forever: bool,
    ) -> Result<(), WorkspaceError>;

    /// Send a plain text email.
    fn send_email(
        &self,
        to: &[String],
        from: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), WorkspaceError>;

    /// Groups in the directory matching `query`.
    fn list_groups(&self, domain: &str, query: &str, max_results: usize)
    -> Result<Vec<Group>, WorkspaceError>;

    /// Groups a user belongs to.
    fn list_user_groups(&self, user_email: &str) -> Result<Vec<Group>, WorkspaceError>;
}

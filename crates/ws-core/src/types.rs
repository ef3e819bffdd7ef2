//! Backend-agnostic document, folder, permission and identity types.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to documents and folders.
pub type MetadataMap = HashMap<String, serde_json::Value>;

/// MIME type reported for stored documents.
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";

/// Physical storage root of a document.
///
/// Decided once when a document is created (or moved to another folder) and
/// afterwards carried by where the document lives, never re-derived from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Published documents.
    #[default]
    Published,
    /// Work-in-progress drafts.
    Draft,
}

impl Location {
    /// Both locations, published first (the lookup order).
    pub const ALL: [Location; 2] = [Location::Published, Location::Draft];

    /// Classify a destination folder identifier.
    ///
    /// A folder named `drafts`, or any folder id containing `draft`, maps to
    /// [`Location::Draft`]. Only used when the caller does not state the
    /// location explicitly.
    #[must_use]
    pub fn classify(folder_id: &str) -> Self {
        if folder_id == "drafts" || folder_id.contains("draft") {
            Self::Draft
        } else {
            Self::Published
        }
    }

    /// Short lowercase name ("published" or "draft").
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document.
///
/// `content` is empty for documents returned by list operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Unique identifier (immutable once assigned).
    pub id: String,
    /// Document name/title.
    pub name: String,
    /// Body text after the metadata block.
    pub content: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// Parent folder identifier.
    pub parent_folder_id: String,
    /// Physical storage root.
    pub location: Location,
    /// Creation time.
    pub created_time: DateTime<Utc>,
    /// Last modification time.
    pub modified_time: DateTime<Utc>,
    /// Owner email.
    pub owner: String,
    /// Sharing entries.
    pub permissions: Vec<Permission>,
    /// Thumbnail URL (empty if none).
    pub thumbnail_url: String,
    /// Free-form metadata.
    pub metadata: MetadataMap,
    /// Whether the document is in the trash.
    pub trashed: bool,
}

/// Fields for creating a document.
#[derive(Debug, Clone, Default)]
pub struct DocumentCreate {
    /// Document name (required).
    pub name: String,
    /// Destination folder.
    pub parent_folder_id: String,
    /// Explicit storage root. Derived from `parent_folder_id` when `None`.
    pub location: Option<Location>,
    /// Template document whose content replaces `content`.
    pub template_id: Option<String>,
    /// Initial content.
    pub content: String,
    /// Owner email.
    pub owner: String,
    /// Initial metadata.
    pub metadata: MetadataMap,
}

/// Partial update: every `None` field is left untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    /// New name.
    pub name: Option<String>,
    /// New content.
    pub content: Option<String>,
    /// New parent folder (moves the document).
    pub parent_folder_id: Option<String>,
    /// Storage root for a move. Derived from the new folder when `None`.
    pub location: Option<Location>,
    /// New trashed flag.
    pub trashed: Option<bool>,
    /// Metadata merged key by key into the existing map.
    pub metadata: Option<MetadataMap>,
}

/// A folder record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier.
    pub id: String,
    /// Folder name.
    pub name: String,
    /// Parent folder identifier (empty for top-level folders).
    #[serde(default)]
    pub parent_id: String,
    /// Creation time.
    pub created_time: DateTime<Utc>,
    /// Last modification time.
    pub modified_time: DateTime<Utc>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: MetadataMap,
}

/// A document revision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Revision {
    /// Revision identifier.
    pub id: String,
    /// Document this revision belongs to.
    pub document_id: String,
    /// When the revision was created.
    pub modified_time: DateTime<Utc>,
    /// Who created the revision.
    pub modified_by: String,
    /// Optional revision name.
    pub name: String,
    /// Content at this revision.
    pub content: String,
}

/// Access grant on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Grantee email.
    pub email: String,
    /// Role (e.g., "owner", "writer", "commenter", "reader").
    pub role: String,
    /// Grantee type (e.g., "user", "group", "domain").
    #[serde(rename = "type")]
    pub kind: String,
}

impl Permission {
    /// User permission with the given role.
    #[must_use]
    pub fn user(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: role.into(),
            kind: "user".to_owned(),
        }
    }
}

/// Options for listing documents.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Include trashed documents.
    pub include_trashed: bool,
    /// Only documents modified strictly after this time.
    pub modified_after: Option<DateTime<Utc>>,
    /// Maximum number of results (0 = unlimited).
    pub page_size: usize,
}

/// A person in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Email address.
    pub email: String,
    /// Full name.
    pub name: String,
    /// First name.
    #[serde(alias = "givenName")]
    pub given_name: String,
    /// Last name.
    #[serde(alias = "familyName")]
    pub family_name: String,
    /// Profile photo URL.
    #[serde(alias = "photoURL", alias = "photoUrl")]
    pub photo_url: String,
}

/// Result of validating an authentication token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthInfo {
    /// Whether the token is valid and unexpired.
    pub valid: bool,
    /// Authenticated email.
    pub email: String,
    /// Token expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Identity resolved from a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInfo {
    /// User identifier.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Full name.
    pub name: String,
    /// First name.
    pub given_name: String,
    /// Last name.
    pub family_name: String,
    /// Profile picture URL.
    pub picture: String,
    /// Whether the email is verified.
    pub verified_email: bool,
}

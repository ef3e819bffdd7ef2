//! Drive-style [`Provider`] on top of [`LocalAdapter`].

use std::sync::Arc;

use regex::{NoExpand, RegexBuilder};
use sha2::{Digest, Sha256};
use ws_core::{
    DocBody, DocRequest, DocUpdateResponse, Document, DocumentCreate, DocumentStorage,
    DocumentUpdate, EmailAddress, ErrorKind, FOLDER_MIME_TYPE, File, FilePermission,
    FileRevision, FileUser, Folder, Group, MARKDOWN_MIME_TYPE, NotificationService,
    PeopleSearchOptions, PeopleService, Permission, Person, PersonName, Photo, Provider,
    SHORTCUT_MIME_TYPE, ShortcutDetails, User, WorkspaceError,
};

use crate::LocalAdapter;
use crate::documents::LATEST_REVISION_ID;
use crate::frontmatter::format_time;

const SHORTCUT_TARGET_ID_KEY: &str = "shortcut_target_id";
const SHORTCUT_TARGET_MIME_KEY: &str = "shortcut_target_mime_type";
const CREATED_AS_USER_KEY: &str = "created_as_user";

/// Stable permission id for an email: `perm-` + first 8 bytes of its SHA-256.
pub fn permission_id(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    let digest = hasher.finalize();
    format!("perm-{}", hex::encode(&digest[..8]))
}

/// [`Provider`] backed by a local workspace.
#[derive(Clone)]
pub struct LocalProvider {
    adapter: Arc<LocalAdapter>,
}

impl LocalProvider {
    pub fn new(adapter: Arc<LocalAdapter>) -> Self {
        Self { adapter }
    }

    /// Underlying adapter.
    pub fn adapter(&self) -> &LocalAdapter {
        &self.adapter
    }
}

fn document_to_file(doc: &Document) -> File {
    let shortcut_details = doc
        .metadata
        .get(SHORTCUT_TARGET_ID_KEY)
        .and_then(|v| v.as_str())
        .map(|target_id| ShortcutDetails {
            target_id: target_id.to_owned(),
            target_mime_type: doc
                .metadata
                .get(SHORTCUT_TARGET_MIME_KEY)
                .and_then(|v| v.as_str())
                .unwrap_or(MARKDOWN_MIME_TYPE)
                .to_owned(),
        });
    File {
        id: doc.id.clone(),
        name: doc.name.clone(),
        mime_type: if shortcut_details.is_some() {
            SHORTCUT_MIME_TYPE.to_owned()
        } else {
            doc.mime_type.clone()
        },
        created_time: format_time(doc.created_time),
        modified_time: format_time(doc.modified_time),
        parents: non_empty(&doc.parent_folder_id),
        owners: non_empty(&doc.owner)
            .into_iter()
            .map(|email| FileUser {
                email_address: email,
                display_name: String::new(),
            })
            .collect(),
        thumbnail_link: (!doc.thumbnail_url.is_empty()).then(|| doc.thumbnail_url.clone()),
        shortcut_details,
    }
}

fn folder_to_file(folder: &Folder) -> File {
    File {
        id: folder.id.clone(),
        name: folder.name.clone(),
        mime_type: FOLDER_MIME_TYPE.to_owned(),
        created_time: format_time(folder.created_time),
        modified_time: format_time(folder.modified_time),
        parents: non_empty(&folder.parent_id),
        ..Default::default()
    }
}

fn permission_to_file_permission(perm: &Permission) -> FilePermission {
    FilePermission {
        id: permission_id(&perm.email),
        kind: perm.kind.clone(),
        email_address: perm.email.clone(),
        role: perm.role.clone(),
    }
}

fn user_to_person(user: User) -> Person {
    Person {
        resource_name: format!("people/{}", user.email),
        etag: String::new(),
        names: vec![PersonName {
            display_name: user.name,
            given_name: user.given_name,
            family_name: user.family_name,
        }],
        email_addresses: vec![EmailAddress {
            value: user.email,
            kind: "work".to_owned(),
        }],
        photos: non_empty(&user.photo_url)
            .into_iter()
            .map(|url| Photo { url })
            .collect(),
    }
}

fn non_empty(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_owned()]
    }
}

/// Replace every match of `find`, returning the new text and the match count.
fn replace_all_text(
    text: &str,
    find: &str,
    replace: &str,
    match_case: bool,
) -> Result<(String, usize), WorkspaceError> {
    if find.is_empty() {
        return Err(WorkspaceError::invalid_input("replaceAllText.find", "cannot be empty"));
    }
    let pattern = RegexBuilder::new(&regex::escape(find))
        .case_insensitive(!match_case)
        .build()
        .map_err(|e| WorkspaceError::invalid_input("replaceAllText.find", &e.to_string()))?;
    let count = pattern.find_iter(text).count();
    Ok((pattern.replace_all(text, NoExpand(replace)).into_owned(), count))
}

impl LocalProvider {
    fn latest_revision(&self, file_id: &str) -> Result<FileRevision, WorkspaceError> {
        let revision = self.adapter.get_latest_revision(file_id)?;
        Ok(FileRevision {
            id: revision.id,
            modified_time: format_time(revision.modified_time),
            keep_forever: false,
            last_modifying_user: (!revision.modified_by.is_empty()).then(|| FileUser {
                email_address: revision.modified_by,
                display_name: String::new(),
            }),
        })
    }

    fn check_revision_id(file_id: &str, revision_id: &str) -> Result<(), WorkspaceError> {
        if revision_id == LATEST_REVISION_ID {
            Ok(())
        } else {
            Err(WorkspaceError::not_found("revision", revision_id)
                .with_message(format!("only \"latest\" is available for {file_id}")))
        }
    }
}

impl Provider for LocalProvider {
    fn get_file(&self, file_id: &str) -> Result<File, WorkspaceError> {
        match self.adapter.get_document(file_id) {
            Ok(doc) => return Ok(document_to_file(&doc)),
            Err(e) if !e.is(ErrorKind::NotFound) => return Err(e),
            Err(_) => {}
        }
        match self.adapter.get_folder(file_id) {
            Ok(folder) => Ok(folder_to_file(&folder)),
            Err(e) if e.is(ErrorKind::NotFound) => Err(WorkspaceError::not_found("file", file_id)),
            Err(e) => Err(e),
        }
    }

    fn copy_file(
        &self,
        src_id: &str,
        dest_folder_id: &str,
        name: &str,
    ) -> Result<File, WorkspaceError> {
        let doc = self.adapter.copy_document(src_id, dest_folder_id, name)?;
        Ok(document_to_file(&doc))
    }

    fn move_file(&self, file_id: &str, dest_folder_id: &str) -> Result<File, WorkspaceError> {
        let doc = self.adapter.update_document(
            file_id,
            DocumentUpdate {
                parent_folder_id: Some(dest_folder_id.to_owned()),
                ..Default::default()
            },
        )?;
        Ok(document_to_file(&doc))
    }

    fn delete_file(&self, file_id: &str) -> Result<(), WorkspaceError> {
        self.adapter.delete_document(file_id)
    }

    fn rename_file(&self, file_id: &str, new_name: &str) -> Result<(), WorkspaceError> {
        self.adapter
            .update_document(
                file_id,
                DocumentUpdate {
                    name: Some(new_name.to_owned()),
                    ..Default::default()
                },
            )
            .map(|_| ())
    }

    fn share_file(&self, file_id: &str, email: &str, role: &str) -> Result<(), WorkspaceError> {
        if email.is_empty() {
            return Err(WorkspaceError::invalid_input("email", "cannot be empty"));
        }
        if role.is_empty() {
            return Err(WorkspaceError::invalid_input("role", "cannot be empty"));
        }
        self.adapter.modify_permissions(file_id, |perms| {
            match perms.iter_mut().find(|p| p.email == email) {
                Some(existing) => existing.role = role.to_owned(),
                None => perms.push(Permission::user(email, role)),
            }
            Ok(())
        })?;
        tracing::info!(file = %file_id, email = %email, role = %role, "Shared file");
        Ok(())
    }

    fn share_file_with_domain(
        &self,
        file_id: &str,
        domain: &str,
        role: &str,
    ) -> Result<(), WorkspaceError> {
        tracing::debug!(
            file = %file_id,
            domain = %domain,
            role = %role,
            "Domain sharing is not supported locally, ignoring"
        );
        Ok(())
    }

    fn list_permissions(&self, file_id: &str) -> Result<Vec<FilePermission>, WorkspaceError> {
        let doc = self.adapter.get_document(file_id)?;
        Ok(doc
            .permissions
            .iter()
            .map(permission_to_file_permission)
            .collect())
    }

    fn delete_permission(
        &self,
        file_id: &str,
        permission_id_to_delete: &str,
    ) -> Result<(), WorkspaceError> {
        self.adapter.modify_permissions(file_id, |perms| {
            let before = perms.len();
            perms.retain(|p| permission_id(&p.email) != permission_id_to_delete);
            if perms.len() == before {
                return Err(WorkspaceError::not_found(
                    "permission",
                    permission_id_to_delete,
                ));
            }
            Ok(())
        })?;
        tracing::info!(
            file = %file_id,
            permission = %permission_id_to_delete,
            "Deleted permission"
        );
        Ok(())
    }

    fn create_file_as_user(
        &self,
        template_id: &str,
        dest_folder_id: &str,
        name: &str,
        user_email: &str,
    ) -> Result<File, WorkspaceError> {
        let template = self.adapter.get_document(template_id)?;
        let mut metadata = template.metadata;
        metadata.insert(
            CREATED_AS_USER_KEY.to_owned(),
            serde_json::Value::from(user_email),
        );
        let doc = self.adapter.create_document(DocumentCreate {
            name: name.to_owned(),
            parent_folder_id: dest_folder_id.to_owned(),
            content: template.content,
            owner: user_email.to_owned(),
            metadata,
            ..Default::default()
        })?;
        Ok(document_to_file(&doc))
    }

    fn search_people(&self, email: &str) -> Result<Vec<Person>, WorkspaceError> {
        let users = self.adapter.people.search_users(email)?;
        Ok(users.into_iter().map(user_to_person).collect())
    }

    fn search_directory(&self, opts: &PeopleSearchOptions) -> Result<Vec<Person>, WorkspaceError> {
        let mut users = self.adapter.people.search_users(&opts.query)?;
        if opts.max_results > 0 {
            users.truncate(opts.max_results);
        }
        Ok(users.into_iter().map(user_to_person).collect())
    }

    fn get_subfolder(&self, parent_id: &str, name: &str) -> Result<String, WorkspaceError> {
        self.adapter
            .get_subfolder(parent_id, name)?
            .map(|folder| folder.id)
            .ok_or_else(|| WorkspaceError::not_found("folder", name))
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<File, WorkspaceError> {
        let folder = self.adapter.create_folder(name, parent_id)?;
        Ok(folder_to_file(&folder))
    }

    fn create_shortcut(&self, target_id: &str, parent_id: &str) -> Result<File, WorkspaceError> {
        let target = self.get_file(target_id)?;
        let mut metadata = ws_core::MetadataMap::new();
        metadata.insert(
            SHORTCUT_TARGET_ID_KEY.to_owned(),
            serde_json::Value::from(target_id),
        );
        metadata.insert(
            SHORTCUT_TARGET_MIME_KEY.to_owned(),
            serde_json::Value::from(target.mime_type.as_str()),
        );
        let doc = self.adapter.create_document(DocumentCreate {
            name: format!("Shortcut to {}", target.name),
            parent_folder_id: parent_id.to_owned(),
            content: format!("[Shortcut to {target_id}]"),
            metadata,
            ..Default::default()
        })?;
        tracing::info!(id = %doc.id, target = %target_id, "Created shortcut");
        Ok(document_to_file(&doc))
    }

    fn get_doc(&self, file_id: &str) -> Result<DocBody, WorkspaceError> {
        let doc = self.adapter.get_document(file_id)?;
        Ok(DocBody {
            document_id: doc.id,
            title: doc.name,
            body: doc.content,
        })
    }

    fn update_doc(
        &self,
        file_id: &str,
        requests: &[DocRequest],
    ) -> Result<DocUpdateResponse, WorkspaceError> {
        if let Some(unsupported) = requests
            .iter()
            .find(|r| !matches!(r, DocRequest::ReplaceAllText { .. }))
        {
            return Err(WorkspaceError::not_implemented(unsupported.name())
                .with_resource("document", file_id));
        }

        let occurrences_changed = self.adapter.modify_content(file_id, |current| {
            let mut text = current.to_owned();
            let mut counts = Vec::with_capacity(requests.len());
            for request in requests {
                if let DocRequest::ReplaceAllText {
                    find,
                    replace,
                    match_case,
                } = request
                {
                    let (replaced, count) = replace_all_text(&text, find, replace, *match_case)?;
                    text = replaced;
                    counts.push(count);
                }
            }
            Ok((text, counts))
        })?;

        Ok(DocUpdateResponse {
            document_id: file_id.to_owned(),
            occurrences_changed,
        })
    }

    fn get_latest_revision(&self, file_id: &str) -> Result<FileRevision, WorkspaceError> {
        self.latest_revision(file_id)
    }

    fn keep_revision_forever(
        &self,
        file_id: &str,
        revision_id: &str,
    ) -> Result<FileRevision, WorkspaceError> {
        let mut revision = self.latest_revision(file_id)?;
        Self::check_revision_id(file_id, revision_id)?;
        revision.keep_forever = true;
        Ok(revision)
    }

    fn update_keep_revision_forever(
        &self,
        file_id: &str,
        revision_id: &str,
        keep_forever: bool,
    ) -> Result<(), WorkspaceError> {
        self.latest_revision(file_id)?;
        Self::check_revision_id(file_id, revision_id)?;
        tracing::debug!(file = %file_id, keep_forever, "Revision pinning is not persisted locally");
        Ok(())
    }

    fn send_email(
        &self,
        to: &[String],
        from: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), WorkspaceError> {
        self.adapter
            .notifications
            .send_email(to, from, subject, body)
    }

    fn list_groups(
        &self,
        _domain: &str,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<Group>, WorkspaceError> {
        Ok(Vec::new())
    }

    fn list_user_groups(&self, _user_email: &str) -> Result<Vec<Group>, WorkspaceError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::thread;

    use pretty_assertions::assert_eq;
    use ws_core::{ListOptions, Location};

    use super::*;
    use crate::LocalConfig;

    fn create_provider() -> (tempfile::TempDir, LocalProvider) {
        let temp_dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(LocalConfig::new(temp_dir.path())).unwrap();
        (temp_dir, LocalProvider::new(Arc::new(adapter)))
    }

    fn create(provider: &LocalProvider, name: &str, folder: &str, content: &str) -> Document {
        provider
            .adapter()
            .create_document(DocumentCreate {
                name: name.to_owned(),
                parent_folder_id: folder.to_owned(),
                content: content.to_owned(),
                owner: "alice@example.com".to_owned(),
                ..Default::default()
            })
            .unwrap()
    }

    fn replace_request(find: &str, replace: &str) -> DocRequest {
        DocRequest::ReplaceAllText {
            find: find.to_owned(),
            replace: replace.to_owned(),
            match_case: true,
        }
    }

    #[test]
    fn test_permission_id_is_stable_and_distinct() {
        let a = permission_id("a@example.com");

        assert_eq!(a, permission_id("a@example.com"));
        assert_ne!(a, permission_id("b@example.com"));
        assert!(a.starts_with("perm-"));
        assert_eq!(a.len(), "perm-".len() + 16);
    }

    #[test]
    fn test_replace_all_text_case_sensitive() {
        let (text, count) = replace_all_text("Foo foo FOO", "foo", "bar", true).unwrap();

        assert_eq!(text, "Foo bar FOO");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replace_all_text_case_insensitive() {
        let (text, count) = replace_all_text("Foo foo FOO", "foo", "bar", false).unwrap();

        assert_eq!(text, "bar bar bar");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_replace_all_text_is_literal() {
        let (text, _) = replace_all_text("cost: $1.00 (a+b)", "(a+b)", "$2", true).unwrap();

        assert_eq!(text, "cost: $1.00 $2");
    }

    #[test]
    fn test_replace_all_text_empty_find() {
        let err = replace_all_text("x", "", "y", true).unwrap_err();

        assert!(err.is(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_user_to_person() {
        let person = user_to_person(User {
            email: "a@example.com".to_owned(),
            name: "Ada Lovelace".to_owned(),
            given_name: "Ada".to_owned(),
            family_name: "Lovelace".to_owned(),
            photo_url: String::new(),
        });

        assert_eq!(person.resource_name, "people/a@example.com");
        assert_eq!(person.email_addresses[0].value, "a@example.com");
        assert_eq!(person.names[0].display_name, "Ada Lovelace");
        assert!(person.photos.is_empty());
    }

    #[test]
    fn test_draft_lifecycle() {
        let (_temp_dir, provider) = create_provider();
        let adapter = provider.adapter();

        let doc = create(&provider, "RFC-1", "drafts", "Hello {{x}}");
        assert_eq!(doc.location, Location::Draft);

        let replacements = HashMap::from([("x".to_owned(), "World".to_owned())]);
        adapter
            .replace_text_in_document(&doc.id, &replacements)
            .unwrap();
        assert_eq!(adapter.get_document_content(&doc.id).unwrap(), "Hello World");

        let moved = provider.move_file(&doc.id, "docs").unwrap();
        assert_eq!(moved.parents, vec!["docs".to_owned()]);

        let loaded = adapter.get_document(&doc.id).unwrap();
        assert_eq!(loaded.location, Location::Published);
        assert_eq!(loaded.content, "Hello World");
        let draft_path = adapter.root(Location::Draft).join(format!("{}.md", doc.id));
        assert!(!draft_path.exists());

        provider.delete_file(&doc.id).unwrap();
        provider.delete_file(&doc.id).unwrap();
        let err = provider.get_file(&doc.id).unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_get_file_resolves_documents_and_folders() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-2", "docs", "body");
        let folder = provider.create_folder("Team", "").unwrap();

        let file = provider.get_file(&doc.id).unwrap();
        assert_eq!(file.mime_type, MARKDOWN_MIME_TYPE);
        assert_eq!(file.owners[0].email_address, "alice@example.com");
        assert_eq!(provider.get_file(&folder.id).unwrap().mime_type, FOLDER_MIME_TYPE);
        assert_eq!(provider.get_subfolder("", "Team").unwrap(), folder.id);
        let err = provider.get_subfolder("", "Other").unwrap_err();
        assert!(err.is(ErrorKind::NotFound));

        let err = provider.get_file("missing").unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_share_upserts_by_email() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-3", "docs", "");

        provider
            .share_file(&doc.id, "bob@example.com", "reader")
            .unwrap();
        provider
            .share_file(&doc.id, "bob@example.com", "writer")
            .unwrap();
        provider
            .share_file(&doc.id, "carol@example.com", "commenter")
            .unwrap();

        let perms = provider.list_permissions(&doc.id).unwrap();
        assert_eq!(perms.len(), 2);
        assert_eq!(perms[0].email_address, "bob@example.com");
        assert_eq!(perms[0].role, "writer");
        assert_eq!(perms[0].kind, "user");
        assert_eq!(perms[0].id, permission_id("bob@example.com"));
    }

    #[test]
    fn test_share_requires_email_and_role() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-4", "docs", "");

        let no_email = provider.share_file(&doc.id, "", "reader").unwrap_err();
        let no_role = provider
            .share_file(&doc.id, "bob@example.com", "")
            .unwrap_err();
        let missing = provider
            .share_file("missing", "bob@example.com", "reader")
            .unwrap_err();

        assert!(no_email.is(ErrorKind::InvalidInput));
        assert!(no_role.is(ErrorKind::InvalidInput));
        assert!(missing.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_delete_permission() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-5", "docs", "");
        provider
            .share_file(&doc.id, "bob@example.com", "reader")
            .unwrap();
        let id = permission_id("bob@example.com");

        provider.delete_permission(&doc.id, &id).unwrap();

        assert!(provider.list_permissions(&doc.id).unwrap().is_empty());
        let err = provider.delete_permission(&doc.id, &id).unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_domain_sharing_is_ignored() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-6", "docs", "");

        provider
            .share_file_with_domain(&doc.id, "example.com", "reader")
            .unwrap();

        assert!(provider.list_permissions(&doc.id).unwrap().is_empty());
    }

    #[test]
    fn test_copy_and_rename_file() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-7", "docs", "text");

        let copy = provider
            .copy_file(&doc.id, "drafts", "Copy of RFC-7")
            .unwrap();
        provider.rename_file(&copy.id, "RFC-8").unwrap();

        assert_ne!(copy.id, doc.id);
        let loaded = provider.adapter().get_document(&copy.id).unwrap();
        assert_eq!(loaded.name, "RFC-8");
        assert_eq!(loaded.content, "text");
        assert_eq!(loaded.location, Location::Draft);
    }

    #[test]
    fn test_create_file_as_user() {
        let (_temp_dir, provider) = create_provider();
        let template = create(&provider, "Template", "templates", "Dear {{name}}");

        let file = provider
            .create_file_as_user(&template.id, "drafts", "Letter", "dave@example.com")
            .unwrap();

        let doc = provider.adapter().get_document(&file.id).unwrap();
        assert_eq!(doc.owner, "dave@example.com");
        assert_eq!(doc.content, "Dear {{name}}");
        assert_eq!(doc.metadata[CREATED_AS_USER_KEY], "dave@example.com");
    }

    #[test]
    fn test_create_shortcut() {
        let (_temp_dir, provider) = create_provider();
        let target = create(&provider, "RFC-9", "docs", "");

        let shortcut = provider.create_shortcut(&target.id, "drafts").unwrap();

        assert_eq!(shortcut.mime_type, SHORTCUT_MIME_TYPE);
        assert_eq!(shortcut.name, "Shortcut to RFC-9");
        let details = provider
            .get_file(&shortcut.id)
            .unwrap()
            .shortcut_details
            .unwrap();
        assert_eq!(details.target_id, target.id);
        assert_eq!(details.target_mime_type, MARKDOWN_MIME_TYPE);
    }

    #[test]
    fn test_get_and_update_doc() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-10", "docs", "Status: draft. draft again.");

        let response = provider
            .update_doc(
                &doc.id,
                &[replace_request("draft", "final"), replace_request("missing", "x")],
            )
            .unwrap();

        assert_eq!(response.occurrences_changed, vec![2, 0]);
        let body = provider.get_doc(&doc.id).unwrap();
        assert_eq!(body.title, "RFC-10");
        assert_eq!(body.body, "Status: final. final again.");
    }

    #[test]
    fn test_update_doc_rejects_unsupported_requests_before_writing() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-11", "docs", "keep me");

        let err = provider
            .update_doc(
                &doc.id,
                &[
                    replace_request("keep", "lose"),
                    DocRequest::InsertText {
                        index: 0,
                        text: "x".to_owned(),
                    },
                ],
            )
            .unwrap_err();

        assert!(err.is(ErrorKind::NotImplemented));
        assert_eq!(provider.get_doc(&doc.id).unwrap().body, "keep me");
    }

    #[test]
    fn test_revisions() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "RFC-12", "docs", "");

        let latest = provider.get_latest_revision(&doc.id).unwrap();
        assert_eq!(latest.id, LATEST_REVISION_ID);
        assert!(!latest.keep_forever);

        let kept = provider
            .keep_revision_forever(&doc.id, LATEST_REVISION_ID)
            .unwrap();
        assert!(kept.keep_forever);
        provider
            .update_keep_revision_forever(&doc.id, LATEST_REVISION_ID, false)
            .unwrap();

        let err = provider.keep_revision_forever(&doc.id, "r1").unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
        let err = provider.get_latest_revision("missing").unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_people_directory() {
        let (temp_dir, provider) = create_provider();
        fs::write(
            temp_dir.path().join("users.json"),
            r#"{
                "ann@example.com": {"email": "ann@example.com", "name": "Ann Lee"},
                "bob@example.com": {"email": "bob@example.com", "name": "Bob Stone", "photoURL": "https://img/b.png"},
                "cat@other.org": {"email": "cat@other.org", "name": "Cat Moss"}
            }"#,
        )
        .unwrap();

        let people = provider.search_people("bob@").unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].photos[0].url, "https://img/b.png");

        let limited = provider
            .search_directory(&PeopleSearchOptions {
                query: "example.com".to_owned(),
                max_results: 1,
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].email_addresses[0].value, "ann@example.com");
    }

    #[test]
    fn test_email_and_groups() {
        let (_temp_dir, provider) = create_provider();

        provider
            .send_email(&["a@example.com".to_owned()], "noreply@example.com", "Hi", "Body")
            .unwrap();
        let err = provider
            .send_email(&[], "noreply@example.com", "Hi", "Body")
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidInput));

        let groups = provider.list_groups("example.com", "", 10).unwrap();
        let user_groups = provider.list_user_groups("a@example.com").unwrap();
        assert!(groups.is_empty());
        assert!(user_groups.is_empty());
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids() {
        let (_temp_dir, provider) = create_provider();

        let ids: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let provider = &provider;
                    scope.spawn(move || create(provider, &format!("Doc {i}"), "docs", "x").id)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 16);
        for id in &ids {
            provider.adapter().get_document(id).unwrap();
        }
        let listed = provider
            .adapter()
            .list_documents("docs", &ListOptions::default())
            .unwrap();
        assert_eq!(listed.len(), 16);
    }

    #[test]
    fn test_concurrent_edits_to_one_document() {
        let (_temp_dir, provider) = create_provider();
        let doc = create(&provider, "Counter", "docs", "");

        thread::scope(|scope| {
            for i in 0..8 {
                let provider = &provider;
                let id = doc.id.as_str();
                scope.spawn(move || {
                    provider
                        .share_file(id, &format!("user{i}@example.com"), "reader")
                        .unwrap();
                    provider
                        .update_doc(id, &[replace_request("missing", "x")])
                        .unwrap();
                });
            }
        });

        assert_eq!(provider.list_permissions(&doc.id).unwrap().len(), 8);
        let loaded = provider.adapter().get_document(&doc.id).unwrap();
        assert_eq!(loaded.name, "Counter");
    }
}

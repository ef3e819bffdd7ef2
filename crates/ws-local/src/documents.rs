//! Document operations of [`LocalAdapter`].

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use ws_core::{
    Document, DocumentCreate, DocumentStorage, DocumentUpdate, Folder, ListOptions, Location,
    MetadataMap, Revision, WorkspaceError,
};

use crate::frontmatter::DocumentMetadata;
use crate::metadata::Layout;
use crate::permissions::LEGACY_PERMISSIONS_KEY;
use crate::{
    LocalAdapter, generate_id, next_modified_time, not_found_as_document, to_document,
    validate_id,
};

/// Identifier of the only revision the local backend knows about.
pub(crate) const LATEST_REVISION_ID: &str = "latest";

impl LocalAdapter {
    /// Fresh id not used in either root.
    fn unused_document_id(&self) -> String {
        loop {
            let id = generate_id();
            let taken = Location::ALL.into_iter().any(|location| {
                self.root(location).join(&id).exists()
                    || self.document_file_path(&id, location).exists()
            });
            if !taken {
                return id;
            }
        }
    }

    /// Rewrite a document's content under its lock.
    ///
    /// `f` maps the current content to the new content plus a result. Nothing is
    /// written if `f` fails.
    pub(crate) fn modify_content<T>(
        &self,
        id: &str,
        f: impl FnOnce(&str) -> Result<(String, T), WorkspaceError>,
    ) -> Result<T, WorkspaceError> {
        validate_id(id)?;
        self.doc_locks.with(&id.to_owned(), || {
            let current = self.load_document(id)?;
            let (content, result) = f(&current.content)?;
            self.update_locked(
                id,
                DocumentUpdate {
                    content: Some(content),
                    ..Default::default()
                },
            )?;
            Ok(result)
        })
    }

    /// Apply an update; the caller holds the document lock.
    fn update_locked(&self, id: &str, updates: DocumentUpdate) -> Result<Document, WorkspaceError> {
        let (old_path, old_location) = self.find_document(id)?;
        let layout = Layout::of(&old_path);
        let (mut meta, mut content) = self
            .store
            .get_with_content(&old_path)
            .map_err(|e| not_found_as_document(e, id))?;

        if let Some(name) = updates.name {
            if name.is_empty() {
                return Err(WorkspaceError::invalid_input("name", "cannot be empty"));
            }
            meta.name = name;
        }
        if let Some(new_content) = updates.content {
            content = new_content;
        }
        if let Some(trashed) = updates.trashed {
            meta.trashed = trashed;
        }
        if let Some(metadata) = updates.metadata {
            meta.metadata
                .extend(storable_metadata(metadata, layout, id));
        }

        let mut location = old_location;
        if let Some(folder_id) = updates.parent_folder_id {
            location = updates
                .location
                .unwrap_or_else(|| Location::classify(&folder_id));
            meta.parent_folder_id = folder_id;
        } else if let Some(explicit) = updates.location {
            location = explicit;
        }

        meta.modified_time = next_modified_time(meta.modified_time);

        let new_path = if location == old_location {
            old_path.clone()
        } else {
            match layout {
                Layout::File => self.document_file_path(id, location),
                Layout::Directory => self.root(location).join(id),
            }
        };
        self.store.set_as(&new_path, layout, &meta, &content)?;
        if new_path != old_path {
            self.store.delete(&old_path)?;
            tracing::info!(
                id = %id,
                from = %old_location,
                to = %location,
                folder = %meta.parent_folder_id,
                "Moved document"
            );
        }

        let permissions = self.readable_permissions(&meta);
        Ok(to_document(meta, content, location, permissions))
    }
}

/// Custom metadata with the keys a write in `layout` would drop removed.
///
/// Embedded permissions are removed too; access changes go through the
/// permission operations.
fn storable_metadata(mut metadata: MetadataMap, layout: Layout, id: &str) -> MetadataMap {
    if metadata.remove(LEGACY_PERMISSIONS_KEY).is_some() {
        tracing::warn!(id = %id, "Ignoring embedded permissions in supplied metadata");
    }
    metadata.retain(|key, _| {
        let keep = layout.stores_key(key);
        if !keep {
            tracing::warn!(id = %id, key = %key, "Ignoring metadata key that cannot be stored");
        }
        keep
    });
    metadata
}

impl DocumentStorage for LocalAdapter {
    fn get_document(&self, id: &str) -> Result<Document, WorkspaceError> {
        self.load_document(id)
    }

    fn create_document(&self, doc: DocumentCreate) -> Result<Document, WorkspaceError> {
        if doc.name.is_empty() {
            return Err(WorkspaceError::invalid_input("name", "cannot be empty"));
        }

        let content = match &doc.template_id {
            Some(template_id) => self.load_document(template_id)?.content,
            None => doc.content,
        };

        let location = doc
            .location
            .unwrap_or_else(|| Location::classify(&doc.parent_folder_id));
        let now = Utc::now();
        let id = self.unused_document_id();
        let metadata = storable_metadata(doc.metadata, Layout::File, &id);
        let meta = DocumentMetadata {
            id,
            name: doc.name,
            parent_folder_id: doc.parent_folder_id,
            created_time: now,
            modified_time: now,
            owner: doc.owner,
            thumbnail_url: String::new(),
            trashed: false,
            metadata,
        };

        let path = self.document_file_path(&meta.id, location);
        self.store.set_as(&path, Layout::File, &meta, &content)?;
        tracing::info!(
            id = %meta.id,
            name = %meta.name,
            location = %location,
            template = doc.template_id.as_deref().unwrap_or(""),
            "Created document"
        );

        Ok(to_document(meta, content, location, Vec::new()))
    }

    fn update_document(
        &self,
        id: &str,
        updates: DocumentUpdate,
    ) -> Result<Document, WorkspaceError> {
        validate_id(id)?;
        self.doc_locks
            .with(&id.to_owned(), || self.update_locked(id, updates))
    }

    fn delete_document(&self, id: &str) -> Result<(), WorkspaceError> {
        validate_id(id)?;
        self.doc_locks.with(&id.to_owned(), || {
            for location in Location::ALL {
                let dir = self.root(location).join(id);
                if self.store.exists(&dir) {
                    self.store.delete(&dir)?;
                }
                self.store.delete(&self.document_file_path(id, location))?;
            }
            if let Err(e) = self.permissions.delete(id) {
                tracing::warn!(id = %id, error = %e, "Failed to remove permission file");
            }
            tracing::info!(id = %id, "Deleted document");
            Ok(())
        })
    }

    fn list_documents(
        &self,
        folder_id: &str,
        opts: &ListOptions,
    ) -> Result<Vec<Document>, WorkspaceError> {
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for location in Location::ALL {
            for (_, meta) in self.store.list(self.root(location))? {
                if meta.parent_folder_id != folder_id
                    || (meta.trashed && !opts.include_trashed)
                    || opts
                        .modified_after
                        .is_some_and(|after| meta.modified_time <= after)
                {
                    continue;
                }
                // Left behind in the other root by an interrupted move.
                if !seen.insert(meta.id.clone()) {
                    continue;
                }
                let permissions = self.readable_permissions(&meta);
                documents.push(to_document(meta, String::new(), location, permissions));
            }
        }

        documents.sort_by(|a, b| {
            b.modified_time
                .cmp(&a.modified_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        if opts.page_size > 0 {
            documents.truncate(opts.page_size);
        }
        tracing::debug!(folder = %folder_id, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    fn replace_text_in_document(
        &self,
        id: &str,
        replacements: &HashMap<String, String>,
    ) -> Result<(), WorkspaceError> {
        self.modify_content(id, |current| {
            let mut content = current.to_owned();
            let mut keys: Vec<_> = replacements.keys().collect();
            keys.sort();
            for key in keys {
                content = content.replace(&format!("{{{{{key}}}}}"), &replacements[key]);
            }
            Ok((content, ()))
        })
    }

    fn copy_document(
        &self,
        source_id: &str,
        dest_folder_id: &str,
        name: &str,
    ) -> Result<Document, WorkspaceError> {
        let source = self.load_document(source_id)?;
        self.create_document(DocumentCreate {
            name: name.to_owned(),
            parent_folder_id: dest_folder_id.to_owned(),
            content: source.content,
            owner: source.owner,
            metadata: source.metadata,
            ..Default::default()
        })
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<Folder, WorkspaceError> {
        self.create_folder_record(name, parent_id)
    }

    fn get_folder(&self, id: &str) -> Result<Folder, WorkspaceError> {
        self.read_folder(id)
    }

    fn list_folders(&self, parent_id: &str) -> Result<Vec<Folder>, WorkspaceError> {
        self.list_folder_records(parent_id)
    }

    fn get_subfolder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<Folder>, WorkspaceError> {
        Ok(self
            .list_folder_records(parent_id)?
            .into_iter()
            .find(|folder| folder.name == name))
    }

    fn list_revisions(&self, _id: &str) -> Result<Vec<Revision>, WorkspaceError> {
        Err(WorkspaceError::not_implemented("list revisions"))
    }

    fn get_revision(&self, id: &str, revision_id: &str) -> Result<Revision, WorkspaceError> {
        if revision_id == LATEST_REVISION_ID {
            return self.get_latest_revision(id);
        }
        Err(WorkspaceError::not_implemented("get revision"))
    }

    fn get_latest_revision(&self, id: &str) -> Result<Revision, WorkspaceError> {
        let doc = self.load_document(id)?;
        Ok(Revision {
            id: LATEST_REVISION_ID.to_owned(),
            document_id: doc.id,
            modified_time: doc.modified_time,
            modified_by: doc.owner,
            name: String::new(),
            content: doc.content,
        })
    }
}

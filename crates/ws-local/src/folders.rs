//! Folder records of [`LocalAdapter`].
//!
//! Folders are standalone JSON files, one per folder. There is no
//! parent-to-children index: listing children scans every record.

use std::fs;

use chrono::Utc;
use ws_core::{ErrorKind, Folder, MetadataMap, WorkspaceError};

use crate::metadata::write_atomic;
use crate::{LocalAdapter, generate_id, validate_id};

impl LocalAdapter {
    pub(crate) fn create_folder_record(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Folder, WorkspaceError> {
        if name.is_empty() {
            return Err(WorkspaceError::invalid_input("name", "cannot be empty"));
        }

        let now = Utc::now();
        let folder = Folder {
            id: generate_id(),
            name: name.to_owned(),
            parent_id: parent_id.to_owned(),
            created_time: now,
            modified_time: now,
            metadata: MetadataMap::new(),
        };
        let json = serde_json::to_vec_pretty(&folder).map_err(|e| {
            WorkspaceError::malformed("folder record")
                .with_resource("folder", &folder.id)
                .with_source(e)
        })?;
        write_atomic(&self.folder_path(&folder.id), &json)?;
        tracing::info!(id = %folder.id, name = %folder.name, parent = %parent_id, "Created folder");

        Ok(folder)
    }

    pub(crate) fn read_folder(&self, id: &str) -> Result<Folder, WorkspaceError> {
        validate_id(id).map_err(|e| e.with_resource("folder", id))?;
        let path = self.folder_path(id);
        let text = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WorkspaceError::not_found("folder", id)
            } else {
                WorkspaceError::io(e, Some(path.clone())).with_resource("folder", id)
            }
        })?;
        serde_json::from_str(&text).map_err(|e| {
            WorkspaceError::malformed("folder record")
                .with_resource("folder", id)
                .with_path(&path)
                .with_source(e)
        })
    }

    /// Direct children of `parent_id`, ordered by name.
    pub(crate) fn list_folder_records(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Folder>, WorkspaceError> {
        let dir = &self.config.folders_path;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(WorkspaceError::io(e, Some(dir.clone()))),
        };

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| WorkspaceError::io(e, Some(dir.clone())))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read_folder(id) {
                Ok(folder) if folder.parent_id == parent_id => folders.push(folder),
                Ok(_) => {}
                Err(e) if e.is(ErrorKind::NotFound) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable folder record"
                    );
                }
            }
        }

        folders.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(folders)
    }
}

//! User directory backed by `users.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ws_core::{PeopleService, User, WorkspaceError};

/// Read the user directory. `None` if the file does not exist.
pub(crate) fn read_users(path: &Path) -> Result<Option<HashMap<String, User>>, WorkspaceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(WorkspaceError::io(e, Some(path.to_path_buf()))),
    };
    serde_json::from_str(&text).map(Some).map_err(|e| {
        WorkspaceError::malformed("user directory")
            .with_path(path)
            .with_source(e)
    })
}

/// Users keyed by email in a JSON file.
#[derive(Debug, Clone)]
pub struct LocalPeopleService {
    users_path: PathBuf,
}

impl LocalPeopleService {
    pub fn new(users_path: PathBuf) -> Self {
        Self { users_path }
    }
}

impl PeopleService for LocalPeopleService {
    fn get_user(&self, email: &str) -> Result<User, WorkspaceError> {
        read_users(&self.users_path)?
            .and_then(|mut users| users.remove(email))
            .ok_or_else(|| WorkspaceError::not_found("user", email))
    }

    fn search_users(&self, query: &str) -> Result<Vec<User>, WorkspaceError> {
        let Some(users) = read_users(&self.users_path)? else {
            return Ok(Vec::new());
        };
        let query = query.to_lowercase();
        let mut matches: Vec<User> = users
            .into_values()
            .filter(|user| {
                user.email.to_lowercase().contains(&query)
                    || user.name.to_lowercase().contains(&query)
            })
            .collect();
        matches.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(matches)
    }
}

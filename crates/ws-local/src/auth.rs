//! Token validation backed by `tokens.json`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ws_core::{AuthInfo, AuthService, UserInfo, WorkspaceError};

use crate::people::read_users;

#[derive(Debug, Deserialize)]
struct TokenRecord {
    email: String,
    #[serde(alias = "expiresAt")]
    expires_at: DateTime<Utc>,
}

/// API tokens keyed by token string in a JSON file.
#[derive(Debug, Clone)]
pub struct LocalAuthService {
    tokens_path: PathBuf,
    users_path: PathBuf,
}

impl LocalAuthService {
    pub fn new(tokens_path: PathBuf, users_path: PathBuf) -> Self {
        Self {
            tokens_path,
            users_path,
        }
    }

    fn read_tokens(&self) -> Result<HashMap<String, TokenRecord>, WorkspaceError> {
        let text = match fs::read_to_string(&self.tokens_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(WorkspaceError::io(e, Some(self.tokens_path.clone()))),
        };
        serde_json::from_str(&text).map_err(|e| {
            WorkspaceError::malformed("token file")
                .with_path(&self.tokens_path)
                .with_source(e)
        })
    }
}

impl AuthService for LocalAuthService {
    fn validate_token(&self, token: &str) -> Result<AuthInfo, WorkspaceError> {
        let Some(record) = self.read_tokens()?.remove(token) else {
            tracing::debug!("Rejected unknown token");
            return Ok(AuthInfo::default());
        };
        if Utc::now() > record.expires_at {
            tracing::debug!(email = %record.email, "Rejected expired token");
            return Ok(AuthInfo::default());
        }
        Ok(AuthInfo {
            valid: true,
            email: record.email,
            expires_at: Some(record.expires_at),
        })
    }

    fn get_user_info(&self, token: &str) -> Result<UserInfo, WorkspaceError> {
        let auth = self.validate_token(token)?;
        if !auth.valid {
            return Err(WorkspaceError::permission_denied(
                "get user info",
                "invalid or expired token",
            ));
        }
        let user = read_users(&self.users_path)?
            .and_then(|mut users| users.remove(&auth.email))
            .ok_or_else(|| WorkspaceError::not_found("user", &auth.email))?;

        Ok(UserInfo {
            id: user.email.clone(),
            email: user.email,
            name: user.name,
            given_name: user.given_name,
            family_name: user.family_name,
            picture: user.photo_url,
            verified_email: true,
        })
    }
}

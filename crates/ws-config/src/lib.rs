//! Configuration management for the document workspace.
//!
//! Parses `workspace.toml` with serde and discovers it in the current
//! directory or any parent. The result resolves into a [`LocalConfig`] for
//! the filesystem backend.
//!
//! ## Environment Variable Expansion
//!
//! `${VAR}` errors if `VAR` is unset; `${VAR:-default}` falls back to
//! `default`. Expanded fields:
//! - every `workspace.*` path
//! - `smtp.host`, `smtp.from`, `smtp.username`, `smtp.password`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;
pub use ws_local::LocalConfig;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "workspace.toml";

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the workspace base path. Paths not set explicitly in the file
    /// are re-derived from it.
    pub base_path: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace paths as written in TOML.
    workspace: WorkspaceConfigRaw,
    /// Outgoing mail settings. Recorded only; mail is logged, never sent.
    pub smtp: Option<SmtpConfig>,

    /// Resolved workspace layout (set after loading).
    #[serde(skip)]
    pub workspace_resolved: LocalConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw `[workspace]` section (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WorkspaceConfigRaw {
    base_path: Option<String>,
    docs_path: Option<String>,
    drafts_path: Option<String>,
    folders_path: Option<String>,
    permissions_path: Option<String>,
    users_path: Option<String>,
    tokens_path: Option<String>,
}

/// `[smtp]` section.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct SmtpConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender address.
    pub from: String,
    /// Login user.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Validate that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if host or sender is empty or the port is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.host, "smtp.host")?;
        require_non_empty(&self.from, "smtp.from")?;
        if self.port == 0 {
            return Err(ConfigError::Validation("smtp.port cannot be 0".to_owned()));
        }
        Ok(())
    }
}

fn default_smtp_port() -> u16 {
    587
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`smtp.password`").
        field: String,
        /// Error message (e.g., "${`SMTP_PASSWORD`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `workspace.toml` in the current directory and its parents, falling
    /// back to a workspace rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, or if reading,
    /// parsing, expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Directory relative paths resolve against.
    fn config_dir(&self) -> PathBuf {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(base_path) = &settings.base_path {
            let config_dir = self.config_dir();
            self.workspace_resolved = self.workspace.resolve(&config_dir, base_path);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            workspace: WorkspaceConfigRaw::default(),
            smtp: None,
            workspace_resolved: LocalConfig::new(base),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the base path is empty or the
    /// `[smtp]` section is incomplete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace_resolved.base_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "workspace.base_path cannot be empty".to_owned(),
            ));
        }
        if let Some(smtp) = &self.smtp {
            smtp.validate()?;
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let ws = &mut self.workspace;
        expand::expand_opt(&mut ws.base_path, "workspace.base_path")?;
        expand::expand_opt(&mut ws.docs_path, "workspace.docs_path")?;
        expand::expand_opt(&mut ws.drafts_path, "workspace.drafts_path")?;
        expand::expand_opt(&mut ws.folders_path, "workspace.folders_path")?;
        expand::expand_opt(&mut ws.permissions_path, "workspace.permissions_path")?;
        expand::expand_opt(&mut ws.users_path, "workspace.users_path")?;
        expand::expand_opt(&mut ws.tokens_path, "workspace.tokens_path")?;

        if let Some(ref mut smtp) = self.smtp {
            smtp.host = expand::expand_env(&smtp.host, "smtp.host")?;
            smtp.from = expand::expand_env(&smtp.from, "smtp.from")?;
            expand::expand_opt(&mut smtp.username, "smtp.username")?;
            expand::expand_opt(&mut smtp.password, "smtp.password")?;
        }

        Ok(())
    }

    /// Resolve the `[workspace]` section against the config directory.
    ///
    /// A file must name its base path.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let base_path = self.workspace.base_path.as_deref().ok_or_else(|| {
            ConfigError::Validation("[workspace] section requires base_path to be set".to_owned())
        })?;
        require_non_empty(base_path, "workspace.base_path")?;
        let base_path = config_dir.join(base_path);
        self.workspace_resolved = self.workspace.resolve(config_dir, &base_path);
        Ok(())
    }
}

impl WorkspaceConfigRaw {
    /// Explicit paths resolve against `config_dir`; the rest default under `base_path`.
    fn resolve(&self, config_dir: &Path, base_path: &Path) -> LocalConfig {
        let defaults = LocalConfig::new(base_path);
        let resolve = |path: Option<&String>, default: PathBuf| {
            path.map_or(default, |p| config_dir.join(p))
        };
        LocalConfig {
            docs_path: resolve(self.docs_path.as_ref(), defaults.docs_path),
            drafts_path: resolve(self.drafts_path.as_ref(), defaults.drafts_path),
            folders_path: resolve(self.folders_path.as_ref(), defaults.folders_path),
            permissions_path: resolve(self.permissions_path.as_ref(), defaults.permissions_path),
            users_path: resolve(self.users_path.as_ref(), defaults.users_path),
            tokens_path: resolve(self.tokens_path.as_ref(), defaults.tokens_path),
            base_path: defaults.base_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert_eq!(config.workspace_resolved, LocalConfig::new("/test"));
        assert_eq!(
            config.workspace_resolved.users_path,
            PathBuf::from("/test/users.json")
        );
        assert!(config.smtp.is_none());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.workspace.base_path.is_none());
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_parse_smtp_config() {
        let toml = r#"
[smtp]
host = "smtp.example.com"
from = "noreply@example.com"
username = "mailer"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.smtp,
            Some(SmtpConfig {
                host: "smtp.example.com".to_owned(),
                port: 587,
                from: "noreply@example.com".to_owned(),
                username: Some("mailer".to_owned()),
                password: None,
            })
        );
    }

    #[test]
    fn test_resolve_paths_defaults_under_base() {
        let toml = r#"
[workspace]
base_path = "/var/ws"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/etc/ws")).unwrap();

        assert_eq!(config.workspace_resolved, LocalConfig::new("/var/ws"));
    }

    #[test]
    fn test_resolve_paths_relative_to_config_dir() {
        let toml = r#"
[workspace]
base_path = "data"
drafts_path = "scratch/drafts"
tokens_path = "/secrets/tokens.json"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project")).unwrap();

        let resolved = &config.workspace_resolved;
        assert_eq!(resolved.base_path, PathBuf::from("/project/data"));
        assert_eq!(resolved.docs_path, PathBuf::from("/project/data/docs"));
        assert_eq!(resolved.drafts_path, PathBuf::from("/project/scratch/drafts"));
        assert_eq!(resolved.tokens_path, PathBuf::from("/secrets/tokens.json"));
    }

    #[test]
    fn test_resolve_paths_requires_base_path() {
        let toml = r#"
[workspace]
docs_path = "docs"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();

        let err = config.resolve_paths(Path::new("/project")).unwrap_err();

        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("base_path"));
    }

    #[test]
    fn test_resolve_paths_rejects_empty_base_path() {
        let toml = r#"
[workspace]
base_path = ""
"#;
        let mut config: Config = toml::from_str(toml).unwrap();

        let err = config.resolve_paths(Path::new("/project")).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("workspace.base_path cannot be empty"));
    }

    #[test]
    fn test_smtp_validation() {
        let mut smtp = SmtpConfig {
            host: "smtp.example.com".to_owned(),
            port: 587,
            from: "noreply@example.com".to_owned(),
            username: None,
            password: None,
        };
        smtp.validate().unwrap();

        smtp.port = 0;
        let err = smtp.validate().unwrap_err();
        assert!(err.to_string().contains("smtp.port"));

        smtp.port = 25;
        smtp.from = String::new();
        let err = smtp.validate().unwrap_err();
        assert!(err.to_string().contains("smtp.from"));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("workspace.toml");
        std::fs::write(
            &path,
            r#"
[workspace]
base_path = "ws"

[smtp]
host = "smtp.example.com"
port = 2525
from = "noreply@example.com"
password = "${WS_TEST_CONFIG_SMTP_PASSWORD:-changeme}"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(
            config.workspace_resolved,
            LocalConfig::new(temp_dir.path().join("ws"))
        );
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.password.as_deref(), Some("changeme"));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/workspace.toml")), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("workspace.toml");
        std::fs::write(&path, "[workspace\nbase_path = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_invalid_smtp() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("workspace.toml");
        std::fs::write(
            &path,
            r#"
[workspace]
base_path = "/var/ws"

[smtp]
host = ""
from = "noreply@example.com"
"#,
        )
        .unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(err.to_string().contains("smtp.host"));
    }

    #[test]
    fn test_cli_base_path_keeps_explicit_paths() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("workspace.toml");
        std::fs::write(
            &path,
            r#"
[workspace]
base_path = "/var/ws"
users_path = "/etc/ws/users.json"
"#,
        )
        .unwrap();
        let settings = CliSettings {
            base_path: Some(PathBuf::from("/srv/other")),
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        let resolved = &config.workspace_resolved;
        assert_eq!(resolved.base_path, PathBuf::from("/srv/other"));
        assert_eq!(resolved.docs_path, PathBuf::from("/srv/other/docs"));
        assert_eq!(resolved.users_path, PathBuf::from("/etc/ws/users.json"));
    }

    #[test]
    fn test_cli_base_path_without_file() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings {
            base_path: Some(PathBuf::from("/custom")),
        });

        assert_eq!(config.workspace_resolved, LocalConfig::new("/custom"));
    }
}

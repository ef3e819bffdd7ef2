//! CLI command implementations.

mod doc;
mod folder;
mod index;
mod init;
mod share;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use ws_config::{CliSettings, Config};
use ws_local::{LocalAdapter, LocalProvider};

use crate::error::CliError;

pub(crate) use doc::DocCommand;
pub(crate) use folder::FolderCommand;
pub(crate) use index::IndexArgs;
pub(crate) use init::InitArgs;
pub(crate) use share::{PermissionsArgs, RevokeArgs, ShareArgs};

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover workspace.toml).
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Workspace directory (overrides config).
    #[arg(long, global = true, env = "WS_BASE_PATH")]
    pub(crate) base_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

impl GlobalArgs {
    /// Load configuration and open the workspace it points at.
    pub(crate) fn open_workspace(&self) -> Result<LocalAdapter, CliError> {
        let settings = CliSettings {
            base_path: self.base_path.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        tracing::debug!(
            config = ?config.config_path,
            base_path = %config.workspace_resolved.base_path.display(),
            "Loaded configuration"
        );
        Ok(LocalAdapter::new(config.workspace_resolved)?)
    }

    pub(crate) fn open_provider(&self) -> Result<LocalProvider, CliError> {
        Ok(LocalProvider::new(Arc::new(self.open_workspace()?)))
    }
}

/// Parse a `key=value` argument.
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

//! `ws init` command implementation.

use std::path::PathBuf;

use clap::Args;
use ws_local::{LocalAdapter, LocalConfig};

use crate::error::CliError;
use crate::output::Output;

const CONFIG_TEMPLATE: &str = r#"[workspace]
base_path = "."
"#;

/// Arguments for the init command.
#[derive(Args)]
pub(crate) struct InitArgs {
    /// Directory to create the workspace in.
    #[arg(default_value = ".")]
    dir: PathBuf,
}

impl InitArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        std::fs::create_dir_all(&self.dir)?;
        let config_path = self.dir.join("workspace.toml");
        if config_path.exists() {
            output.warning(&format!(
                "{} already exists, leaving it unchanged",
                config_path.display()
            ));
        } else {
            std::fs::write(&config_path, CONFIG_TEMPLATE)?;
        }

        let adapter = LocalAdapter::new(LocalConfig::new(&self.dir))?;
        let config = adapter.config();
        output.success(&format!("Initialized workspace in {}", self.dir.display()));
        output.info(&format!("  published: {}", config.docs_path.display()));
        output.info(&format!("  drafts:    {}", config.drafts_path.display()));
        Ok(())
    }
}

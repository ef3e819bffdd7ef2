//! `ws folder` subcommand group.

use clap::{Args, Subcommand};
use ws_core::DocumentStorage;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Folder commands.
#[derive(Subcommand)]
pub(crate) enum FolderCommand {
    /// Create a folder.
    Create(CreateFolderArgs),
    /// List the folders directly under a parent.
    List(ListFoldersArgs),
}

impl FolderCommand {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let adapter = global.open_workspace()?;
        let output = Output::new();
        match self {
            Self::Create(args) => args.execute(&adapter, &output),
            Self::List(args) => args.execute(&adapter, &output),
        }
    }
}

#[derive(Args)]
pub(crate) struct CreateFolderArgs {
    /// Folder name.
    name: String,

    /// Parent folder id (default: top level).
    #[arg(short, long, default_value = "")]
    parent: String,
}

impl CreateFolderArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        if let Some(existing) = storage.get_subfolder(&self.parent, &self.name)? {
            output.warning(&format!("Folder \"{}\" already exists", existing.name));
            output.data(&existing.id);
            return Ok(());
        }
        let folder = storage.create_folder(&self.name, &self.parent)?;
        output.success(&format!("Created folder \"{}\"", folder.name));
        output.data(&folder.id);
        Ok(())
    }
}

#[derive(Args)]
pub(crate) struct ListFoldersArgs {
    /// Parent folder id (default: top level).
    #[arg(short, long, default_value = "")]
    parent: String,
}

impl ListFoldersArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        for folder in storage.list_folders(&self.parent)? {
            output.data(&format!("{}\t{}", folder.id, folder.name));
        }
        Ok(())
    }
}

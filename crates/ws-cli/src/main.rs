//! `ws` - local document workspace CLI.
//!
//! Provides commands for:
//! - `init`: Create a workspace and its `workspace.toml`
//! - `doc`: Create, read, list, move, edit and delete documents
//! - `folder`: Create and list folders
//! - `share`, `permissions`, `revoke`: Manage document sharing
//! - `index`: Export every document as a JSON-lines search feed

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    DocCommand, FolderCommand, GlobalArgs, IndexArgs, InitArgs, PermissionsArgs, RevokeArgs,
    ShareArgs,
};
use output::Output;

/// Local document workspace.
#[derive(Parser)]
#[command(name = "ws", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a workspace in a directory.
    Init(InitArgs),
    /// Document commands.
    #[command(subcommand)]
    Doc(DocCommand),
    /// Folder commands.
    #[command(subcommand)]
    Folder(FolderCommand),
    /// Grant a user access to a document.
    Share(ShareArgs),
    /// List who a document is shared with.
    Permissions(PermissionsArgs),
    /// Remove a permission from a document.
    Revoke(RevokeArgs),
    /// Write every document to a JSON-lines search feed.
    Index(IndexArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to ERROR
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let global = &cli.global;
    let result = match cli.command {
        Commands::Init(args) => args.execute(),
        Commands::Doc(cmd) => cmd.execute(global),
        Commands::Folder(cmd) => cmd.execute(global),
        Commands::Share(args) => args.execute(global),
        Commands::Permissions(args) => args.execute(global),
        Commands::Revoke(args) => args.execute(global),
        Commands::Index(args) => args.execute(global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ws", "doc", "get", "abc", "--base-path", "/srv/ws", "-v"])
            .unwrap();

        assert!(cli.global.verbose);
        assert_eq!(
            cli.global.base_path.as_deref(),
            Some(std::path::Path::new("/srv/ws"))
        );
        assert!(matches!(cli.command, Commands::Doc(_)));
    }
}

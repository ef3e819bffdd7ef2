//! `ws doc` subcommand group.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use ws_core::{Document, DocumentCreate, DocumentStorage, ListOptions, Location, MetadataMap};

use super::{GlobalArgs, parse_key_val};
use crate::error::CliError;
use crate::output::Output;

/// Document commands.
#[derive(Subcommand)]
pub(crate) enum DocCommand {
    /// Create a document.
    Create(CreateArgs),
    /// Print a document's metadata and content.
    Get(GetArgs),
    /// List documents in a folder.
    List(ListArgs),
    /// Move a document to another folder.
    Move(MoveArgs),
    /// Delete a document.
    Delete(DeleteArgs),
    /// Replace `{{key}}` placeholders in a document.
    Replace(ReplaceArgs),
}

impl DocCommand {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let adapter = global.open_workspace()?;
        let output = Output::new();
        match self {
            Self::Create(args) => args.execute(&adapter, &output),
            Self::Get(args) => args.execute(&adapter, &output),
            Self::List(args) => args.execute(&adapter, &output),
            Self::Move(args) => args.execute(&adapter, &output),
            Self::Delete(args) => args.execute(&adapter, &output),
            Self::Replace(args) => args.execute(&adapter, &output),
        }
    }
}

/// Storage root selectable on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum LocationArg {
    Draft,
    Published,
}

impl From<LocationArg> for Location {
    fn from(arg: LocationArg) -> Self {
        match arg {
            LocationArg::Draft => Location::Draft,
            LocationArg::Published => Location::Published,
        }
    }
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Document name.
    name: String,

    /// Parent folder id.
    #[arg(short, long, default_value = "drafts")]
    folder: String,

    /// Storage root (default: derived from the folder).
    #[arg(long, value_enum)]
    location: Option<LocationArg>,

    /// Initial content.
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,

    /// Read initial content from a file.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Template document whose content is copied.
    #[arg(short, long)]
    template: Option<String>,

    /// Owner email.
    #[arg(short, long, default_value = "")]
    owner: String,

    /// Metadata entry, repeatable.
    #[arg(short, long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    meta: Vec<(String, String)>,
}

impl CreateArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        let content = match (&self.content, &self.file) {
            (Some(content), _) => content.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => String::new(),
        };
        let metadata: MetadataMap = self
            .meta
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::String(value)))
            .collect();

        let doc = storage.create_document(DocumentCreate {
            name: self.name,
            parent_folder_id: self.folder,
            location: self.location.map(Location::from),
            template_id: self.template,
            content,
            owner: self.owner,
            metadata,
        })?;

        output.success(&format!("Created {} document \"{}\"", doc.location, doc.name));
        output.data(&doc.id);
        Ok(())
    }
}

#[derive(Args)]
pub(crate) struct GetArgs {
    /// Document id.
    id: String,

    /// Print only the metadata.
    #[arg(long)]
    no_content: bool,
}

impl GetArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        let doc = storage.get_document(&self.id)?;
        print_document(output, &doc);
        if !self.no_content {
            output.data("");
            output.data(&doc.content);
        }
        Ok(())
    }
}

fn print_document(output: &Output, doc: &Document) {
    output.field("id", &doc.id);
    output.field("name", &doc.name);
    output.field("folder", &doc.parent_folder_id);
    output.field("location", doc.location.as_str());
    output.field("owner", &doc.owner);
    output.field("created", &doc.created_time.to_rfc3339());
    output.field("modified", &doc.modified_time.to_rfc3339());
    if doc.trashed {
        output.field("trashed", "true");
    }
    let mut keys: Vec<&String> = doc.metadata.keys().collect();
    keys.sort();
    for key in keys {
        let value = match &doc.metadata[key] {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        output.field(key, &value);
    }
}

#[derive(Args)]
pub(crate) struct ListArgs {
    /// Folder id.
    folder: String,

    /// Include trashed documents.
    #[arg(long)]
    all: bool,

    /// Maximum number of documents (0 = unlimited).
    #[arg(short, long, default_value_t = 0)]
    limit: usize,
}

impl ListArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        let docs = storage.list_documents(
            &self.folder,
            &ListOptions {
                include_trashed: self.all,
                page_size: self.limit,
                ..Default::default()
            },
        )?;
        if docs.is_empty() {
            output.warning(&format!("No documents in {}", self.folder));
        }
        for doc in &docs {
            output.data(&format!(
                "{}\t{}\t{}\t{}",
                doc.id,
                doc.location,
                doc.modified_time.to_rfc3339(),
                doc.name
            ));
        }
        Ok(())
    }
}

#[derive(Args)]
pub(crate) struct MoveArgs {
    /// Document id.
    id: String,

    /// Destination folder id.
    folder: String,
}

impl MoveArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        storage.move_document(&self.id, &self.folder)?;
        let doc = storage.get_document(&self.id)?;
        output.success(&format!(
            "Moved {} to {} ({})",
            doc.id, doc.parent_folder_id, doc.location
        ));
        Ok(())
    }
}

#[derive(Args)]
pub(crate) struct DeleteArgs {
    /// Document id.
    id: String,
}

impl DeleteArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        storage.delete_document(&self.id)?;
        output.success(&format!("Deleted {}", self.id));
        Ok(())
    }
}

#[derive(Args)]
pub(crate) struct ReplaceArgs {
    /// Document id.
    id: String,

    /// Placeholder values.
    #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_key_val)]
    values: Vec<(String, String)>,
}

impl ReplaceArgs {
    fn execute(self, storage: &dyn DocumentStorage, output: &Output) -> Result<(), CliError> {
        let replacements: HashMap<String, String> = self.values.into_iter().collect();
        storage.replace_text_in_document(&self.id, &replacements)?;
        output.success(&format!(
            "Replaced {} placeholder(s) in {}",
            replacements.len(),
            self.id
        ));
        Ok(())
    }
}

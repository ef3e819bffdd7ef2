//! `ws index` command implementation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use clap::Args;
use serde::Serialize;
use ws_core::{Location, SearchDocument, SearchIndex, WorkspaceError};
use ws_local::DocumentIndexer;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the index command.
#[derive(Args)]
pub(crate) struct IndexArgs {
    /// Write the feed to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl IndexArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let adapter = global.open_workspace()?;
        let output = Output::new();

        let writer: Box<dyn Write + Send> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(std::io::stdout())),
        };
        let sink = JsonLinesIndex::new(writer);
        let stats = DocumentIndexer::new(&adapter, &sink).index_all()?;
        sink.finish()?;

        let summary = format!("Indexed {} document(s)", stats.indexed);
        if stats.skipped == 0 {
            output.success(&summary);
        } else {
            output.warning(&format!("{summary}, skipped {}", stats.skipped));
        }
        Ok(())
    }
}

/// One line of the feed.
#[derive(Serialize)]
struct FeedRecord<'a> {
    location: Location,
    #[serde(flatten)]
    document: &'a SearchDocument,
}

/// [`SearchIndex`] that writes one JSON object per line.
struct JsonLinesIndex<W> {
    writer: Mutex<W>,
}

impl<W: Write> JsonLinesIndex<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn finish(self) -> Result<W, std::io::Error> {
        let mut writer = self
            .writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write + Send> SearchIndex for JsonLinesIndex<W> {
    fn index(&self, document: &SearchDocument, location: Location) -> Result<(), WorkspaceError> {
        let line = serde_json::to_string(&FeedRecord { location, document }).map_err(|e| {
            WorkspaceError::malformed("search document")
                .with_resource("document", &document.object_id)
                .with_source(e)
        })?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}").map_err(|e| WorkspaceError::io(e, None))
    }
}

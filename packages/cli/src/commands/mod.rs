pub mod init;
pub mod inspect;
pub mod replay;

pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use replay::{replay, ReplayArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use docgraph_editor::Document;
use docgraph_model::Snapshot;
use std::fs;
use std::path::Path;

/// Read a snapshot file
pub(crate) fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid snapshot {}", path.display()))
}

/// Load a snapshot file into a document configured from `config`
pub(crate) fn load_document(path: &Path, config: &Config) -> Result<Document> {
    let snapshot = read_snapshot(path)?;
    let doc =
        Document::from_snapshot_with_options(config.schema(), &snapshot, config.document_options())
            .with_context(|| format!("Cannot load {}", path.display()))?;
    Ok(doc)
}

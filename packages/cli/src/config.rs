use anyhow::Context;
use docgraph_editor::{DocumentOptions, DEFAULT_UNDO_LEVELS};
use docgraph_model::{NodeType, Schema};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_CONFIG_NAME: &str = "docgraph.config.json";

/// Docgraph configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Node types snapshots are loaded against
    #[serde(default = "default_schema")]
    pub schema: Schema,

    /// Maximum undo depth (0 = unlimited)
    #[serde(default = "default_undo_levels")]
    pub undo_levels: usize,

    /// Default tracing filter, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema() -> Schema {
    Schema::new("article", "1")
        .with_type("paragraph", NodeType::new(["text"]))
        .with_type("heading", NodeType::new(["text", "level"]))
        .with_type("bold", NodeType::property_annotation())
        .with_type("italic", NodeType::property_annotation())
        .with_type("link", NodeType::property_annotation().with_property("url"))
        .with_type("comment", NodeType::container_annotation().with_property("body"))
}

fn default_undo_levels() -> usize {
    DEFAULT_UNDO_LEVELS
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path, which must exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn schema(&self) -> Arc<Schema> {
        Arc::new(self.schema.clone())
    }

    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            undo_levels: self.undo_levels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            undo_levels: default_undo_levels(),
            log_level: default_log_level(),
        }
    }
}

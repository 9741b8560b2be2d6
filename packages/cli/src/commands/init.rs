use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use docgraph_editor::Document;
use docgraph_model::{Node, Snapshot};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

const EXAMPLE_SNAPSHOT: &str = "example.json";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Maximum undo depth written to the config (0 = unlimited)
    #[arg(short, long, default_value_t = 100)]
    pub undo_levels: usize,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing docgraph project...".bright_blue().bold());

    let config = Config {
        undo_levels: args.undo_levels,
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let example_path = PathBuf::from(cwd).join(EXAMPLE_SNAPSHOT);
    if !example_path.exists() {
        let snapshot = example_snapshot(&config)?;
        fs::write(&example_path, serde_json::to_string_pretty(&snapshot)?)?;
        println!("  {} Created {}", "✓".green(), EXAMPLE_SNAPSHOT);
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: docgraph inspect {}", EXAMPLE_SNAPSHOT);
    println!("  2. Write a replay script and run: docgraph replay {} script.json", EXAMPLE_SNAPSHOT);

    Ok(())
}

/// A paragraph with a bold annotation, built through the editor
fn example_snapshot(config: &Config) -> Result<Snapshot> {
    let mut doc = Document::with_options(config.schema(), config.document_options());
    doc.create(Node::new("p1", "paragraph").with("text", "Hello, docgraph"))?;
    doc.create(
        Node::new("a1", "bold")
            .with("path", json!(["p1", "text"]))
            .with("startOffset", 0)
            .with("endOffset", 5),
    )?;
    Ok(doc.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_snapshot_loads_back() {
        let config = Config::default();
        let snapshot = example_snapshot(&config).unwrap();
        assert_eq!(snapshot.nodes.len(), 2);

        let doc = Document::from_snapshot(config.schema(), &snapshot).unwrap();
        assert_eq!(doc.annotation_index().unwrap().len(), 1);
    }
}

use crate::commands::load_document;
use crate::config::Config;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use docgraph_editor::Document;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Snapshot file to inspect
    pub snapshot: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// What a document holds, per type and per annotated property
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub schema: String,
    pub nodes: usize,
    pub types: BTreeMap<String, usize>,
    pub annotations: Vec<AnnotationSummary>,
    pub container_annotations: Vec<ContainerAnnotationSummary>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSummary {
    pub id: String,
    pub node_type: String,
    pub path: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAnnotationSummary {
    pub id: String,
    pub node_type: String,
    pub container: String,
    pub start: String,
    pub end: String,
}

pub fn summarize(doc: &Document) -> Summary {
    let types = doc
        .type_index()
        .map(|index| {
            index
                .types()
                .into_iter()
                .map(|node_type| (node_type.to_string(), index.count(node_type)))
                .collect()
        })
        .unwrap_or_default();

    let annotations = doc
        .annotation_index()
        .map(|index| {
            index
                .paths()
                .into_iter()
                .flat_map(move |path| {
                    index.entries(path).iter().map(move |entry| AnnotationSummary {
                        id: entry.id.clone(),
                        node_type: entry.node_type.clone(),
                        path: path.to_string(),
                        start: entry.start,
                        end: entry.end,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let container_annotations = doc
        .container_annotation_index()
        .map(|index| {
            index
                .get(None)
                .into_iter()
                .map(|entry| ContainerAnnotationSummary {
                    id: entry.id.clone(),
                    node_type: entry.node_type.clone(),
                    container: entry.anchor.container.clone(),
                    start: format!("{}:{}", entry.anchor.start_path, entry.anchor.start_offset),
                    end: format!("{}:{}", entry.anchor.end_path, entry.anchor.end_offset),
                })
                .collect()
        })
        .unwrap_or_default();

    Summary {
        schema: doc.schema().qualified_name(),
        nodes: doc.get_nodes().len(),
        types,
        annotations,
        container_annotations,
    }
}

pub fn inspect(args: InspectArgs, config: &Config) -> Result<()> {
    let doc = load_document(&args.snapshot, config)?;
    let summary = summarize(&doc);

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "text" => print_summary(&args, &summary),
        other => bail!("Unknown format: {}. Use: text or json", other),
    }

    Ok(())
}

fn print_summary(args: &InspectArgs, summary: &Summary) {
    println!("🔍 {} {}", "Inspecting".green().bold(), args.snapshot.display());
    println!("   Schema: {}", summary.schema.bright_white());
    println!("   Nodes:  {}", summary.nodes);
    println!();

    println!("{}", "Types".bold());
    for (node_type, count) in &summary.types {
        println!("   {:<20} {}", node_type, count);
    }

    if !summary.annotations.is_empty() {
        println!();
        println!("{}", "Annotations".bold());
        for anno in &summary.annotations {
            println!(
                "   {} {} {} [{}, {})",
                anno.id.bright_white(),
                anno.node_type.cyan(),
                anno.path,
                anno.start,
                anno.end
            );
        }
    }

    if !summary.container_annotations.is_empty() {
        println!();
        println!("{}", "Container annotations".bold());
        for anno in &summary.container_annotations {
            println!(
                "   {} {} in {}: {} → {}",
                anno.id.bright_white(),
                anno.node_type.cyan(),
                anno.container,
                anno.start,
                anno.end
            );
        }
    }
}

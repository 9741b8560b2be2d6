use crate::commands::load_document;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use docgraph_editor::{ChangeInfo, Document};
use docgraph_model::{NodeStore, ObjectOperation};
use serde::Deserialize;
use serde_json::json;
use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Snapshot file to start from
    pub snapshot: PathBuf,

    /// Script of steps to run against the snapshot
    pub script: PathBuf,

    /// Write the resulting snapshot here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// One script step: `{"transaction": [ops...]}`, `"undo"` or `"redo"`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Transaction(Vec<ObjectOperation>),
    Undo,
    Redo,
}

/// Counters collected while running a script
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplayReport {
    pub transactions: usize,
    pub operations: usize,
    pub undos: usize,
    pub redos: usize,
    /// Undo/redo steps with nothing to replay
    pub skipped: usize,
    pub changes_notified: usize,
}

/// Runs `steps` in order; a failing transaction is cancelled and aborts the run
pub fn run_script(doc: &mut Document, steps: &[Step]) -> Result<ReplayReport> {
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    doc.on_change(move |_, _| counter.set(counter.get() + 1));

    let mut report = ReplayReport::default();
    for (n, step) in steps.iter().enumerate() {
        match step {
            Step::Transaction(ops) => {
                let tx = doc.start_transaction(json!({ "step": n }))?;
                let staged = ops.iter().try_for_each(|op| tx.apply(op).map(drop));
                if let Err(err) = staged {
                    doc.cancel_transaction()?;
                    return Err(err).with_context(|| format!("Step {} failed", n));
                }
                doc.save_transaction(None, json!({ "step": n + 1 }), ChangeInfo::with_data(json!({ "step": n })))?;
                info!(step = n, ops = ops.len(), "Transaction saved");
                report.transactions += 1;
                report.operations += ops.len();
            }
            Step::Undo => {
                if doc.undo()? {
                    report.undos += 1;
                } else {
                    warn!(step = n, "Nothing to undo");
                    report.skipped += 1;
                }
            }
            Step::Redo => {
                if doc.redo()? {
                    report.redos += 1;
                } else {
                    warn!(step = n, "Nothing to redo");
                    report.skipped += 1;
                }
            }
        }
    }

    report.changes_notified = notified.get();
    Ok(report)
}

pub fn replay(args: ReplayArgs, config: &Config) -> Result<()> {
    let mut doc = load_document(&args.snapshot, config)?;
    let content = fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read {}", args.script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid script {}", args.script.display()))?;

    eprintln!("▶️  {} {} steps", "Replaying".green().bold(), steps.len());
    let report = run_script(&mut doc, &steps)?;

    eprintln!("   Transactions: {} ({} ops)", report.transactions, report.operations);
    eprintln!("   Undos: {}  Redos: {}", report.undos, report.redos);
    if report.skipped > 0 {
        eprintln!("   {} {}", "Skipped:".yellow(), report.skipped);
    }
    eprintln!("   Changes notified: {}", report.changes_notified);
    eprintln!(
        "   History: {} undo / {} redo",
        doc.undo_levels(),
        doc.redo_levels()
    );

    let snapshot = serde_json::to_string_pretty(&doc.to_json())?;
    match args.out {
        Some(out) => {
            fs::write(&out, snapshot)?;
            eprintln!("✨ {} {}", "Wrote".green().bold(), out.display());
        }
        None => println!("{}", snapshot),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_model::{Node, PropertyPath};

    fn document() -> Document {
        let config = Config::default();
        let mut doc = Document::with_options(config.schema(), config.document_options());
        doc.create(Node::new("p1", "paragraph").with("text", "Hello"))
            .unwrap();
        doc.clear_history();
        doc
    }

    #[test]
    fn test_parse_script() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                {"transaction": [
                    {"op": "set", "path": ["p1", "text"], "value": "Hi"},
                    {"op": "delete", "id": "p1"}
                ]},
                "undo",
                "redo"
            ]"#,
        )
        .unwrap();

        assert_eq!(steps.len(), 3);
        assert!(matches!(&steps[0], Step::Transaction(ops) if ops.len() == 2));
        assert_eq!(steps[1], Step::Undo);
        assert_eq!(steps[2], Step::Redo);
    }

    #[test]
    fn test_run_script() {
        let mut doc = document();
        let steps = vec![
            Step::Transaction(vec![ObjectOperation::update(
                ["p1", "text"],
                docgraph_model::Diff::insert_text(5, "!"),
            )]),
            Step::Undo,
            Step::Undo,
            Step::Redo,
        ];

        let report = run_script(&mut doc, &steps).unwrap();
        assert_eq!(
            report,
            ReplayReport {
                transactions: 1,
                operations: 1,
                undos: 1,
                redos: 1,
                skipped: 1,
                changes_notified: 3,
            }
        );
        assert_eq!(doc.get(&PropertyPath::from(["p1", "text"])), Some(&json!("Hello!")));
    }

    #[test]
    fn test_failing_step_is_cancelled() {
        let mut doc = document();
        let steps = vec![Step::Transaction(vec![
            ObjectOperation::set(["p1", "text"], "changed"),
            ObjectOperation::delete("missing"),
        ])];

        assert!(run_script(&mut doc, &steps).is_err());
        assert!(!doc.is_transacting());
        assert_eq!(doc.get(&PropertyPath::from(["p1", "text"])), Some(&json!("Hello")));
    }
}

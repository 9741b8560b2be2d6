mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, inspect, replay, InitArgs, InspectArgs, ReplayArgs};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Docgraph CLI - inspect and replay transactional document graphs
#[derive(Parser, Debug)]
#[command(name = "docgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./docgraph.config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config and an example snapshot
    Init(InitArgs),

    /// Summarize the nodes and annotations of a snapshot
    Inspect(InspectArgs),

    /// Run a script of transactions, undos and redos against a snapshot
    Replay(ReplayArgs),
}

fn init_tracing(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(&cwd)?,
    };
    init_tracing(&config, cli.verbose);

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Inspect(args) => inspect(args, &config),
        Command::Replay(args) => replay(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

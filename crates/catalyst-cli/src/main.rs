//! Catalyst CLI: runs the recommendation pipeline or inspects a reply.
//!
//! Usage:
//!   catalyst run [--config catalyst.yaml]
//!   catalyst parse <reply-file> [--mode digest|single|multi|analysis|candidate]

use anyhow::{bail, Context, Result};
use catalyst_core::{PipelineState, RunOutcome};
use catalyst_parse::{digest, extract_analysis, extract_many, extract_single, find_candidate};
use catalyst_stages::{standard_pipeline, Collaborators, JsonFileSink, PipelineConfig};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "catalyst", version, about = "LLM-driven catalyst composition recommender")]
struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline once
    Run {
        /// YAML configuration; paths inside are relative to its directory
        #[arg(long, default_value = "catalyst.yaml")]
        config: PathBuf,
    },
    /// Extract compositions from a saved reply and print them as JSON
    Parse {
        reply: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Digest)]
        mode: Mode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Digest,
    Single,
    Multi,
    Analysis,
    /// First parseable mapping, unvalidated, with the strategy that found it
    Candidate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { config } => run(&config),
        Commands::Parse { reply, mode } => parse(&reply, mode),
    }
}

fn run(config_path: &Path) -> Result<()> {
    let config = if config_path.exists() {
        PipelineConfig::load(config_path)?
    } else {
        info!(path = %config_path.display(), "config not found, using defaults");
        PipelineConfig::default()
    };
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let config = config.relative_to(base);

    let collaborators = Collaborators::from_config(&config).context("wiring collaborators")?;
    let runner = standard_pipeline(collaborators, config.search_space_limit);
    let outcome = runner.run(PipelineState::new());
    report(&outcome, &config);

    if !outcome.is_success() {
        bail!(
            "run {} failed at {}: {}",
            outcome.state.run_id,
            outcome.state.failed_stage().unwrap_or("?"),
            outcome.state.error().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn report(outcome: &RunOutcome, config: &PipelineConfig) {
    let state = &outcome.state;
    println!("run:          {}", state.run_id);
    println!("terminal:     {:?}", outcome.terminal);
    println!("compositions: {}", state.compositions.len());
    for (i, composition) in state.compositions.iter().enumerate() {
        println!("  {}. {}", i + 1, composition);
    }
    if let Some(usage) = &state.tool_usage {
        println!(
            "tool calls:   {} ({} ok, {} failed)",
            usage.total_calls, usage.successful_calls, usage.failed_calls
        );
    }
    let sink = JsonFileSink::new(&config.results_dir);
    if outcome.is_success() {
        println!("written:      {}", sink.result_path().display());
    } else if outcome.error_handler_failed() {
        println!("written:      nothing (error record could not be saved)");
    } else {
        println!("written:      {}", sink.error_path().display());
    }
}

fn parse(path: &Path, mode: Mode) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let output = match mode {
        Mode::Digest => serde_json::to_value(digest(&text))?,
        Mode::Single => serde_json::to_value(extract_single(&text))?,
        Mode::Multi => serde_json::to_value(extract_many(&text))?,
        Mode::Analysis => serde_json::to_value(extract_analysis(&text))?,
        Mode::Candidate => match find_candidate(&text) {
            Some((strategy, raw)) => json!({
                "strategy": strategy,
                "keys": raw.iter().map(|(k, _)| k).collect::<Vec<_>>(),
                "valid": catalyst_core::validate(&raw).is_ok(),
            }),
            None => json!(null),
        },
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

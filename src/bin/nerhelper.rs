//! nerhelper CLI: suggest entity tags for TEI documents, then apply the
//! reviewed suggestions.
//!
//! Usage:
//!   nerhelper suggest <FILES>... [--categories PERSON,GPE] [--out DIR]
//!   nerhelper revise <XML> <CSV> [--out DIR] [--actor ID]
//!   nerhelper config

use clap::{ArgAction, Parser, Subcommand};
use nerhelper::{Category, NerConfig, Pipeline, ProvenanceRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "nerhelper",
    version,
    about = "Human-in-the-loop named-entity tagging for TEI-XML"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Configuration file (default: <config dir>/nerhelper/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect entities and write one suggestion table per document
    Suggest {
        /// TEI documents to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Categories to suggest (comma separated)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<Category>,
        /// Output directory for the CSV tables
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Keyword-in-context radius in characters
        #[arg(long)]
        radius: Option<usize>,
        /// Write a JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Apply a reviewed suggestion table to its document
    Revise {
        /// Original TEI document
        xml: PathBuf,
        /// Reviewed suggestion table
        csv: PathBuf,
        /// Output directory for the revised document
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Identity recorded in the revision history
        #[arg(long)]
        actor: Option<String>,
        /// Write a JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the effective configuration as YAML
    Config,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("cannot serialize report: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("cannot write '{}': {}", path.display(), e))
}

fn cmd_suggest(
    mut config: NerConfig,
    files: &[PathBuf],
    categories: Vec<Category>,
    out: PathBuf,
    radius: Option<usize>,
    report: Option<&Path>,
) -> i32 {
    if !categories.is_empty() {
        config.categories = categories;
    }
    if let Some(radius) = radius {
        config.kwic_radius = radius;
    }

    let pipeline = Pipeline::new(config, out);
    let batch = pipeline.suggest_batch(files);

    for outcome in &batch.succeeded {
        println!(
            "{}: {} suggestions, {} already encoded, {} not placed -> {}",
            outcome.document,
            outcome.suggestions,
            outcome.already_encoded,
            outcome.skipped.len(),
            outcome.table.display()
        );
        for skipped in &outcome.skipped {
            println!(
                "  {} `{}` at {}: {}",
                skipped.category, skipped.entity, skipped.key, skipped.reason
            );
        }
    }
    for failed in &batch.failed {
        eprintln!("Error: {}", failed.error);
    }

    if let Some(path) = report {
        if let Err(e) = write_report(path, &batch) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if batch.is_success() {
        0
    } else {
        1
    }
}

fn cmd_revise(
    mut config: NerConfig,
    xml: &Path,
    csv: &Path,
    out: PathBuf,
    actor: Option<String>,
    report: Option<&Path>,
) -> i32 {
    if let Some(actor) = actor {
        config.provenance.actor = actor;
    }
    let record = ProvenanceRecord::new(&config.provenance);
    let pipeline = Pipeline::new(config, out);

    let outcome = match pipeline.revise_file(xml, csv, record) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!(
        "{}: {} fragments changed ({} applied, {} skipped) -> {}",
        outcome.document,
        outcome.fragments_changed,
        outcome.applied,
        outcome.skipped,
        outcome.output.display()
    );
    for violation in &outcome.violations {
        println!("  refused: {}", violation);
    }
    if outcome.ignored_rows > 0 {
        println!("  {} rows for other files ignored", outcome.ignored_rows);
    }

    if let Some(path) = report {
        if let Err(e) = write_report(path, &outcome) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    0
}

fn cmd_config(config: &NerConfig) -> i32 {
    match config.to_yaml() {
        Ok(yaml) => {
            print!("{}", yaml);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match NerConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Suggest {
            files,
            categories,
            out,
            radius,
            report,
        } => cmd_suggest(config, &files, categories, out, radius, report.as_deref()),
        Commands::Revise {
            xml,
            csv,
            out,
            actor,
            report,
        } => cmd_revise(config, &xml, &csv, out, actor, report.as_deref()),
        Commands::Config => cmd_config(&config),
    };
    std::process::exit(code);
}

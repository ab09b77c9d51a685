//! countertype: command-line front end for injection and resilience scoring.
//!
//! # Usage
//!
//! ```bash
//! # Inject false certainty into a reasoning tree (deterministic with --seed)
//! countertype inject --input node.json --seed 7 > injected.json
//!
//! # Judge a response against the injected tree
//! countertype detect --response response.json --original injected.json
//!
//! # Score an attempt and persist the contributor's profile
//! countertype score --store profiles.json --contributor ada --attempt attempt.json
//!
//! # Custom configuration
//! COUNTERTYPE_INTENSITY=0.5 countertype --config countertype.toml inject --input node.json
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use countertype::CountertypeConfig;
use tracing::debug;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (COUNTERTYPE_* environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inject the certainty cascade into a reasoning tree
    Inject {
        /// Reasoning tree JSON file
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        intensity: Option<f64>,
        #[arg(long)]
        cascade_depth: Option<u32>,
        #[arg(long)]
        filter_threshold: Option<f64>,
        /// Seed for phrase selection (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Judge whether a response escapes an injected tree
    Detect {
        /// Response JSON file
        #[arg(long)]
        response: PathBuf,
        /// Injected reasoning tree JSON file
        #[arg(long)]
        original: PathBuf,
    },
    /// Print hints for spotting the certainty cascade
    Hints,
    /// Score an escape attempt and update the contributor's profile
    Score {
        /// Profile store JSON file (created if missing)
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        contributor: String,
        /// Escape attempt JSON file
        #[arg(long)]
        attempt: PathBuf,
    },
    /// Show the top contributors by total resilience
    Leaderboard {
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print a contributor's export record
    Export {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        contributor: String,
    },
    /// Install an export record into the store, replacing any existing profile
    Import {
        #[arg(long)]
        store: PathBuf,
        /// Export record JSON file
        #[arg(long)]
        record: PathBuf,
    },
    /// Print the JSON schema of an input record
    Schema {
        #[arg(value_enum)]
        record: SchemaKind,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SchemaKind {
    Node,
    Attempt,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CountertypeConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    debug!(?config, "Configuration loaded");

    let output = commands::run(args.command, config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

//! labelfilter command-line front end
//!
//! Drives a label filter against the HTTP label API or a JSON fixture:
//! - **keys**: list label keys
//! - **resolve**: materialize `key:value` selectors
//! - **search**: list the options a query would offer

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labelfilter::CatalogMode;
use labelfilter_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

#[derive(Parser, Debug)]
#[command(name = "labelfilter", about = "Resolve and search key:value labels")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Also write logs to ~/.labelfilter/logs/labelfilter.log
    #[arg(long, global = true)]
    log_file: bool,

    /// Config file (default: ~/.labelfilter/config.toml)
    #[arg(long, global = true, env = "LABELFILTER_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog to use: labels or alert_group_labels
    #[arg(long, global = true)]
    mode: Option<CatalogMode>,

    /// API root of the label endpoints (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Serve the catalog from a JSON fixture (overrides config)
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every label key in the catalog
    Keys,

    /// Resolve key:value selectors to key and value names
    Resolve {
        /// Selectors of the form <keyId>:<valueId>
        #[arg(required = true)]
        selectors: Vec<String>,
    },

    /// Show the key:value options matching a query
    Search {
        /// Case-insensitive substring of the key name
        query: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "labelfilter",
        verbose: cli.verbose,
        log_to_file: cli.log_file,
    }) {
        eprintln!("warning: logging disabled: {:#}", err);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = commands::Settings::load(
        cli.config.as_deref(),
        commands::Overrides {
            mode: cli.mode,
            base_url: cli.base_url,
            fixture: cli.fixture,
        },
    )?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let rendered = runtime.block_on(async {
        match cli.command {
            Commands::Keys => commands::keys(&settings, cli.json).await,
            Commands::Resolve { selectors } => commands::resolve(&settings, &selectors, cli.json).await,
            Commands::Search { query } => commands::search(&settings, &query, cli.json).await,
        }
    })?;

    println!("{}", rendered);
    Ok(())
}

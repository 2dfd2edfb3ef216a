//! Tabula CLI
//!
//! Command-line interface for tables declared in the tabula config file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tabula_core::{AsyncTable, Config};

mod assign;
mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula - schema-driven SQLite tables")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to ~/.config/tabula/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Table to operate on (logical or physical name)
    #[arg(short, long, global = true)]
    table: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the table if it does not exist
    Init,
    /// Add a record: field=value for every field
    Add {
        /// field=value pairs
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Show one record
    Get {
        /// Record id
        id: i64,
    },
    /// Search records; no filters lists everything
    #[command(alias = "ls")]
    Search {
        /// field=value filters, combined with AND
        filters: Vec<String>,
        /// Substring match on text fields
        #[arg(short, long)]
        fuzzy: bool,
    },
    /// Change some fields of a record
    Modify {
        /// Record id
        id: i64,
        /// field=value pairs
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record id
        id: i64,
    },
    /// Count records
    Count,
    /// Rebuild the database file
    Vacuum,
    /// Show the table's fields and DDL
    Schema,
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(db) = &cli.db {
        config.database = db.clone();
    }

    // Commands that don't need a table
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(&config, cli.config.as_ref(), &output)
            }
        };
    }

    let table_config = commands::table::resolve(&config, cli.table.as_deref())?;
    let factory = table_config
        .factory()
        .with_context(|| format!("Invalid table definition: {}", table_config.name))?;

    if let Commands::Schema = cli.command {
        return commands::table::schema(&factory, &output);
    }

    let table = factory.open_async(config.database.as_path());
    table
        .activate()
        .await
        .with_context(|| format!("Failed to open {}", config.database.display()))?;

    let result = run(cli.command, &table, &output).await;
    table.close().await;
    result
}

async fn run(command: Commands, table: &AsyncTable, output: &Output) -> Result<()> {
    match command {
        Commands::Init => commands::table::init(table, output).await,
        Commands::Add { fields } => commands::record::add(table, &fields, output).await,
        Commands::Get { id } => commands::record::get(table, id, output).await,
        Commands::Search { filters, fuzzy } => {
            commands::record::search(table, &filters, fuzzy, output).await
        }
        Commands::Modify { id, fields } => {
            commands::record::modify(table, id, &fields, output).await
        }
        Commands::Delete { id } => commands::record::delete(table, id, output).await,
        Commands::Count => commands::record::count(table, output).await,
        Commands::Vacuum => commands::table::vacuum(table, output).await,
        Commands::Schema | Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Install the stderr log subscriber
///
/// `TABULA_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_env("TABULA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!("tabula_core={},tabula_cli={}", level, level))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Config command handlers

use std::path::PathBuf;

use anyhow::Result;

use tabula_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Quiet => {
            println!("{}", config.database.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  database:      {}", config.database.display());
            println!(
                "  default_table: {}",
                config.default_table.as_deref().unwrap_or("(not set)")
            );
            if config.tables.is_empty() {
                println!("  tables:        (none)");
            } else {
                println!("  tables:");
                for table in &config.tables {
                    let physical = table.table_name.as_deref().unwrap_or(&table.name);
                    println!(
                        "    {} -> {} ({} field(s))",
                        table.name,
                        physical,
                        table.fields.len()
                    );
                }
            }
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

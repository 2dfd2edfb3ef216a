//! Table command handlers

use anyhow::{bail, Context, Result};

use tabula_core::{AsyncTable, Config, TableConfig, TableFactory};
use tracing::info;

use crate::output::{Output, OutputFormat};

/// Pick the table a command runs against
pub fn resolve<'a>(config: &'a Config, name: Option<&str>) -> Result<&'a TableConfig> {
    if let Some(table) = config.table(name) {
        return Ok(table);
    }

    let declared: Vec<&str> = config.tables.iter().map(|t| t.name.as_str()).collect();
    match (name.or(config.default_table.as_deref()), declared.is_empty()) {
        (_, true) => bail!(
            "No tables declared. Add a [[tables]] entry to {}",
            Config::config_file_path().display()
        ),
        (Some(name), false) => bail!(
            "Unknown table '{}' (declared: {})",
            name,
            declared.join(", ")
        ),
        (None, false) => bail!(
            "Several tables declared, pick one with --table ({})",
            declared.join(", ")
        ),
    }
}

/// Create the table
pub async fn init(table: &AsyncTable, output: &Output) -> Result<()> {
    table
        .create_table()
        .await
        .context("Failed to create table")?;

    info!("Table {} ready in {}", table.table_name(), table.db_path());
    output.success(&format!(
        "Table {} ready in {}",
        table.table_name(),
        table.db_path()
    ));
    Ok(())
}

/// Rebuild the database file
pub async fn vacuum(table: &AsyncTable, output: &Output) -> Result<()> {
    table.vacuum().await.context("Failed to vacuum database")?;
    output.success("Vacuumed database");
    Ok(())
}

/// Show fields and DDL
pub fn schema(factory: &TableFactory, output: &Output) -> Result<()> {
    let schema = factory.schema();
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "name": factory.name(),
                    "table_name": factory.table_name(),
                    "fields": schema.fields(),
                    "ddl": factory.ddl(),
                })
            );
        }
        OutputFormat::Quiet => {
            for name in schema.names() {
                println!("{}", name);
            }
        }
        OutputFormat::Human => {
            println!("Table: {} ({})", factory.table_name(), factory.name());
            println!();
            for field in schema.fields() {
                let mut flags = Vec::new();
                if field.unique {
                    flags.push("unique");
                }
                if field.nullable {
                    flags.push("nullable");
                }
                println!("  {:16} {:8} {}", field.name, field.ty, flags.join(", "));
            }
            println!();
            println!("{};", factory.ddl());
        }
    }
    Ok(())
}

//! Record command handlers

use anyhow::{Context, Result};

use tabula_core::AsyncTable;

use crate::assign::parse_assignments;
use crate::output::Output;

/// Add a record
pub async fn add(table: &AsyncTable, fields: &[String], output: &Output) -> Result<()> {
    let record = parse_assignments(fields, table.schema(), false)?;
    let id = table
        .add(&record)
        .await
        .context("Failed to add record")?
        .context("Record was not inserted")?;

    output.success(&format!("Added record {} to {}", id, table.table_name()));
    output.print_number("id", id);
    Ok(())
}

/// Show a single record
pub async fn get(table: &AsyncTable, id: i64, output: &Output) -> Result<()> {
    let record = table
        .get(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Record not found: {}", id))?;

    output.print_record(&record);
    Ok(())
}

/// Search records
pub async fn search(
    table: &AsyncTable,
    filters: &[String],
    fuzzy: bool,
    output: &Output,
) -> Result<()> {
    let filters = parse_assignments(filters, table.schema(), true)?;
    let records = table
        .search(&filters, fuzzy)
        .await
        .context("Failed to search records")?;

    output.print_records(&records, table.schema());
    Ok(())
}

/// Change some fields of a record
pub async fn modify(table: &AsyncTable, id: i64, fields: &[String], output: &Output) -> Result<()> {
    let changes = parse_assignments(fields, table.schema(), false)?;

    // Modifying a missing id is a silent no-op in the engine
    if table.get(id).await?.is_none() {
        anyhow::bail!("Record not found: {}", id);
    }

    table
        .modify(id, &changes)
        .await
        .with_context(|| format!("Failed to modify record {}", id))?;

    output.success(&format!("Modified record {}", id));
    Ok(())
}

/// Delete a record
pub async fn delete(table: &AsyncTable, id: i64, output: &Output) -> Result<()> {
    table
        .delete(id)
        .await
        .with_context(|| format!("Failed to delete record {}", id))?;

    output.success(&format!("Deleted record {}", id));
    Ok(())
}

/// Count records
pub async fn count(table: &AsyncTable, output: &Output) -> Result<()> {
    let n = table.count().await?;
    output.print_number("count", n);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use tabula_core::{PrimitiveType, TableFactory, Value};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn books(dir: &tempfile::TempDir) -> AsyncTable {
        let table = TableFactory::new(
            [("title", PrimitiveType::Text), ("pages", PrimitiveType::Integer)],
            "books",
        )
        .unwrap()
        .open_async(dir.path().join("books.db"));
        table.activate().await.unwrap();
        table
    }

    #[tokio::test]
    async fn test_add_modify_delete() {
        let dir = tempfile::tempdir().unwrap();
        let table = books(&dir).await;
        let output = Output::new(OutputFormat::Quiet);

        add(&table, &args(&["title=Dune", "pages=412"]), &output)
            .await
            .unwrap();
        modify(&table, 1, &args(&["pages=500"]), &output)
            .await
            .unwrap();

        let record = table.get(1).await.unwrap().unwrap();
        assert_eq!(record.get("pages"), Some(&Value::Integer(500)));

        delete(&table, 1, &output).await.unwrap();
        assert_eq!(table.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_records_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let table = books(&dir).await;
        let output = Output::new(OutputFormat::Quiet);

        assert!(get(&table, 7, &output).await.is_err());
        assert!(modify(&table, 7, &args(&["pages=1"]), &output).await.is_err());
    }

    #[tokio::test]
    async fn test_add_requires_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let table = books(&dir).await;
        let output = Output::new(OutputFormat::Quiet);

        assert!(add(&table, &args(&["title=Dune"]), &output).await.is_err());
        assert_eq!(table.count().await.unwrap(), 0);
    }
}

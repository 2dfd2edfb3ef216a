//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use tabula_core::{Record, Schema, Value, ID_FIELD};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single record, one field per line
    pub fn print_record(&self, record: &Record) {
        match self.format {
            OutputFormat::Human => {
                let width = record.keys().map(str::len).max().unwrap_or(0);
                for (name, value) in record.iter() {
                    println!("{:width$}  {}", name, display_value(value), width = width);
                }
            }
            OutputFormat::Json => print_json(record),
            OutputFormat::Quiet => {
                if let Some(id) = record.id() {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print records as a table
    pub fn print_records(&self, records: &[Record], schema: &Schema) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No records found.");
                    return;
                }

                let mut columns = vec![ID_FIELD];
                columns.extend(schema.names());
                let rows: Vec<Vec<String>> = records
                    .iter()
                    .map(|record| {
                        columns
                            .iter()
                            .map(|name| {
                                record
                                    .get(name)
                                    .map(|v| truncate(&display_value(v), 40))
                                    .unwrap_or_default()
                            })
                            .collect()
                    })
                    .collect();

                let widths: Vec<usize> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        rows.iter()
                            .map(|row| row[i].chars().count())
                            .chain(std::iter::once(name.len()))
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();

                println!("{}", format_row(columns.iter().copied(), &widths));
                for row in &rows {
                    println!("{}", format_row(row.iter().map(String::as_str), &widths));
                }
                println!("\n{} record(s)", records.len());
            }
            OutputFormat::Json => print_json(&records),
            OutputFormat::Quiet => {
                for id in records.iter().filter_map(Record::id) {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print a bare number (ids, counts)
    pub fn print_number(&self, label: &str, n: i64) {
        match self.format {
            OutputFormat::Human => println!("{}: {}", label, n),
            OutputFormat::Json => {
                let mut object = serde_json::Map::new();
                object.insert(label.to_string(), n.into());
                println!("{}", serde_json::Value::Object(object));
            }
            OutputFormat::Quiet => println!("{}", n),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if matches!(self.format, OutputFormat::Human) {
            println!("{}", message);
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Blob(_) => format!("0x{}", value),
        other => other.to_string(),
    }
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), "-");
        assert_eq!(display_value(&Value::Blob(vec![0xca, 0xfe])), "0xcafe");
        assert_eq!(display_value(&Value::Real(72.1)), "72.1");
    }

    #[test]
    fn test_format_row_pads_columns() {
        let row = format_row(["1", "Dune"].into_iter(), &[2, 6]);
        assert_eq!(row, "1  | Dune");
    }
}

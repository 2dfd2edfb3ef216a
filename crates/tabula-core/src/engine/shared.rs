//! Schema-bound statement rendering
//!
//! [`TableCore`] is the part of a table engine that does not care how the
//! connection is shared: it validates records against the schema and renders
//! the SQL for every operation. Field and table names are checked
//! identifiers; every value travels as a bound parameter.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::record::{Record, ID_FIELD};
use crate::schema::Schema;
use crate::storage::Statement;
use crate::types::PrimitiveType;
use crate::value::Value;

/// A record's shape does not fit the schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("keys not equal ({0})")]
    KeysMismatch(KeyDiff),

    #[error("unexpected keys: {}", .0.join(", "))]
    UnexpectedKeys(Vec<String>),

    #[error("field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: PrimitiveType,
        found: PrimitiveType,
    },
}

/// Difference between a record's keys and the expected keys
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyDiff {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl fmt::Display for KeyDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing: {}", self.missing.join(", ")));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected: {}", self.unexpected.join(", ")));
        }
        f.write_str(&parts.join("; "))
    }
}

/// Check a record's keys against a reference key set
///
/// With `full_match` the sets must be equal; otherwise the record's keys
/// must be a subset of the reference.
pub fn validate_keys<'a, I>(
    keys: I,
    reference: &[&str],
    full_match: bool,
) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let keys: Vec<&str> = keys.into_iter().collect();
    let key_set: HashSet<&str> = keys.iter().copied().collect();
    let reference_set: HashSet<&str> = reference.iter().copied().collect();

    let unexpected: Vec<String> = keys
        .iter()
        .filter(|k| !reference_set.contains(*k))
        .map(|k| k.to_string())
        .collect();

    if full_match {
        let missing: Vec<String> = reference
            .iter()
            .filter(|k| !key_set.contains(*k))
            .map(|k| k.to_string())
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ValidationError::KeysMismatch(KeyDiff {
                missing,
                unexpected,
            }));
        }
        return Ok(());
    }

    if !unexpected.is_empty() {
        return Err(ValidationError::UnexpectedKeys(unexpected));
    }
    Ok(())
}

/// Schema plus table name; renders the statements for every operation
#[derive(Debug, Clone)]
pub struct TableCore {
    name: String,
    table_name: String,
    schema: Arc<Schema>,
}

impl TableCore {
    /// Names must already be validated identifiers
    pub fn new(name: String, table_name: String, schema: Arc<Schema>) -> Self {
        Self {
            name,
            table_name,
            schema,
        }
    }

    /// Logical name the table was built under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical table name in the database
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// `CREATE TABLE IF NOT EXISTS` for the schema
    pub fn create_table(&self) -> Statement {
        let mut columns: Vec<String> = self
            .schema
            .fields()
            .iter()
            .map(|field| {
                let mut column = format!("{} {}", quote(&field.name), field.ty.storage_name());
                if field.unique {
                    column.push_str(" UNIQUE");
                }
                if !field.nullable {
                    column.push_str(" NOT NULL");
                }
                column
            })
            .collect();
        columns.push(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(ID_FIELD)));

        Statement::write(
            format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
                quote(&self.table_name),
                columns.join(",\n    ")
            ),
            Vec::new(),
        )
    }

    /// Insert a complete record; values are bound in schema order
    pub fn insert(&self, record: &Record) -> Result<Statement, ValidationError> {
        let names: Vec<&str> = self.schema.names().collect();
        validate_keys(record.keys(), &names, true)?;
        self.check_types(record)?;

        let params = names
            .iter()
            .map(|name| record.get(name).cloned().unwrap_or(Value::Null))
            .collect();
        let placeholders = vec!["?"; names.len()].join(", ");

        Ok(Statement::write(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(&self.table_name),
                quoted(names.iter().copied()),
                placeholders
            ),
            params,
        ))
    }

    pub fn delete(&self, id: i64) -> Statement {
        Statement::write(
            format!(
                "DELETE FROM {} WHERE {} = ?",
                quote(&self.table_name),
                quote(ID_FIELD)
            ),
            vec![Value::Integer(id)],
        )
    }

    /// Update the given fields of one row
    ///
    /// Returns `None` when there is nothing to change.
    pub fn update(&self, id: i64, changes: &Record) -> Result<Option<Statement>, ValidationError> {
        if changes.is_empty() {
            return Ok(None);
        }
        let names: Vec<&str> = self.schema.names().collect();
        validate_keys(changes.keys(), &names, false)?;
        self.check_types(changes)?;

        let assignments: Vec<String> = changes
            .keys()
            .map(|k| format!("{} = ?", quote(k)))
            .collect();
        let mut params: Vec<Value> = changes.iter().map(|(_, v)| v.clone()).collect();
        params.push(Value::Integer(id));

        Ok(Some(Statement::write(
            format!(
                "UPDATE {} SET {} WHERE {} = ?",
                quote(&self.table_name),
                assignments.join(", "),
                quote(ID_FIELD)
            ),
            params,
        )))
    }

    /// Select rows matching every filter
    ///
    /// With `fuzzy`, text filters match substrings; filters on other types
    /// always match exactly. A `Null` filter matches `NULL` columns.
    pub fn select(&self, filters: &Record, fuzzy: bool) -> Result<Statement, ValidationError> {
        let columns: Vec<&str> = self
            .schema
            .field_map_with_id()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        validate_keys(filters.keys(), &columns, false)?;
        self.check_types(filters)?;

        let mut sql = format!(
            "SELECT {} FROM {}",
            quoted(columns.iter().copied()),
            quote(&self.table_name)
        );
        let mut params = Vec::new();

        if !filters.is_empty() {
            let mut conditions = Vec::new();
            for (key, value) in filters.iter() {
                let ty = self.schema.field_type_with_id(key);
                match value {
                    Value::Null => conditions.push(format!("{} IS NULL", quote(key))),
                    Value::Text(text) if fuzzy && ty.is_some_and(PrimitiveType::supports_fuzzy) => {
                        conditions.push(format!("{} LIKE ? ESCAPE '\\'", quote(key)));
                        params.push(Value::Text(format!("%{}%", escape_like(text))));
                    }
                    _ => {
                        conditions.push(format!("{} = ?", quote(key)));
                        params.push(value.clone());
                    }
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {}", quote(ID_FIELD)));

        Ok(Statement::read(sql, params)
            .with_columns(columns.into_iter().map(String::from).collect()))
    }

    pub fn count(&self) -> Statement {
        Statement::read(
            format!("SELECT COUNT(*) FROM {}", quote(&self.table_name)),
            Vec::new(),
        )
    }

    pub fn vacuum(&self) -> Statement {
        Statement::write("VACUUM", Vec::new())
    }

    fn check_types(&self, record: &Record) -> Result<(), ValidationError> {
        for (name, value) in record.iter() {
            let (Some(expected), Some(found)) =
                (self.schema.field_type_with_id(name), value.primitive_type())
            else {
                continue;
            };
            if !value.fits(expected) {
                return Err(ValidationError::TypeMismatch {
                    field: name.to_string(),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

/// Quote an identifier so keywords (`order`, `group`) work as names
///
/// Names are checked identifiers, so they never contain `"`.
fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

fn quoted<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.map(quote).collect::<Vec<_>>().join(", ")
}

/// Escape LIKE wildcards so the pattern matches the literal text
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn books() -> TableCore {
        let schema = Schema::from_fields([
            FieldSpec::new("title", PrimitiveType::Text),
            FieldSpec::new("isbn", PrimitiveType::Text).unique(),
            FieldSpec::new("price", PrimitiveType::Real).nullable(),
            FieldSpec::new("pages", PrimitiveType::Integer),
        ])
        .unwrap();
        TableCore::new("Books".into(), "books".into(), Arc::new(schema))
    }

    fn full_record() -> Record {
        Record::new()
            .with("pages", 120)
            .with("title", "Dune")
            .with("price", 9.5)
            .with("isbn", "978")
    }

    #[test]
    fn test_validate_keys_full_match() {
        let reference = ["a", "b"];
        assert!(validate_keys(["b", "a"], &reference, true).is_ok());

        let err = validate_keys(["a", "c"], &reference, true).unwrap_err();
        assert_eq!(
            err,
            ValidationError::KeysMismatch(KeyDiff {
                missing: vec!["b".into()],
                unexpected: vec!["c".into()],
            })
        );
        assert!(err.to_string().contains("missing: b"));
    }

    #[test]
    fn test_validate_keys_partial_match() {
        let reference = ["a", "b"];
        assert!(validate_keys([], &reference, false).is_ok());
        assert!(validate_keys(["b"], &reference, false).is_ok());

        let err = validate_keys(["b", "x", "y"], &reference, false).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnexpectedKeys(vec!["x".into(), "y".into()])
        );
        assert_eq!(err.to_string(), "unexpected keys: x, y");
    }

    #[test]
    fn test_create_table_ddl() {
        let stmt = books().create_table();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE IF NOT EXISTS \"books\" (\n    \
             \"title\" TEXT NOT NULL,\n    \
             \"isbn\" TEXT UNIQUE NOT NULL,\n    \
             \"price\" REAL,\n    \
             \"pages\" INTEGER NOT NULL,\n    \
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT\n)"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_insert_binds_in_schema_order() {
        let stmt = books().insert(&full_record()).unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "books" ("title", "isbn", "price", "pages") VALUES (?, ?, ?, ?)"#
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::from("Dune"),
                Value::from("978"),
                Value::Real(9.5),
                Value::Integer(120),
            ]
        );
    }

    #[test]
    fn test_insert_requires_every_field() {
        let mut record = full_record();
        record.remove("isbn");
        assert!(matches!(
            books().insert(&record),
            Err(ValidationError::KeysMismatch(_))
        ));

        let record = full_record().with("extra", 1);
        assert!(matches!(
            books().insert(&record),
            Err(ValidationError::KeysMismatch(_))
        ));

        // id is never client-supplied
        let record = full_record().with("id", 1);
        assert!(matches!(
            books().insert(&record),
            Err(ValidationError::KeysMismatch(_))
        ));
    }

    #[test]
    fn test_type_checking() {
        let record = full_record().with("pages", "many");
        assert_eq!(
            books().insert(&record).unwrap_err(),
            ValidationError::TypeMismatch {
                field: "pages".into(),
                expected: PrimitiveType::Integer,
                found: PrimitiveType::Text,
            }
        );

        // Integers are accepted for real fields, nulls everywhere
        let record = full_record().with("price", 10).with("title", Value::Null);
        assert!(books().insert(&record).is_ok());
    }

    #[test]
    fn test_update() {
        let core = books();
        assert_eq!(core.update(1, &Record::new()).unwrap(), None);

        let stmt = core
            .update(7, &Record::new().with("price", 1.0).with("title", "X"))
            .unwrap()
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "books" SET "price" = ?, "title" = ? WHERE "id" = ?"#
        );
        assert_eq!(
            stmt.params,
            vec![Value::Real(1.0), Value::from("X"), Value::Integer(7)]
        );

        assert!(matches!(
            core.update(7, &Record::new().with("id", 3)),
            Err(ValidationError::UnexpectedKeys(ref k)) if k == &["id".to_string()]
        ));
    }

    #[test]
    fn test_select_without_filters() {
        let stmt = books().select(&Record::new(), false).unwrap();
        assert_eq!(
            stmt.sql,
            r#"SELECT "title", "isbn", "price", "pages", "id" FROM "books" ORDER BY "id""#
        );
        assert_eq!(stmt.columns, vec!["title", "isbn", "price", "pages", "id"]);
    }

    #[test]
    fn test_select_fuzzy_only_for_text() {
        let filters = Record::new().with("title", "Du").with("pages", 120);

        let exact = books().select(&filters, false).unwrap();
        assert!(exact
            .sql
            .ends_with(r#"WHERE "title" = ? AND "pages" = ? ORDER BY "id""#));
        assert_eq!(exact.params, vec![Value::from("Du"), Value::Integer(120)]);

        let fuzzy = books().select(&filters, true).unwrap();
        assert!(fuzzy
            .sql
            .ends_with(r#"WHERE "title" LIKE ? ESCAPE '\' AND "pages" = ? ORDER BY "id""#));
        assert_eq!(fuzzy.params, vec![Value::from("%Du%"), Value::Integer(120)]);
    }

    #[test]
    fn test_select_by_id_and_null() {
        let stmt = books()
            .select(&Record::new().with("id", 3).with("price", Value::Null), true)
            .unwrap();
        assert!(stmt
            .sql
            .ends_with(r#"WHERE "id" = ? AND "price" IS NULL ORDER BY "id""#));
        assert_eq!(stmt.params, vec![Value::Integer(3)]);
    }

    #[test]
    fn test_select_rejects_unknown_filters() {
        let err = books()
            .select(&Record::new().with("author", "x"), false)
            .unwrap_err();
        assert_eq!(err, ValidationError::UnexpectedKeys(vec!["author".into()]));
    }

    #[test]
    fn test_keyword_names_run_against_sqlite() {
        let schema = Schema::from_field_map([
            ("order", PrimitiveType::Integer),
            ("group", PrimitiveType::Text),
        ])
        .unwrap();
        let core = TableCore::new("select".into(), "select".into(), Arc::new(schema));
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        core.create_table().execute(&conn).unwrap();
        let record = Record::new().with("order", 1).with("group", "admins");
        core.insert(&record).unwrap().insert(&conn).unwrap();
        core.update(1, &Record::new().with("order", 2))
            .unwrap()
            .unwrap()
            .execute(&conn)
            .unwrap();

        let rows = core
            .select(&Record::new().with("group", "adm"), true)
            .unwrap()
            .query(&conn)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("order"), Some(&Value::Integer(2)));

        assert_eq!(core.count().query_i64(&conn).unwrap(), 1);
        core.delete(1).execute(&conn).unwrap();
        assert_eq!(core.count().query_i64(&conn).unwrap(), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_statements_run_against_sqlite() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let core = books();
        core.create_table().execute(&conn).unwrap();
        core.create_table().execute(&conn).unwrap();

        let id = core.insert(&full_record()).unwrap().insert(&conn).unwrap();
        assert_eq!(id, Some(1));

        let rows = core
            .select(&Record::new().with("title", "un"), true)
            .unwrap()
            .query(&conn)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), Some(1));
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec!["title", "isbn", "price", "pages", "id"]
        );

        assert_eq!(core.count().query_i64(&conn).unwrap(), 1);
        core.vacuum().execute(&conn).unwrap();
    }
}

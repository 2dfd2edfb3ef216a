//! Table schema definitions
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s describing the columns
//! of one table. The `id` column is implicit: it is added by the storage
//! layer and can never be declared by callers.
//!
//! Schemas can be built from a plain field map (every field defaults to
//! non-unique and `NOT NULL`) or from explicit field specs:
//!
//! ```
//! use tabula_core::{FieldSpec, PrimitiveType, Schema};
//!
//! let books = Schema::from_field_map([
//!     ("title", PrimitiveType::Text),
//!     ("price", PrimitiveType::Real),
//! ])
//! .unwrap();
//! assert_eq!(books.len(), 2);
//!
//! let users = Schema::from_fields([
//!     FieldSpec::new("email", PrimitiveType::Text).unique(),
//!     FieldSpec::new("nickname", PrimitiveType::Text).nullable(),
//! ])
//! .unwrap();
//! assert!(users.field("email").unwrap().unique);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::ID_FIELD;
use crate::types::PrimitiveType;

/// Names reserved for internal bookkeeping, compared case-insensitively
pub const RESERVED_NAMES: [&str; 2] = [ID_FIELD, "_fuzzy_match_"];

/// Errors raised while building a schema or binding it to a table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("name `{0}` is reserved for inner use")]
    ReservedName(String),

    #[error("invalid field spec `{name}`: {reason}")]
    InvalidFieldSpec { name: String, reason: String },

    #[error("duplicate field `{0}`")]
    DuplicateField(String),

    #[error("unknown field type `{0}`")]
    UnknownType(String),

    #[error("invalid table name `{0}`")]
    InvalidTableName(String),

    #[error("schema has no fields")]
    EmptySchema,
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: PrimitiveType,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub nullable: bool,
}

impl FieldSpec {
    /// Create a non-unique, non-nullable field
    pub fn new(name: impl Into<String>, ty: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            ty,
            unique: false,
            nullable: false,
        }
    }

    /// Mark the field `UNIQUE`
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Allow `NULL` values
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Check that `name` can be spliced into SQL as a bare identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_reserved(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED_NAMES.contains(&lower.as_str())
}

/// Ordered, validated set of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build from `(name, type)` pairs with default flags
    pub fn from_field_map<I, S>(pairs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, PrimitiveType)>,
        S: Into<String>,
    {
        Self::from_fields(
            pairs
                .into_iter()
                .map(|(name, ty)| FieldSpec::new(name, ty)),
        )
    }

    /// Build from explicit field specs
    pub fn from_fields<I>(specs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();

        for spec in specs {
            if is_reserved(&spec.name) {
                return Err(SchemaError::ReservedName(spec.name));
            }
            if spec.name.is_empty() {
                return Err(SchemaError::InvalidFieldSpec {
                    name: spec.name,
                    reason: "name is empty".to_string(),
                });
            }
            if !is_identifier(&spec.name) {
                return Err(SchemaError::InvalidFieldSpec {
                    name: spec.name,
                    reason: "name must be letters, digits and underscores".to_string(),
                });
            }
            // SQLite column names are case-insensitive
            if !seen.insert(spec.name.to_lowercase()) {
                return Err(SchemaError::DuplicateField(spec.name));
            }
            fields.push(spec);
        }

        if fields.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Flattened `name -> type` view
    pub fn field_map(&self) -> Vec<(&str, PrimitiveType)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.ty)).collect()
    }

    /// Like [`Schema::field_map`] with the trailing `id` column
    pub fn field_map_with_id(&self) -> Vec<(&str, PrimitiveType)> {
        let mut map = self.field_map();
        map.push((ID_FIELD, PrimitiveType::Integer));
        map
    }

    /// Declared type of a field, `id` included
    pub fn field_type_with_id(&self, name: &str) -> Option<PrimitiveType> {
        if name == ID_FIELD {
            return Some(PrimitiveType::Integer);
        }
        self.field(name).map(|f| f.ty)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Anything a table factory accepts as a schema
pub trait IntoSchema {
    fn into_schema(self) -> Result<Schema, SchemaError>;
}

impl IntoSchema for Schema {
    fn into_schema(self) -> Result<Schema, SchemaError> {
        Ok(self)
    }
}

impl IntoSchema for Vec<FieldSpec> {
    fn into_schema(self) -> Result<Schema, SchemaError> {
        Schema::from_fields(self)
    }
}

impl<const N: usize> IntoSchema for [FieldSpec; N] {
    fn into_schema(self) -> Result<Schema, SchemaError> {
        Schema::from_fields(self)
    }
}

impl<S: Into<String>> IntoSchema for Vec<(S, PrimitiveType)> {
    fn into_schema(self) -> Result<Schema, SchemaError> {
        Schema::from_field_map(self)
    }
}

impl<S: Into<String>, const N: usize> IntoSchema for [(S, PrimitiveType); N] {
    fn into_schema(self) -> Result<Schema, SchemaError> {
        Schema::from_field_map(self)
    }
}

//! Field types and their SQLite column types
//!
//! Every schema field declares one of four primitive types. The mapping to
//! SQLite storage classes is fixed:
//!
//! | Primitive | Column type |
//! |-----------|-------------|
//! | Text      | `TEXT`      |
//! | Integer   | `INTEGER`   |
//! | Real      | `REAL`      |
//! | Binary    | `BLOB`      |
//!
//! `NULL` is only used as a marker for "no type" and never becomes a column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::SchemaError;

/// Storage token for the absent type
pub const NULL_TYPE: &str = "NULL";

/// Primitive type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Text,
    Integer,
    Real,
    Binary,
}

impl PrimitiveType {
    /// All primitive types, in declaration order
    pub const ALL: [PrimitiveType; 4] = [
        PrimitiveType::Text,
        PrimitiveType::Integer,
        PrimitiveType::Real,
        PrimitiveType::Binary,
    ];

    /// SQLite column type for this primitive
    pub fn storage_name(self) -> &'static str {
        match self {
            PrimitiveType::Text => "TEXT",
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
            PrimitiveType::Binary => "BLOB",
        }
    }

    /// Reverse lookup from a SQLite column type name
    ///
    /// Returns `None` for unknown names, including `NULL`.
    pub fn from_storage_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.storage_name().eq_ignore_ascii_case(name))
    }

    /// Whether substring matching is meaningful for this type
    pub fn supports_fuzzy(self) -> bool {
        matches!(self, PrimitiveType::Text)
    }
}

/// Map an optional primitive type to its SQLite type token
///
/// `None` maps to [`NULL_TYPE`].
pub fn storage_type(ty: Option<PrimitiveType>) -> &'static str {
    ty.map(PrimitiveType::storage_name).unwrap_or(NULL_TYPE)
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Text => "text",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Real => "real",
            PrimitiveType::Binary => "binary",
        };
        f.pad(name)
    }
}

impl FromStr for PrimitiveType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => Ok(PrimitiveType::Text),
            "integer" | "int" => Ok(PrimitiveType::Integer),
            "real" | "float" => Ok(PrimitiveType::Real),
            "blob" | "binary" | "bytes" => Ok(PrimitiveType::Binary),
            _ => Err(SchemaError::UnknownType(s.to_string())),
        }
    }
}

impl Serialize for PrimitiveType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrimitiveType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

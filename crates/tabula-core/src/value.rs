//! Field values
//!
//! `Value` mirrors SQLite's storage classes and converts to and from
//! `rusqlite` parameters and result columns.

use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, Serializer};

use crate::types::PrimitiveType;

/// A single field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// The primitive type of this value, `None` for `Null`
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(PrimitiveType::Integer),
            Value::Real(_) => Some(PrimitiveType::Real),
            Value::Text(_) => Some(PrimitiveType::Text),
            Value::Blob(_) => Some(PrimitiveType::Binary),
        }
    }

    /// Whether this value may be stored in a field of type `ty`
    ///
    /// `Null` fits every type; integers also fit real fields.
    pub fn fits(&self, ty: PrimitiveType) -> bool {
        match (self, ty) {
            (Value::Null, _) => true,
            (Value::Integer(_), PrimitiveType::Integer | PrimitiveType::Real) => true,
            (Value::Real(_), PrimitiveType::Real) => true,
            (Value::Text(_), PrimitiveType::Text) => true,
            (Value::Blob(_), PrimitiveType::Binary) => true,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => {
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(r) => ValueRef::Real(*r),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        })
    }
}

/// JSON form: scalars map directly, blobs become arrays of bytes
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => b.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        assert!(Value::Null.fits(PrimitiveType::Integer));
        assert!(Value::Integer(3).fits(PrimitiveType::Real));
        assert!(!Value::Real(3.5).fits(PrimitiveType::Integer));
        assert!(!Value::Text("x".into()).fits(PrimitiveType::Binary));
        assert!(Value::Blob(vec![1]).fits(PrimitiveType::Binary));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from("abc"), Value::Text("abc".to_string()));
        assert_eq!(Value::from(7i32), Value::Integer(7));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(2.5)), Value::Real(2.5));
        assert_eq!(Value::from(true), Value::Integer(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Blob(vec![0xde, 0xad]).to_string(), "dead");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Integer(-4).to_string(), "-4");
    }

    #[test]
    fn test_sqlite_round_trip() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let values = [
            Value::Null,
            Value::Integer(42),
            Value::Real(1.5),
            Value::Text("hello".into()),
            Value::Blob(vec![0, 1, 2]),
        ];
        for value in values {
            let back: Value = conn
                .query_row("SELECT ?", [&value], |row| row.get(0))
                .unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_json() {
        let json = serde_json::to_value(Value::Text("t".into())).unwrap();
        assert_eq!(json, serde_json::json!("t"));
        let json = serde_json::to_value(Value::Null).unwrap();
        assert!(json.is_null());
    }
}

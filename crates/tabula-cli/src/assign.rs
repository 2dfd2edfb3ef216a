//! `field=value` arguments
//!
//! Values are parsed by the declared type of their field, so `price=10`
//! becomes a number and `title=10` stays text. The literal `null` is Null
//! for every type; binary fields take hex.

use anyhow::{bail, Context, Result};

use tabula_core::{PrimitiveType, Record, Schema, Value};

/// Parse `field=value` arguments into a record
///
/// Unknown fields are reported here so the error can name the table's
/// fields; `id` is accepted when `allow_id` is set (search filters).
pub fn parse_assignments(args: &[String], schema: &Schema, allow_id: bool) -> Result<Record> {
    let mut record = Record::new();
    for arg in args {
        let (name, raw) = arg
            .split_once('=')
            .with_context(|| format!("Expected field=value, got '{}'", arg))?;
        let name = name.trim();

        let ty = match schema.field_type_with_id(name) {
            Some(_) if name == tabula_core::ID_FIELD && !allow_id => {
                bail!("'id' is assigned by the database")
            }
            Some(ty) => ty,
            None => bail!(
                "Unknown field '{}' (fields: {})",
                name,
                schema.names().collect::<Vec<_>>().join(", ")
            ),
        };

        let value = parse_value(raw, ty).with_context(|| format!("Invalid value for '{}'", name))?;
        if record.insert(name, value).is_some() {
            bail!("Field '{}' given more than once", name);
        }
    }
    Ok(record)
}

/// Parse one raw argument as a value of type `ty`
pub fn parse_value(raw: &str, ty: PrimitiveType) -> Result<Value> {
    if raw == "null" {
        return Ok(Value::Null);
    }

    let value = match ty {
        PrimitiveType::Text => Value::Text(raw.to_string()),
        PrimitiveType::Integer => Value::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("'{}' is not an integer", raw))?,
        ),
        PrimitiveType::Real => Value::Real(
            raw.trim()
                .parse()
                .with_context(|| format!("'{}' is not a number", raw))?,
        ),
        PrimitiveType::Binary => Value::Blob(decode_hex(raw)?),
    };
    Ok(value)
}

fn decode_hex(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.len() % 2 != 0 {
        bail!("hex value has an odd number of digits");
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .with_context(|| format!("'{}' is not hex", raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::FieldSpec;

    fn books() -> Schema {
        Schema::from_fields(vec![
            FieldSpec::new("title", PrimitiveType::Text),
            FieldSpec::new("pages", PrimitiveType::Integer),
            FieldSpec::new("price", PrimitiveType::Real),
            FieldSpec::new("cover", PrimitiveType::Binary).nullable(),
        ])
        .unwrap()
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_values_follow_declared_type() {
        let record = parse_assignments(
            &args(&["title=10", "pages=10", "price=10", "cover=0xCAFE"]),
            &books(),
            false,
        )
        .unwrap();

        assert_eq!(record.get("title"), Some(&Value::from("10")));
        assert_eq!(record.get("pages"), Some(&Value::Integer(10)));
        assert_eq!(record.get("price"), Some(&Value::Real(10.0)));
        assert_eq!(record.get("cover"), Some(&Value::Blob(vec![0xca, 0xfe])));
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["title", "pages", "price", "cover"]
        );
    }

    #[test]
    fn test_null_and_text_edge_cases() {
        let record = parse_assignments(
            &args(&["title=a=b", "cover=null", "pages=null"]),
            &books(),
            false,
        )
        .unwrap();
        assert_eq!(record.get("title"), Some(&Value::from("a=b")));
        assert_eq!(record.get("cover"), Some(&Value::Null));
        assert_eq!(record.get("pages"), Some(&Value::Null));

        let record = parse_assignments(&args(&["title="]), &books(), false).unwrap();
        assert_eq!(record.get("title"), Some(&Value::from("")));
    }

    #[test]
    fn test_id_only_for_filters() {
        assert!(parse_assignments(&args(&["id=3"]), &books(), false).is_err());

        let record = parse_assignments(&args(&["id=3"]), &books(), true).unwrap();
        assert_eq!(record.id(), Some(3));
    }

    #[test]
    fn test_rejects_bad_input() {
        let schema = books();
        for bad in [
            "title",
            "publisher=x",
            "pages=many",
            "price=cheap",
            "cover=abc",
            "cover=zz",
        ] {
            assert!(
                parse_assignments(&args(&[bad]), &schema, false).is_err(),
                "{bad} should fail"
            );
        }

        let err = parse_assignments(&args(&["title=a", "title=b"]), &schema, false).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unknown_field_lists_fields() {
        let err = parse_assignments(&args(&["publisher=x"]), &books(), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown field 'publisher' (fields: title, pages, price, cover)"
        );
    }
}

//! YANG leaf type definitions and value-space conversions
//!
//! Leaf values live in three shapes: the host-side [`LeafValue`], the
//! canonical string stored on tree nodes, and the wire form (XML text or a
//! typed JSON value per RFC 7951). Every conversion validates against the
//! schema's declared value space.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::Value;

use crate::entity::LeafValue;
use crate::error::{Result, YangBindError};

/// YANG leaf types carried by schema bundle files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YangType {
    String,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Binary,
    Empty,
    Identityref,
    /// Enumeration with its allowed names
    Enumeration(Vec<String>),
    /// Union of multiple types, tried in order
    Union(Vec<YangType>),
    /// Unrecognized type name, passed through as text
    Unknown(String),
}

impl YangType {
    /// Parse a type from a schema bundle `type` field
    pub fn from_schema_type(type_value: &Value) -> Self {
        match type_value {
            Value::String(s) => Self::from_name(s),
            Value::Array(arr) => {
                let members = arr.iter().map(Self::from_schema_type).collect();
                YangType::Union(members)
            }
            Value::Object(map) => {
                // Enumeration: {"enumeration": ["name", ...]}
                if let Some(Value::Array(names)) = map.get("enumeration") {
                    let names = names
                        .iter()
                        .filter_map(|n| n.as_str().map(str::to_string))
                        .collect();
                    return YangType::Enumeration(names);
                }
                YangType::Unknown("invalid".to_string())
            }
            _ => YangType::Unknown("invalid".to_string()),
        }
    }

    fn from_name(s: &str) -> Self {
        match s {
            "string" => YangType::String,
            "boolean" => YangType::Boolean,
            "int8" => YangType::Int8,
            "int16" => YangType::Int16,
            "int32" => YangType::Int32,
            "int64" => YangType::Int64,
            "uint8" => YangType::Uint8,
            "uint16" => YangType::Uint16,
            "uint32" => YangType::Uint32,
            "uint64" => YangType::Uint64,
            "decimal64" => YangType::Decimal64,
            "binary" => YangType::Binary,
            "empty" => YangType::Empty,
            "identityref" => YangType::Identityref,
            other => YangType::Unknown(other.to_string()),
        }
    }

    fn int_bounds(&self) -> Option<(i64, i64)> {
        match self {
            YangType::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            YangType::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            YangType::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            YangType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    fn uint_max(&self) -> Option<u64> {
        match self {
            YangType::Uint8 => Some(u8::MAX.into()),
            YangType::Uint16 => Some(u16::MAX.into()),
            YangType::Uint32 => Some(u32::MAX.into()),
            YangType::Uint64 => Some(u64::MAX),
            _ => None,
        }
    }

    /// Convert a host scalar to its canonical string form
    pub fn canonical(&self, value: &LeafValue) -> Result<String> {
        match self {
            YangType::String | YangType::Identityref => match value {
                LeafValue::String(s) => Ok(s.clone()),
                other => Err(conversion("string", other)),
            },

            YangType::Boolean => match value {
                LeafValue::Bool(b) => Ok(b.to_string()),
                LeafValue::String(s) if s == "true" || s == "false" => Ok(s.clone()),
                other => Err(conversion("boolean", other)),
            },

            YangType::Int8 | YangType::Int16 | YangType::Int32 | YangType::Int64 => {
                let n = value_to_i64(value)?;
                self.check_int_range(n)?;
                Ok(n.to_string())
            }

            YangType::Uint8 | YangType::Uint16 | YangType::Uint32 | YangType::Uint64 => {
                let n = value_to_u64(value)?;
                self.check_uint_range(n)?;
                Ok(n.to_string())
            }

            YangType::Decimal64 => {
                let f = value_to_f64(value)?;
                canonical_decimal(f)
            }

            YangType::Binary => match value {
                LeafValue::Binary(bytes) => Ok(BASE64.encode(bytes)),
                // Accept pre-encoded text, normalizing it through a decode
                LeafValue::String(s) => {
                    let bytes = BASE64.decode(s.trim()).map_err(|e| {
                        YangBindError::TypeConversion(format!("base64 decode: {}", e))
                    })?;
                    Ok(BASE64.encode(bytes))
                }
                other => Err(conversion("binary", other)),
            },

            YangType::Empty => match value {
                LeafValue::Empty => Ok(String::new()),
                LeafValue::String(s) if s.is_empty() => Ok(String::new()),
                other => Err(conversion("empty", other)),
            },

            YangType::Enumeration(names) => match value {
                LeafValue::String(s) if names.iter().any(|n| n == s) => Ok(s.clone()),
                other => Err(YangBindError::TypeConversion(format!(
                    "enumeration value not found: {:?}",
                    other
                ))),
            },

            YangType::Union(members) => {
                for member in members {
                    if let Ok(c) = member.canonical(value) {
                        return Ok(c);
                    }
                }
                Err(YangBindError::TypeConversion(format!(
                    "no union member accepts {:?}",
                    value
                )))
            }

            YangType::Unknown(_) => match value {
                LeafValue::String(s) => Ok(s.clone()),
                LeafValue::Int(n) => Ok(n.to_string()),
                LeafValue::Uint(n) => Ok(n.to_string()),
                LeafValue::Bool(b) => Ok(b.to_string()),
                other => Err(conversion("text", other)),
            },
        }
    }

    /// Convert a canonical string back to a host scalar
    pub fn parse_canonical(&self, canonical: &str) -> Result<LeafValue> {
        match self {
            YangType::String | YangType::Identityref | YangType::Unknown(_) => {
                Ok(LeafValue::String(canonical.to_string()))
            }

            YangType::Boolean => match canonical {
                "true" => Ok(LeafValue::Bool(true)),
                "false" => Ok(LeafValue::Bool(false)),
                other => Err(YangBindError::TypeConversion(format!(
                    "cannot parse '{}' as boolean",
                    other
                ))),
            },

            YangType::Int8 | YangType::Int16 | YangType::Int32 | YangType::Int64 => {
                let n: i64 = canonical.parse().map_err(|_| {
                    YangBindError::TypeConversion(format!(
                        "cannot parse '{}' as integer",
                        canonical
                    ))
                })?;
                self.check_int_range(n)?;
                Ok(LeafValue::Int(n))
            }

            YangType::Uint8 | YangType::Uint16 | YangType::Uint32 | YangType::Uint64 => {
                let n: u64 = canonical.parse().map_err(|_| {
                    YangBindError::TypeConversion(format!(
                        "cannot parse '{}' as unsigned integer",
                        canonical
                    ))
                })?;
                self.check_uint_range(n)?;
                Ok(LeafValue::Uint(n))
            }

            YangType::Decimal64 => {
                let f: f64 = canonical.parse().map_err(|_| {
                    YangBindError::TypeConversion(format!(
                        "cannot parse '{}' as decimal64",
                        canonical
                    ))
                })?;
                canonical_decimal(f)?;
                Ok(LeafValue::Decimal(f))
            }

            YangType::Binary => {
                let bytes = BASE64
                    .decode(canonical.trim())
                    .map_err(|e| YangBindError::TypeConversion(format!("base64 decode: {}", e)))?;
                Ok(LeafValue::Binary(bytes))
            }

            YangType::Empty => {
                if canonical.is_empty() {
                    Ok(LeafValue::Empty)
                } else {
                    Err(YangBindError::TypeConversion(format!(
                        "empty leaf carries value '{}'",
                        canonical
                    )))
                }
            }

            YangType::Enumeration(names) => {
                if names.iter().any(|n| n == canonical) {
                    Ok(LeafValue::String(canonical.to_string()))
                } else {
                    Err(YangBindError::TypeConversion(format!(
                        "enumeration value not found: {:?}",
                        canonical
                    )))
                }
            }

            YangType::Union(members) => {
                for member in members {
                    if let Ok(v) = member.parse_canonical(canonical) {
                        return Ok(v);
                    }
                }
                Err(YangBindError::TypeConversion(format!(
                    "no union member accepts '{}'",
                    canonical
                )))
            }
        }
    }

    /// Render a canonical string as its RFC 7951 JSON value.
    ///
    /// 8/16/32-bit integers become JSON numbers; 64-bit integers and
    /// decimal64 are quoted; `empty` becomes `[null]`.
    pub fn json_value(&self, canonical: &str) -> Result<Value> {
        match self {
            YangType::String
            | YangType::Identityref
            | YangType::Binary
            | YangType::Enumeration(_)
            | YangType::Unknown(_) => Ok(Value::String(canonical.to_string())),

            YangType::Boolean => match canonical {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(YangBindError::TypeConversion(format!(
                    "cannot parse '{}' as boolean",
                    other
                ))),
            },

            YangType::Int8 | YangType::Int16 | YangType::Int32 => {
                let n: i64 = canonical.parse().map_err(|_| {
                    YangBindError::TypeConversion(format!(
                        "cannot parse '{}' as integer",
                        canonical
                    ))
                })?;
                Ok(Value::Number(n.into()))
            }

            YangType::Uint8 | YangType::Uint16 | YangType::Uint32 => {
                let n: u64 = canonical.parse().map_err(|_| {
                    YangBindError::TypeConversion(format!(
                        "cannot parse '{}' as unsigned integer",
                        canonical
                    ))
                })?;
                Ok(Value::Number(n.into()))
            }

            YangType::Int64 | YangType::Uint64 | YangType::Decimal64 => {
                Ok(Value::String(canonical.to_string()))
            }

            YangType::Empty => Ok(Value::Array(vec![Value::Null])),

            YangType::Union(members) => {
                for member in members {
                    if member.parse_canonical(canonical).is_ok() {
                        return member.json_value(canonical);
                    }
                }
                Ok(Value::String(canonical.to_string()))
            }
        }
    }

    /// Validate a JSON wire value and return its canonical string
    pub fn canonical_from_json(&self, value: &Value) -> Result<String> {
        match self {
            YangType::String | YangType::Identityref => match value.as_str() {
                Some(s) => Ok(s.to_string()),
                None => Err(json_conversion("string", value)),
            },

            YangType::Boolean => match value {
                Value::Bool(b) => Ok(b.to_string()),
                Value::String(s) if s == "true" || s == "false" => Ok(s.clone()),
                other => Err(json_conversion("boolean", other)),
            },

            YangType::Int8 | YangType::Int16 | YangType::Int32 | YangType::Int64 => {
                let n = json_to_i64(value)?;
                self.check_int_range(n)?;
                Ok(n.to_string())
            }

            YangType::Uint8 | YangType::Uint16 | YangType::Uint32 | YangType::Uint64 => {
                let n = json_to_u64(value)?;
                self.check_uint_range(n)?;
                Ok(n.to_string())
            }

            YangType::Decimal64 => {
                let f = json_to_f64(value)?;
                canonical_decimal(f)
            }

            YangType::Binary => match value.as_str() {
                Some(s) => {
                    let bytes = BASE64.decode(s.trim()).map_err(|e| {
                        YangBindError::TypeConversion(format!("base64 decode: {}", e))
                    })?;
                    Ok(BASE64.encode(bytes))
                }
                None => Err(json_conversion("binary", value)),
            },

            YangType::Empty => match value {
                Value::Array(items) if items.len() == 1 && items[0].is_null() => {
                    Ok(String::new())
                }
                other => Err(json_conversion("[null]", other)),
            },

            YangType::Enumeration(names) => match value.as_str() {
                Some(s) if names.iter().any(|n| n == s) => Ok(s.to_string()),
                _ => Err(YangBindError::TypeConversion(format!(
                    "enumeration value not found: {}",
                    value
                ))),
            },

            YangType::Union(members) => {
                for member in members {
                    if let Ok(c) = member.canonical_from_json(value) {
                        return Ok(c);
                    }
                }
                Err(YangBindError::TypeConversion(format!(
                    "no union member accepts {}",
                    value
                )))
            }

            YangType::Unknown(_) => match value {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                other => Err(json_conversion("text", other)),
            },
        }
    }

    /// Validate XML element text and return its canonical string.
    ///
    /// String-family values are taken verbatim, whitespace included. Other
    /// types ignore surrounding whitespace an external pretty-printer may
    /// have added around the token.
    pub fn canonical_from_xml(&self, text: &str) -> Result<String> {
        match self {
            YangType::String | YangType::Identityref | YangType::Unknown(_) => {
                let value = self.parse_canonical(text)?;
                self.canonical(&value)
            }

            YangType::Union(members) => {
                for member in members {
                    if let Ok(c) = member.canonical_from_xml(text) {
                        return Ok(c);
                    }
                }
                Err(YangBindError::TypeConversion(format!(
                    "no union member accepts '{}'",
                    text
                )))
            }

            _ => {
                let value = self.parse_canonical(text.trim())?;
                self.canonical(&value)
            }
        }
    }

    fn check_int_range(&self, n: i64) -> Result<()> {
        if let Some((min, max)) = self.int_bounds()
            && (n < min || n > max)
        {
            return Err(YangBindError::TypeConversion(format!(
                "{} out of range for {:?}",
                n, self
            )));
        }
        Ok(())
    }

    fn check_uint_range(&self, n: u64) -> Result<()> {
        if let Some(max) = self.uint_max()
            && n > max
        {
            return Err(YangBindError::TypeConversion(format!(
                "{} out of range for {:?}",
                n, self
            )));
        }
        Ok(())
    }
}

/// Canonical decimal64 rendering; rejects non-finite values
fn canonical_decimal(f: f64) -> Result<String> {
    if !f.is_finite() {
        return Err(YangBindError::TypeConversion(format!(
            "decimal64 must be finite, got {}",
            f
        )));
    }
    let mut s = f.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    Ok(s)
}

fn conversion(expected: &str, got: &LeafValue) -> YangBindError {
    YangBindError::TypeConversion(format!("expected {} value, got {:?}", expected, got))
}

fn json_conversion(expected: &str, got: &Value) -> YangBindError {
    YangBindError::TypeConversion(format!("expected {} value, got {}", expected, got))
}

fn value_to_i64(value: &LeafValue) -> Result<i64> {
    match value {
        LeafValue::Int(n) => Ok(*n),
        LeafValue::Uint(n) => i64::try_from(*n).map_err(|_| {
            YangBindError::TypeConversion(format!("cannot convert {} to i64", n))
        }),
        LeafValue::String(s) => s
            .parse()
            .map_err(|_| YangBindError::TypeConversion(format!("cannot parse '{}' as i64", s))),
        other => Err(conversion("integer", other)),
    }
}

fn value_to_u64(value: &LeafValue) -> Result<u64> {
    match value {
        LeafValue::Uint(n) => Ok(*n),
        LeafValue::Int(n) => u64::try_from(*n).map_err(|_| {
            YangBindError::TypeConversion(format!("cannot convert {} to u64", n))
        }),
        LeafValue::String(s) => s
            .parse()
            .map_err(|_| YangBindError::TypeConversion(format!("cannot parse '{}' as u64", s))),
        other => Err(conversion("unsigned integer", other)),
    }
}

fn value_to_f64(value: &LeafValue) -> Result<f64> {
    match value {
        LeafValue::Decimal(f) => Ok(*f),
        LeafValue::Int(n) => Ok(*n as f64),
        LeafValue::Uint(n) => Ok(*n as f64),
        LeafValue::String(s) => s
            .parse()
            .map_err(|_| YangBindError::TypeConversion(format!("cannot parse '{}' as f64", s))),
        other => Err(conversion("decimal", other)),
    }
}

fn json_to_i64(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| YangBindError::TypeConversion(format!("cannot convert {} to i64", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| YangBindError::TypeConversion(format!("cannot parse '{}' as i64", s))),
        _ => Err(json_conversion("integer", value)),
    }
}

fn json_to_u64(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| YangBindError::TypeConversion(format!("cannot convert {} to u64", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| YangBindError::TypeConversion(format!("cannot parse '{}' as u64", s))),
        _ => Err(json_conversion("unsigned integer", value)),
    }
}

fn json_to_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| YangBindError::TypeConversion(format!("cannot convert {} to f64", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| YangBindError::TypeConversion(format!("cannot parse '{}' as f64", s))),
        _ => Err(json_conversion("decimal", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yang_type_from_name() {
        assert_eq!(YangType::from_name("string"), YangType::String);
        assert_eq!(YangType::from_name("uint8"), YangType::Uint8);
        assert_eq!(YangType::from_name("boolean"), YangType::Boolean);
        assert_eq!(
            YangType::from_name("inet:ip-address"),
            YangType::Unknown("inet:ip-address".to_string())
        );
    }

    #[test]
    fn test_from_schema_type_union_and_enum() {
        let union = YangType::from_schema_type(&json!(["uint8", "string"]));
        assert_eq!(union, YangType::Union(vec![YangType::Uint8, YangType::String]));

        let en = YangType::from_schema_type(&json!({"enumeration": ["up", "down"]}));
        assert_eq!(
            en,
            YangType::Enumeration(vec!["up".to_string(), "down".to_string()])
        );
    }

    #[test]
    fn test_canonical_string_and_bool() {
        let c = YangType::String
            .canonical(&LeafValue::String("eth0".into()))
            .unwrap();
        assert_eq!(c, "eth0");

        let c = YangType::Boolean.canonical(&LeafValue::Bool(true)).unwrap();
        assert_eq!(c, "true");
    }

    #[test]
    fn test_canonical_int_range() {
        assert!(YangType::Int8.canonical(&LeafValue::Int(127)).is_ok());
        assert!(YangType::Int8.canonical(&LeafValue::Int(128)).is_err());
        assert!(YangType::Uint16.canonical(&LeafValue::Uint(65535)).is_ok());
        assert!(YangType::Uint16.canonical(&LeafValue::Uint(65536)).is_err());
    }

    #[test]
    fn test_binary_base64_roundtrip() {
        let c = YangType::Binary
            .canonical(&LeafValue::Binary(vec![1, 2, 3]))
            .unwrap();
        assert_eq!(c, "AQID");
        assert_eq!(
            YangType::Binary.parse_canonical(&c).unwrap(),
            LeafValue::Binary(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_enumeration_membership() {
        let ty = YangType::Enumeration(vec!["up".into(), "down".into()]);
        assert!(ty.canonical(&LeafValue::String("up".into())).is_ok());
        assert!(ty.canonical(&LeafValue::String("sideways".into())).is_err());
    }

    #[test]
    fn test_json_value_typing() {
        assert_eq!(YangType::Uint8.json_value("42").unwrap(), json!(42));
        assert_eq!(YangType::Uint64.json_value("42").unwrap(), json!("42"));
        assert_eq!(YangType::Boolean.json_value("true").unwrap(), json!(true));
        assert_eq!(YangType::Empty.json_value("").unwrap(), json!([null]));
    }

    #[test]
    fn test_canonical_from_json_accepts_both_number_forms() {
        assert_eq!(
            YangType::Uint32.canonical_from_json(&json!(8080)).unwrap(),
            "8080"
        );
        assert_eq!(
            YangType::Uint64.canonical_from_json(&json!("8080")).unwrap(),
            "8080"
        );
        assert!(YangType::Uint8.canonical_from_json(&json!(256)).is_err());
    }

    #[test]
    fn test_union_tries_members_in_order() {
        let ty = YangType::Union(vec![YangType::Uint8, YangType::String]);
        assert_eq!(ty.canonical(&LeafValue::Uint(7)).unwrap(), "7");
        assert_eq!(
            ty.canonical(&LeafValue::String("lots".into())).unwrap(),
            "lots"
        );
    }

    #[test]
    fn test_canonical_from_xml_whitespace_policy() {
        assert_eq!(
            YangType::String.canonical_from_xml("  padded  ").unwrap(),
            "  padded  "
        );
        assert_eq!(YangType::Uint16.canonical_from_xml(" 1500 ").unwrap(), "1500");
        assert_eq!(YangType::Boolean.canonical_from_xml("\n true \n").unwrap(), "true");

        let ty = YangType::Union(vec![YangType::Uint8, YangType::String]);
        assert_eq!(ty.canonical_from_xml(" 7 ").unwrap(), "7");
        assert_eq!(ty.canonical_from_xml(" up ").unwrap(), " up ");
    }
}

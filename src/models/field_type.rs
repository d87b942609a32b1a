//! Field and argument type descriptors

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Type of an instruction argument or a struct field.
///
/// Resolved once from the raw IDL shape so views never re-interpret JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A plain type name such as `u64` or `pubkey`.
    Scalar(String),
    /// `{"vec": T}`
    Vec(Box<FieldType>),
    /// `{"option": T}`
    Option(Box<FieldType>),
    /// `{"defined": "Name"}` or `{"defined": {"name": "Name"}}`.
    /// Definitions carrying generics stay [`FieldType::Opaque`].
    Defined(String),
    /// `{"array": [T, N]}`
    Array(Box<FieldType>, usize),
    /// Any other shape, kept as compact JSON text.
    Opaque(String),
}

impl FieldType {
    /// Resolve a raw IDL type value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(name) => FieldType::Scalar(name.clone()),
            Value::Object(map) if map.len() == 1 => {
                if let Some(inner) = map.get("vec") {
                    FieldType::Vec(Box::new(Self::from_value(inner)))
                } else if let Some(inner) = map.get("option") {
                    FieldType::Option(Box::new(Self::from_value(inner)))
                } else if let Some(defined) = map.get("defined") {
                    match defined_name(defined) {
                        Some(name) => FieldType::Defined(name),
                        None => FieldType::Opaque(value.to_string()),
                    }
                } else if let Some(array) = map.get("array") {
                    match array.as_array().map(Vec::as_slice) {
                        Some([inner, Value::Number(len)]) => {
                            match len.as_u64().and_then(|n| usize::try_from(n).ok()) {
                                Some(len) => {
                                    FieldType::Array(Box::new(Self::from_value(inner)), len)
                                }
                                None => FieldType::Opaque(value.to_string()),
                            }
                        }
                        _ => FieldType::Opaque(value.to_string()),
                    }
                } else {
                    FieldType::Opaque(value.to_string())
                }
            }
            other => FieldType::Opaque(other.to_string()),
        }
    }

    /// Name of the user-defined type this type refers to, looking through wrappers.
    pub fn defined_name(&self) -> Option<&str> {
        match self {
            FieldType::Defined(name) => Some(name),
            FieldType::Vec(inner) | FieldType::Option(inner) | FieldType::Array(inner, _) => {
                inner.defined_name()
            }
            FieldType::Scalar(_) | FieldType::Opaque(_) => None,
        }
    }
}

fn defined_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) if map.len() == 1 => {
            map.get("name").and_then(Value::as_str).map(str::to_string)
        }
        _ => None,
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(name) | FieldType::Defined(name) => write!(f, "{}", name),
            FieldType::Vec(inner) => write!(f, "Vec<{}>", inner),
            FieldType::Option(inner) => write!(f, "Option<{}>", inner),
            FieldType::Array(inner, len) => write!(f, "[{}; {}]", inner, len),
            FieldType::Opaque(text) => write!(f, "{}", text),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldType::Scalar(name) => serializer.serialize_str(name),
            FieldType::Vec(inner) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("vec", inner)?;
                map.end()
            }
            FieldType::Option(inner) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("option", inner)?;
                map.end()
            }
            FieldType::Defined(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("defined", name)?;
                map.end()
            }
            FieldType::Array(inner, len) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("array", &(inner, len))?;
                map.end()
            }
            FieldType::Opaque(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => value.serialize(serializer),
                Err(_) => serializer.serialize_str(text),
            },
        }
    }
}

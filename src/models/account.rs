//! Account and type layout metadata for Solana programs

use serde::Serialize;

use crate::models::field_type::FieldType;

/// Represents a program account declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDescriptor {
    /// Account name
    pub name: String,
    /// Discriminator bytes
    pub discriminator: Vec<u8>,
}

/// Represents a user-defined type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    /// Type name
    pub name: String,
    /// Struct fields; empty for enums and tuple structs
    pub fields: Vec<Field>,
}

/// Represents a struct field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl AccountDescriptor {
    /// Create a new account
    pub fn new(name: impl Into<String>, discriminator: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            discriminator,
        }
    }
}

impl TypeDescriptor {
    /// Create a new type without fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the type
    pub fn add_field(&mut self, name: impl Into<String>, ty: FieldType) {
        self.fields.push(Field {
            name: name.into(),
            ty,
        });
    }
}

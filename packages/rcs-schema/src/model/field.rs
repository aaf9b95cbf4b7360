//! Fields and field sets.

use serde::Serialize;

use crate::error::ModelError;
use crate::model::schema::Schema;
use crate::model::types::TypeInfo;

/// Names that cannot be used for fields or enumerators.
pub const RESERVED_NAMES: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Rust primitive types; a type of the same name would shadow them in
/// generated code.
pub const RUST_PRIMITIVE_NAMES: &[&str] = &[
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64",
    "i128", "isize", "f32", "f64",
];

/// Largest field-slot area a resource header can describe.
pub const MAX_FIELDS_SIZE: u64 = u32::MAX as u64 - 4;

/// Returns `true` if `name` is a valid schema identifier: not starting with
/// a digit, made only of ASCII letters, digits and underscores.
pub fn is_identifier(name: &str) -> bool {
    match name.chars().next() {
        Some(first) if !first.is_ascii_digit() => name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Returns `true` if `name` is reserved.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Returns `true` if `name` cannot name a type: reserved or a Rust
/// primitive.
pub fn is_reserved_type_name(name: &str) -> bool {
    is_reserved(name) || RUST_PRIMITIVE_NAMES.contains(&name)
}

/// Which kind of declaration owns a field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSetKind {
    Resource,
    Data,
}

/// A named, typed slot at a fixed byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeInfo,
    /// Byte offset within the field slots
    pub offset: u32,
}

/// Ordered fields of one resource or data type.
///
/// Field offsets are assigned in declaration order with no padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    #[serde(skip)]
    owner: String,
    kind: FieldSetKind,
    size: u32,
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new(owner: impl Into<String>, kind: FieldSetKind) -> Self {
        Self {
            owner: owner.into(),
            kind,
            size: 0,
            fields: Vec::new(),
        }
    }

    /// Resolves `type_name` through `schema` and appends the field.
    pub fn add(
        &mut self,
        schema: &Schema,
        name: &str,
        type_name: &str,
    ) -> Result<&Field, ModelError> {
        let ty = schema.type_info(type_name)?;
        self.insert(name, ty)
    }

    /// Appends a field of an already resolved type.
    pub fn insert(&mut self, name: &str, ty: TypeInfo) -> Result<&Field, ModelError> {
        if !is_identifier(name) {
            return Err(ModelError::InvalidIdentifier {
                name: name.to_string(),
            });
        }
        if is_reserved(name) {
            return Err(ModelError::ReservedName {
                owner: self.owner.clone(),
                name: name.to_string(),
            });
        }
        if self.get(name).is_some() {
            return Err(ModelError::DuplicateField {
                owner: self.owner.clone(),
                field: name.to_string(),
            });
        }
        if self.kind == FieldSetKind::Data && ty.is_reference() {
            return Err(ModelError::ReferenceInData {
                owner: self.owner.clone(),
                field: name.to_string(),
                type_name: ty.name,
            });
        }

        let new_size = u64::from(self.size) + u64::from(ty.size);
        if new_size > MAX_FIELDS_SIZE {
            return Err(ModelError::TooLarge {
                owner: self.owner.clone(),
                size: new_size,
            });
        }

        let offset = self.size;
        self.size = new_size as u32;
        self.fields.push(Field {
            name: name.to_string(),
            ty,
            offset,
        });
        Ok(&self.fields[self.fields.len() - 1])
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn kind(&self) -> FieldSetKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Total width of all fields in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

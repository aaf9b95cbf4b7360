//! Type descriptors: flags, built-in primitives and `TypeInfo`.

use std::fmt;
use std::ops::BitOr;

use serde::{Serialize, Serializer};

/// Width of a reference slot in bytes.
pub const REFERENCE_SIZE: u32 = 4;

/// Width of an enum value in bytes.
pub const ENUM_SIZE: u32 = 4;

/// Suffix marking an array type name.
pub const ARRAY_SUFFIX: &str = "[]";

/// Name of the built-in string type.
pub const STRING_TYPE: &str = "string";

/// Classification bits of a type.
///
/// `ARRAY`, `STRING` and `RESOURCE` all include `REFERENCE`: such fields
/// occupy one offset slot whatever the size of their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFlags(u8);

impl TypeFlags {
    pub const PRIMITIVE: Self = Self(1);
    pub const REFERENCE: Self = Self(2);
    pub const ARRAY: Self = Self(4 | 2);
    pub const STRING: Self = Self(8 | 2);
    pub const RESOURCE: Self = Self(16 | 2);

    const NAMES: [(Self, &'static str); 5] = [
        (Self::PRIMITIVE, "primitive"),
        (Self::REFERENCE, "reference"),
        (Self::ARRAY, "array"),
        (Self::STRING, "string"),
        (Self::RESOURCE, "resource"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Serialize for TypeFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            Self::NAMES
                .iter()
                .filter(|(flag, _)| self.contains(*flag))
                .map(|(_, name)| *name),
        )
    }
}

/// Built-in fixed-width value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Byte,
    Bool,
    Int16,
    Int32,
    Int64,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

impl Primitive {
    pub const ALL: [Primitive; 10] = [
        Primitive::Byte,
        Primitive::Bool,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Uint16,
        Primitive::Uint32,
        Primitive::Uint64,
        Primitive::Float32,
        Primitive::Float64,
    ];

    /// Schema spelling of the type.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Byte => "byte",
            Primitive::Bool => "bool",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Uint16 => "uint16",
            Primitive::Uint32 => "uint32",
            Primitive::Uint64 => "uint64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
        }
    }

    /// Width in bytes.
    pub fn size(self) -> u32 {
        match self {
            Primitive::Byte | Primitive::Bool => 1,
            Primitive::Int16 | Primitive::Uint16 => 2,
            Primitive::Int32 | Primitive::Uint32 | Primitive::Float32 => 4,
            Primitive::Int64 | Primitive::Uint64 | Primitive::Float64 => 8,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved description of a field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeInfo {
    /// Type name as written in the schema, `Base[]` for arrays
    pub name: String,
    /// Slot width in bytes
    pub size: u32,
    /// Classification
    pub flags: TypeFlags,
    /// Element type of an array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<TypeInfo>>,
}

impl TypeInfo {
    /// An inline value type of `size` bytes.
    pub fn value(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            flags: TypeFlags::PRIMITIVE,
            element: None,
        }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::value(primitive.name(), primitive.size())
    }

    pub fn string() -> Self {
        Self {
            name: STRING_TYPE.to_string(),
            size: REFERENCE_SIZE,
            flags: TypeFlags::STRING,
            element: None,
        }
    }

    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: REFERENCE_SIZE,
            flags: TypeFlags::RESOURCE,
            element: None,
        }
    }

    /// An array of `element`.
    pub fn array_of(element: TypeInfo) -> Self {
        Self {
            name: format!("{}{}", element.name, ARRAY_SUFFIX),
            size: REFERENCE_SIZE,
            flags: TypeFlags::ARRAY,
            element: Some(Box::new(element)),
        }
    }

    pub fn is_reference(&self) -> bool {
        self.flags.contains(TypeFlags::REFERENCE)
    }

    pub fn is_array(&self) -> bool {
        self.flags.contains(TypeFlags::ARRAY)
    }

    pub fn is_string(&self) -> bool {
        self.flags.contains(TypeFlags::STRING)
    }

    pub fn is_resource(&self) -> bool {
        self.flags.contains(TypeFlags::RESOURCE)
    }

    /// Element type, for arrays.
    pub fn element(&self) -> Option<&TypeInfo> {
        self.element.as_deref()
    }
}

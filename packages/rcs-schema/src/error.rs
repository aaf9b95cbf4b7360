//! Schema error types.

use std::path::PathBuf;

use thiserror::Error;

/// Semantic errors raised while declarations are added to a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Name already used by a primitive, resource, data or enum type
    #[error("Type '{name}' is already defined")]
    DuplicateType { name: String },

    /// Two fields with the same name in one field set
    #[error("Field '{field}' already exists in '{owner}'")]
    DuplicateField { owner: String, field: String },

    /// Field or enumerator name that cannot be used in generated accessors
    #[error("'{name}' in '{owner}' is a reserved name")]
    ReservedName { owner: String, name: String },

    /// Not a valid identifier
    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier { name: String },

    /// Data types are inlined, so they cannot hold references
    #[error("Data type '{owner}' cannot hold reference field '{field}' of type '{type_name}'")]
    ReferenceInData {
        owner: String,
        field: String,
        type_name: String,
    },

    /// Type name does not resolve
    #[error("Type '{type_name}' is not defined")]
    UndefinedType { type_name: String },

    /// Array whose element type is itself an array
    #[error("Type '{type_name}' is an array of arrays")]
    NestedArray { type_name: String },

    /// Enumerator listed twice in one enum
    #[error("Enumerator '{value}' already exists in enum '{name}'")]
    DuplicateEnumerator { name: String, value: String },

    /// Enum without enumerators
    #[error("Enum '{name}' has no enumerators")]
    EmptyEnum { name: String },

    /// Type name equal to an item generated for a resource
    #[error("Type '{name}' clashes with code generated for resource '{resource}'")]
    GeneratedNameClash { name: String, resource: String },

    /// Resource forward-declared but never given a body
    #[error("Resource '{name}' is declared but never defined")]
    UndefinedResource { name: String },

    /// Field slots larger than the wire format can address
    #[error("'{owner}' is too large: {size} bytes of fields")]
    TooLarge { owner: String, size: u64 },
}

/// Errors raised while reading, compiling or writing one schema file.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Unexpected token
    #[error("[line: {line}] Unexpected token \"{found}\" expected \"{expected}\"")]
    Syntax {
        line: u32,
        found: String,
        expected: String,
    },

    /// Declaration rejected by the schema model
    #[error("[line: {line}] {source}")]
    Semantic {
        line: u32,
        #[source]
        source: ModelError,
    },

    /// Schema file could not be read
    #[error("Unable to read file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory missing or not a directory
    #[error("Output directory '{}' does not exist", path.display())]
    OutputDir { path: PathBuf },

    /// Generated file could not be written
    #[error("Cannot create file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model dump could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Source line the error points at, if it came from schema text.
    pub fn line(&self) -> Option<u32> {
        match self {
            SchemaError::Syntax { line, .. } | SchemaError::Semantic { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Attaches a source line to model errors raised while parsing.
pub(crate) trait AtLine<T> {
    fn at_line(self, line: u32) -> Result<T>;
}

impl<T> AtLine<T> for std::result::Result<T, ModelError> {
    fn at_line(self, line: u32) -> Result<T> {
        self.map_err(|source| SchemaError::Semantic { line, source })
    }
}

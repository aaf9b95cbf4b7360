//! Schema reader: source text to a closed [`Schema`].

pub mod parser;
pub mod tokenizer;

use std::fs;
use std::path::Path;

use crate::error::{Result, SchemaError};
use crate::model::Schema;

pub use parser::parse;
pub use tokenizer::{tokenize, Token};

/// Schema name for a source file: its file name without extension.
pub fn schema_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parses schema source text.
pub fn read_str(name: &str, source: &str) -> Result<Schema> {
    let tokens = tokenize(source);
    tracing::debug!("Schema '{}': {} tokens", name, tokens.len());
    parse(name, &tokens)
}

/// Reads and parses a schema file. The schema is named after the file.
pub fn read_file(path: &Path) -> Result<Schema> {
    let source = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = read_str(&schema_name(path), &source)?;

    tracing::debug!(
        "Read schema '{}' from {}: {} resources, {} data types, {} enums",
        schema.name(),
        path.display(),
        schema.resources().len(),
        schema.composites().len(),
        schema.enums().len()
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_name_is_file_stem() {
        assert_eq!(schema_name(Path::new("assets/shaders/mesh.schema")), "mesh");
        assert_eq!(schema_name(Path::new("model")), "model");
        assert_eq!(schema_name(Path::new("a.b.schema")), "a.b");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = read_file(Path::new("/nonexistent/dir/x.schema")).unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }
}

//! Code generation: turns a closed [`Schema`] into source files.

pub mod rust;
pub mod writer;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::GeneratorConfig;
use crate::error::{Result, SchemaError};
use crate::model::Schema;

pub use writer::CodeWriter;

/// Extension of the optional model dump.
pub const MODEL_EXTENSION: &str = "model.json";

/// Writes generated code for schemas according to a [`GeneratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generated source for `schema`. Same schema and config, same bytes.
    pub fn generate(&self, schema: &Schema) -> String {
        rust::emit(schema, &self.config)
    }

    /// Path the generated source for `schema` is written to.
    pub fn source_path(&self, schema: &Schema) -> PathBuf {
        self.config
            .out_dir
            .join(format!("{}.{}", schema.name(), self.config.file_extension))
    }

    /// Path of the model dump for `schema`.
    pub fn model_path(&self, schema: &Schema) -> PathBuf {
        self.config
            .out_dir
            .join(format!("{}.{}", schema.name(), MODEL_EXTENSION))
    }

    /// Generates and writes every output file for `schema`, returning the
    /// paths written.
    ///
    /// The output directory must already exist. Each file is written to a
    /// `.tmp` sibling first and renamed into place, so a failed run never
    /// leaves a truncated file behind.
    pub fn write(&self, schema: &Schema) -> Result<Vec<PathBuf>> {
        if !self.config.out_dir.is_dir() {
            return Err(SchemaError::OutputDir {
                path: self.config.out_dir.clone(),
            });
        }

        let mut written = Vec::new();

        let source_path = self.source_path(schema);
        write_atomic(&source_path, self.generate(schema).as_bytes())?;
        tracing::info!("Generated {}", source_path.display());
        written.push(source_path);

        if self.config.emit_model {
            let model_path = self.model_path(schema);
            let json = serde_json::to_string_pretty(schema)?;
            write_atomic(&model_path, json.as_bytes())?;
            tracing::info!("Wrote model {}", model_path.display());
            written.push(model_path);
        }

        Ok(written)
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let write_err = |source| SchemaError::Write {
        path: path.to_path_buf(),
        source,
    };

    let result = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if let Err(source) = result {
        // Leftover temp file is harmless if removal fails too
        let _ = fs::remove_file(&temp_path);
        return Err(write_err(source));
    }
    Ok(())
}

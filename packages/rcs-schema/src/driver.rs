//! Compiles schema files: read, validate, generate, write.

use std::path::{Path, PathBuf};

use crate::codegen::Generator;
use crate::config::GeneratorConfig;
use crate::error::{Result, SchemaError};
use crate::reader::read_file;

/// Outcome of compiling several schema files.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Files written, across all schemas that compiled
    pub written: Vec<PathBuf>,
    /// Schema files that failed, with their error
    pub failed: Vec<(PathBuf, SchemaError)>,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compiles one schema file into `config.out_dir`.
pub fn compile_file(path: &Path, config: &GeneratorConfig) -> Result<Vec<PathBuf>> {
    let schema = read_file(path)?;
    Generator::new(config.clone()).write(&schema)
}

/// Compiles each file independently. A failing file is reported and
/// skipped; the rest are still generated.
pub fn compile_files<P: AsRef<Path>>(paths: &[P], config: &GeneratorConfig) -> CompileReport {
    let generator = Generator::new(config.clone());
    let mut report = CompileReport::default();

    for path in paths {
        let path = path.as_ref();
        match read_file(path).and_then(|schema| generator.write(&schema)) {
            Ok(written) => report.written.extend(written),
            Err(e) => {
                tracing::error!("{}: {}", path.display(), e);
                report.failed.push((path.to_path_buf(), e));
            }
        }
    }

    tracing::debug!(
        "Compiled {} schema files: {} written, {} failed",
        paths.len(),
        report.written.len(),
        report.failed.len()
    );
    report
}

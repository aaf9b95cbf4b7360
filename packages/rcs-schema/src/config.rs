//! Generator configuration.

use std::path::PathBuf;

/// Code generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory generated files are written to (must exist)
    pub out_dir: PathBuf,
    /// Emit `<Resource>Builder` types
    pub emit_builder: bool,
    /// Emit `<Resource>View` and `<Resource>Loader` types
    pub emit_loader: bool,
    /// Also write `<schema>.model.json`
    pub emit_model: bool,
    /// Path generated code uses to reach the runtime crate
    pub runtime_path: String,
    /// Extension of generated source files
    pub file_extension: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            emit_builder: true,
            emit_loader: true,
            emit_model: false,
            runtime_path: "::rcs_runtime".to_string(),
            file_extension: "rs".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Default configuration writing into `out_dir`.
    pub fn with_out_dir(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }
}

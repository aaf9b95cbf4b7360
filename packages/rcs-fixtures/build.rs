use std::env;
use std::fs;
use std::path::PathBuf;

use rcs_schema::{compile_file, GeneratorConfig};

const SCHEMA_DIR: &str = "schemas";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let config = GeneratorConfig::with_out_dir(&out_dir);

    println!("cargo:rerun-if-changed={SCHEMA_DIR}");

    let mut schemas = fs::read_dir(SCHEMA_DIR)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    schemas.retain(|path| path.extension().is_some_and(|ext| ext == "schema"));
    schemas.sort();

    for path in schemas {
        println!("cargo:rerun-if-changed={}", path.display());
        compile_file(&path, &config)?;
    }
    Ok(())
}

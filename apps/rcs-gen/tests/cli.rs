//! Runs the compiled `rcs-gen` binary against schema files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use ntest::timeout;
use tempfile::tempdir;

const MESH: &str = "resource Mesh { uint32 indexOffset; uint32 indexCount; string materialName; }\n";

fn rcs_gen(args: &[&str], cwd: &Path) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_rcs-gen"))
        .args(args)
        .current_dir(cwd)
        .output()?)
}

#[timeout(10000)]
#[test]
fn test_compiles_into_out_dir() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("mesh.schema"), MESH)?;
    fs::create_dir(dir.path().join("gen"))?;

    let output = rcs_gen(&["mesh.schema", "--out", "gen", "--emit-model"], dir.path())?;
    assert_eq!(output.status.code(), Some(0));

    let source = fs::read_to_string(dir.path().join("gen/mesh.rs"))?;
    assert!(source.contains("pub struct MeshBuilder<'p>"));
    assert!(source.contains("pub struct MeshLoader"));
    assert!(dir.path().join("gen/mesh.model.json").exists());
    Ok(())
}

#[timeout(10000)]
#[test]
fn test_emit_flags() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("mesh.schema"), MESH)?;

    let output = rcs_gen(&["--no-loader", "mesh.schema"], dir.path())?;
    assert_eq!(output.status.code(), Some(0));
    let source = fs::read_to_string(dir.path().join("mesh.rs"))?;
    assert!(source.contains("MeshBuilder"));
    assert!(!source.contains("MeshLoader"));
    assert!(!dir.path().join("mesh.model.json").exists());
    Ok(())
}

#[timeout(10000)]
#[test]
fn test_failure_exit_code_keeps_good_output() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("mesh.schema"), MESH)?;
    fs::write(dir.path().join("bad.schema"), "resource Bad {\n  uint32 a\n}\n")?;

    let output = rcs_gen(&["bad.schema", "mesh.schema"], dir.path())?;
    assert_eq!(output.status.code(), Some(1));
    assert!(dir.path().join("mesh.rs").exists());
    assert!(!dir.path().join("bad.rs").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[line: 3] Unexpected token \"}\" expected \";\""));
    Ok(())
}

#[timeout(10000)]
#[test]
fn test_missing_output_dir_fails() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("mesh.schema"), MESH)?;

    let output = rcs_gen(&["mesh.schema", "--out", "missing"], dir.path())?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[timeout(10000)]
#[test]
fn test_invalid_arguments() -> Result<()> {
    let dir = tempdir()?;
    assert_eq!(rcs_gen(&[], dir.path())?.status.code(), Some(2));
    assert_eq!(
        rcs_gen(&["--bogus", "x.schema"], dir.path())?.status.code(),
        Some(2)
    );
    Ok(())
}

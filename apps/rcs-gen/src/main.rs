//! Resource schema compiler.
//!
//! Reads `.schema` files and writes one generated Rust source file per
//! schema into the output directory.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rcs_schema::{compile_files, GeneratorConfig};
use tracing::Level;

/// Exit code when any schema failed to compile.
const EXIT_FAILURE: u8 = 1;

/// Command-line arguments for the schema compiler.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Schema files to compile
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory for generated files (must exist)
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Do not generate builder types
    #[arg(long)]
    no_builder: bool,

    /// Do not generate view and loader types
    #[arg(long)]
    no_loader: bool,

    /// Also write `<schema>.model.json` with the compiled schema
    #[arg(long)]
    emit_model: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> GeneratorConfig {
        GeneratorConfig {
            emit_builder: !self.no_builder,
            emit_loader: !self.no_loader,
            emit_model: self.emit_model,
            ..GeneratorConfig::with_out_dir(&self.out)
        }
    }
}

fn main() -> ExitCode {
    // Invalid arguments exit with code 2 from clap
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let report = compile_files(&args.files, &args.config());
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        tracing::error!(
            "{} of {} schema files failed",
            report.failed.len(),
            args.files.len()
        );
        ExitCode::from(EXIT_FAILURE)
    }
}
